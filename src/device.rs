//! Data-parallel evaluation on a `wgpu` compute device.

use bytemuck::{Pod, Zeroable};
use log::{info, trace, warn};

use crate::{
    command_encoder::{self, CommandEncoderExt},
    compute,
    error::{Error, Result},
    evaluator::ParallelEvaluator,
    grid::EscapeGrid,
    kernel,
    typed_buffer::{self, Buffer},
    var::Var,
    viewport::{Bounds, Viewport},
};

/// Uniform for `compute.wgsl#Params`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug)]
pub struct KernelParams {
    pub bounds: Bounds,
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub _padding: u32,
}

impl From<&Viewport> for KernelParams {
    fn from(viewport: &Viewport) -> Self {
        Self {
            bounds: viewport.bounds,
            width: viewport.size.width,
            height: viewport.size.height,
            max_iterations: viewport.max_iterations,
            _padding: 0,
        }
    }
}

/// Dispatches `compute.wgsl#mandelbrot` with one invocation per pixel and
/// reads the counts back into an [`EscapeGrid`].
pub struct DeviceEvaluator {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params: Var<KernelParams>,
    fallback: Option<Box<dyn ParallelEvaluator>>,
}

impl DeviceEvaluator {
    /// Fails with [`Error::NoAdapter`] or [`Error::DeviceCreation`] when
    /// there is no usable device.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::all());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or(Error::NoAdapter)?;

        info!("compute adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("compute-device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        ))?;

        let compute_shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("compute-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("compute.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("compute-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("compute-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("compute-pipeline"),
            layout: Some(&pipeline_layout),
            module: &compute_shader_module,
            entry_point: "mandelbrot",
        });

        let params = Var::uniform(&device, "params-buffer", KernelParams::zeroed());

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params,
            fallback: None,
        })
    }

    /// Evaluator used for a frame when the device fails mid-computation.
    pub fn with_fallback(mut self, fallback: Box<dyn ParallelEvaluator>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn try_evaluate(&self, viewport: &Viewport) -> Result<EscapeGrid> {
        let total_work = viewport.size.area();
        if total_work == 0 {
            return Ok(EscapeGrid::new(*viewport, Vec::new()));
        }

        self.params.write(&self.queue, KernelParams::from(viewport));

        let counts: Buffer<u32> = typed_buffer::Builder::new(total_work as u64)
            .with_label("counts-buffer")
            .with_usage(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC)
            .create(&self.device);

        let staging: Buffer<u32> = typed_buffer::Builder::new(total_work as u64)
            .with_label("counts-staging-buffer")
            .with_usage(wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST)
            .create(&self.device);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("compute-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: counts.binding_resource(),
                },
            ],
        });

        let (x, y, z) = compute::mandelbrot_dispatch_size(total_work);
        trace!("dispatching ({}, {}, {}) for {} pixels", x, y, z, total_work);

        let command_buffer = command_encoder::encode(&self.device, "compute-encoder", |encoder| {
            encoder.with_compute_pass("compute-pass", |compute_pass| {
                compute_pass.set_pipeline(&self.pipeline);
                compute_pass.set_bind_group(0, &bind_group, &[]);
                compute_pass.insert_debug_marker("mandelbrot");
                compute_pass.dispatch_workgroups(x, y, z);
            });
            typed_buffer::copy_buffer_to_buffer(encoder, &counts, &staging);
        });

        self.queue.submit([command_buffer]);

        let staging_slice = staging.slice();
        let (sender, receiver) = std::sync::mpsc::channel();
        staging_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver.recv().unwrap_or(Err(wgpu::BufferAsyncError))?;

        let grid = staging_slice.get_mapped_range().to_vec();
        staging.unmap();
        staging.destroy();
        counts.destroy();

        Ok(EscapeGrid::new(*viewport, grid))
    }
}

impl ParallelEvaluator for DeviceEvaluator {
    fn name(&self) -> &'static str {
        "device"
    }

    fn evaluate(&self, viewport: &Viewport) -> EscapeGrid {
        match self.try_evaluate(viewport) {
            Ok(grid) => grid,
            Err(err) => {
                warn!("device evaluation failed, computing frame on the CPU: {}", err);
                match &self.fallback {
                    Some(fallback) => fallback.evaluate(viewport),
                    None => kernel::evaluate_grid(viewport),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, screen::Size};

    fn device() -> Option<DeviceEvaluator> {
        match DeviceEvaluator::new() {
            Ok(device) => Some(device),
            Err(err) => {
                println!("skipping: {err}");
                None
            }
        }
    }

    #[test]
    fn params_match_shader_layout() {
        assert_eq!(std::mem::size_of::<KernelParams>(), 32);
    }

    #[test]
    fn unavailable_device_is_reported_as_backend_unavailable() {
        if let Err(err) = DeviceEvaluator::new() {
            assert!(err.is_backend_unavailable(), "{err}");
        }
    }

    #[test]
    fn device_agrees_with_cpu() {
        let Some(device) = device() else {
            return;
        };

        let viewport = Viewport {
            size: Size::new(160, 120),
            ..Config::default().initial_viewport()
        };

        let on_device = device.evaluate(&viewport);
        let on_cpu = kernel::evaluate_grid(&viewport);

        assert_eq!((on_device.width(), on_device.height()), (160, 120));
        // Fused multiply-adds on the device may move a handful of boundary pixels.
        let differing = on_device
            .counts()
            .iter()
            .zip(on_cpu.counts())
            .filter(|(a, b)| a != b)
            .count();
        assert!(differing * 100 <= viewport.size.area(), "{differing} pixels differ");
    }

    #[test]
    fn device_handles_grids_larger_than_one_dispatch_column() {
        let Some(device) = device() else {
            return;
        };

        // 480000 pixels spans several columns of 65536 invocations.
        let viewport = Config::default().initial_viewport();
        let grid = device.evaluate(&viewport);

        assert_eq!(grid.counts().len(), 800 * 600);
        assert!(grid.counts().iter().all(|&count| count <= 256));
        assert_eq!(grid.get(400, 300), 256);
    }
}
