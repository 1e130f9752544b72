//! Process-start configuration.
//!
//! Every value here is fixed once the program is running. The defaults are the
//! reference constants; two environment variables can override how the
//! fractal is computed:
//!
//! * `MANDELBROT_BACKEND`: `device`, `threads` or `sequential`.
//! * `MANDELBROT_THREADS`: number of worker threads for the `threads` backend.

use std::{env, fmt, str::FromStr};

use crate::{
    error::{Error, Result},
    screen::Size,
    viewport::{Bounds, Viewport, ZoomLimits},
};

pub const WINDOW_SIZE: Size = Size::new(800, 600);
pub const INITIAL_BOUNDS: Bounds = Bounds {
    xmin: -2.0,
    xmax: 1.0,
    ymin: -1.5,
    ymax: 1.5,
};
pub const INITIAL_MAX_ITERATIONS: u32 = 256;
pub const ITERATION_CEILING: u32 = 2048;
pub const ZOOM_FACTOR: f32 = 1.2;
pub const MIN_RENDER_SIZE: Size = Size::new(100, 75);
pub const MAX_RENDER_SIZE: Size = WINDOW_SIZE;

const BACKEND_VAR: &str = "MANDELBROT_BACKEND";
const THREADS_VAR: &str = "MANDELBROT_THREADS";

/// Which [`ParallelEvaluator`](crate::evaluator::ParallelEvaluator) to try first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Data-parallel `wgpu` compute kernel.
    Device,
    /// Row-partitioned `rayon` thread pool.
    Threads,
    /// Single thread, row by row.
    Sequential,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "device" | "gpu" => Ok(Backend::Device),
            "threads" | "cpu" => Ok(Backend::Threads),
            "sequential" => Ok(Backend::Sequential),
            other => Err(Error::InvalidConfig(format!(
                "{BACKEND_VAR}: unknown backend {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Device => write!(f, "device"),
            Backend::Threads => write!(f, "threads"),
            Backend::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub window_size: Size,
    pub initial_bounds: Bounds,
    pub initial_max_iterations: u32,
    pub iteration_ceiling: u32,
    pub zoom_factor: f32,
    pub min_render_size: Size,
    pub max_render_size: Size,
    pub backend: Backend,
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            initial_bounds: INITIAL_BOUNDS,
            initial_max_iterations: INITIAL_MAX_ITERATIONS,
            iteration_ceiling: ITERATION_CEILING,
            zoom_factor: ZOOM_FACTOR,
            min_render_size: MIN_RENDER_SIZE,
            max_render_size: MAX_RENDER_SIZE,
            backend: Backend::Device,
            threads: num_cpus::get(),
        }
    }
}

impl Config {
    /// Defaults, with overrides read from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(backend) = lookup(BACKEND_VAR) {
            config.backend = backend.parse()?;
        }

        if let Some(threads) = lookup(THREADS_VAR) {
            config.threads = match threads.trim().parse::<usize>() {
                Ok(threads) if threads > 0 => threads,
                _ => {
                    return Err(Error::InvalidConfig(format!(
                        "{THREADS_VAR}: expected a positive integer, got {threads:?}"
                    )))
                }
            };
        }

        Ok(config)
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min_size: self.min_render_size,
            max_size: self.max_render_size,
            min_iterations: self.initial_max_iterations,
            max_iterations: self.iteration_ceiling,
        }
    }

    /// The view shown at start-up, rendered at the maximum resolution.
    pub fn initial_viewport(&self) -> Viewport {
        Viewport {
            bounds: self.initial_bounds,
            size: self.max_render_size,
            max_iterations: self.initial_max_iterations,
        }
    }
}
