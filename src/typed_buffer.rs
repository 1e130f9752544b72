/*!
Typed `wgpu` buffers.

A raw `wgpu::Buffer` is just bytes; nothing stops a buffer of `u32` counts
from being read back as something else. [`Buffer<A>`] remembers its element
type and length and does the [`bytemuck`] casts at the edges.
*/

use std::{marker::PhantomData, mem::size_of, ops::Deref};

pub struct Buffer<A> {
    buffer: wgpu::Buffer,
    len: u64,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod + bytemuck::Zeroable> Buffer<A> {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of `A`s the buffer holds.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.len * size_of::<A>() as u64
    }

    pub fn slice(&self) -> Slice<A> {
        Slice {
            slice: self.buffer.slice(..),
            phantom_data: PhantomData,
        }
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn unmap(&self) {
        self.buffer.unmap()
    }

    pub fn destroy(self) {
        self.buffer.destroy()
    }
}

pub struct Slice<'a, A> {
    slice: wgpu::BufferSlice<'a>,
    phantom_data: PhantomData<A>,
}

impl<'a, A> Slice<'a, A> {
    pub fn map_async(
        &self,
        mode: wgpu::MapMode,
        callback: impl FnOnce(Result<(), wgpu::BufferAsyncError>) + Send + 'static,
    ) {
        self.slice.map_async(mode, callback)
    }

    pub fn get_mapped_range(&self) -> View<'a, A> {
        View {
            view: self.slice.get_mapped_range(),
            phantom_data: PhantomData,
        }
    }
}

pub struct View<'a, A> {
    view: wgpu::BufferView<'a>,
    phantom_data: PhantomData<A>,
}

impl<'a, A: bytemuck::Pod + bytemuck::Zeroable> Deref for View<'a, A> {
    type Target = [A];

    fn deref(&self) -> &Self::Target {
        bytemuck::cast_slice(&*self.view)
    }
}

pub struct Builder<'a, A> {
    label: Option<&'a str>,
    len: u64,
    usage: wgpu::BufferUsages,
    phantom_data: PhantomData<A>,
}

impl<'a, A: bytemuck::Pod + bytemuck::Zeroable> Builder<'a, A> {
    /// An uninitialised buffer of `len` elements.
    pub fn new(len: u64) -> Self {
        Self {
            label: None,
            len,
            usage: wgpu::BufferUsages::empty(),
            phantom_data: PhantomData,
        }
    }

    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_usage(mut self, usage: wgpu::BufferUsages) -> Self {
        self.usage |= usage;
        self
    }

    pub fn create(self, device: &wgpu::Device) -> Buffer<A> {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: self.label,
            size: self.len * size_of::<A>() as u64,
            usage: self.usage,
            mapped_at_creation: false,
        });

        Buffer {
            buffer,
            len: self.len,
            phantom_data: PhantomData,
        }
    }
}

/// Copy all of `source` into `destination`, which must be at least as long.
pub fn copy_buffer_to_buffer<A: bytemuck::Pod + bytemuck::Zeroable>(
    command_encoder: &mut wgpu::CommandEncoder,
    source: &Buffer<A>,
    destination: &Buffer<A>,
) {
    debug_assert!(destination.len() >= source.len());
    command_encoder.copy_buffer_to_buffer(
        source.buffer(),
        0,
        destination.buffer(),
        0,
        source.size_in_bytes(),
    )
}
