//! Colouring of escape grids.

use bytemuck::{Pod, Zeroable};
use log::trace;
use rayon::prelude::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::{grid::EscapeGrid, viewport::Viewport};

/// [`bytemuck`]-compatible colour for a single pixel, laid out as `Rgba8`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const BLACK: Self = Colour::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Palette for a single escape count.
///
/// Points inside the set are black. Escaped points cycle through each channel
/// every 256 iterations at different rates.
#[inline]
pub fn palette(iteration_count: u32, max_iterations: u32) -> Colour {
    if iteration_count == max_iterations {
        Colour::BLACK
    } else {
        Colour::rgb(
            (iteration_count % 256) as u8,
            (iteration_count.wrapping_mul(5) % 256) as u8,
            (iteration_count.wrapping_mul(13) % 256) as u8,
        )
    }
}

/// A coloured frame, ready to be uploaded to the screen.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedImage {
    viewport: Viewport,
    pixels: Vec<Colour>,
}

impl RenderedImage {
    /// The view this image was computed for.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn width(&self) -> u32 {
        self.viewport.size.width
    }

    pub fn height(&self) -> u32 {
        self.viewport.size.height
    }

    pub fn pixels(&self) -> &[Colour] {
        &self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

pub fn colourise(grid: &EscapeGrid) -> RenderedImage {
    trace!("begin colourise");

    let max_iterations = grid.max_iterations();
    let pixels = grid
        .counts()
        .par_iter()
        .with_min_len(grid.width())
        .map(|&count| palette(count, max_iterations))
        .collect();

    trace!("end colourise");

    RenderedImage {
        viewport: *grid.viewport(),
        pixels,
    }
}
