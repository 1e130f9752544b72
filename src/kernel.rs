//! Escape-time evaluation of the Mandelbrot recurrence.
//!
//! Mirrors `compute.wgsl#mandelbrot` so that the CPU and device backends agree.

use log::trace;

use crate::{grid::EscapeGrid, viewport::Viewport};

/// Number of iterations of `z <- z^2 + c` before `|z|^2 > 4`, for `c = real + imag*i`.
///
/// The orbit starts at `z = c` and the escape test runs before each update, so a
/// point already outside the radius-2 disc returns 0. Points that never escape
/// return `max_iterations`.
#[inline]
pub fn escape_time(real: f32, imag: f32, max_iterations: u32) -> u32 {
    let (c_real, c_imag) = (real, imag);
    let (mut real, mut imag) = (real, imag);

    let mut iteration = 0;
    while iteration < max_iterations {
        let real2 = real * real;
        let imag2 = imag * imag;
        if real2 + imag2 > 4.0 {
            break;
        }
        imag = 2.0 * real * imag + c_imag;
        real = real2 - imag2 + c_real;
        iteration += 1;
    }
    iteration
}

/// Fill `out` with the rows of `viewport` starting at `first_row`.
///
/// `out` must hold a whole number of rows. Disjoint row ranges can be evaluated
/// concurrently.
pub fn evaluate_rows(viewport: &Viewport, first_row: u32, out: &mut [u32]) {
    let width = viewport.size.width as usize;
    if width == 0 {
        return;
    }
    debug_assert_eq!(out.len() % width, 0);

    for (row_offset, row) in out.chunks_exact_mut(width).enumerate() {
        let y = first_row + row_offset as u32;
        for (x, count) in row.iter_mut().enumerate() {
            let (real, imag) = viewport.pixel_to_plane(x as u32, y);
            *count = escape_time(real, imag, viewport.max_iterations);
        }
    }
}

/// Evaluate every pixel of `viewport` on the calling thread.
pub fn evaluate_grid(viewport: &Viewport) -> EscapeGrid {
    trace!("begin evaluate_grid");
    let mut counts = vec![0; viewport.size.area()];
    evaluate_rows(viewport, 0, &mut counts);
    trace!("end evaluate_grid");
    EscapeGrid::new(*viewport, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, screen::Size, viewport::Bounds};

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape_time(0.0, 0.0, 256), 256);
    }

    #[test]
    fn point_outside_disc_escapes_immediately() {
        assert_eq!(escape_time(3.0, 0.0, 256), 0);
    }

    #[test]
    fn boundary_is_not_escaped() {
        // |c|^2 == 4 is not strictly greater than 4, so one update happens.
        assert_eq!(escape_time(2.0, 0.0, 256), 1);
        assert_eq!(escape_time(-2.0, 0.0, 256), 256);
    }

    #[test]
    fn escape_time_is_deterministic() {
        for &(real, imag) in &[(-0.75, 0.1), (0.285, 0.01), (-1.25, 0.0), (0.3, 0.5)] {
            let first = escape_time(real, imag, 1000);
            for _ in 0..10 {
                assert_eq!(escape_time(real, imag, 1000), first);
            }
        }
    }

    #[test]
    fn zero_iteration_cap_returns_zero() {
        assert_eq!(escape_time(0.0, 0.0, 0), 0);
    }

    #[test]
    fn grid_has_requested_shape_and_range() {
        let viewport = Viewport {
            bounds: Bounds {
                xmin: -2.0,
                xmax: 1.0,
                ymin: -1.5,
                ymax: 1.5,
            },
            size: Size::new(37, 23),
            max_iterations: 64,
        };

        let grid = evaluate_grid(&viewport);

        assert_eq!(grid.width(), 37);
        assert_eq!(grid.height(), 23);
        assert_eq!(grid.rows().count(), 23);
        assert!(grid.rows().all(|row| row.len() == 37));
        assert!(grid.counts().iter().all(|&count| count <= 64));
    }

    #[test]
    fn grid_cells_match_pointwise_evaluation() {
        let mut viewport = Config::default().initial_viewport();
        viewport.size = Size::new(40, 30);

        let grid = evaluate_grid(&viewport);

        for (x, y) in [(0, 0), (20, 15), (39, 29), (10, 25)] {
            let (real, imag) = viewport.pixel_to_plane(x, y);
            assert_eq!(
                grid.get(x as usize, y as usize),
                escape_time(real, imag, viewport.max_iterations)
            );
        }
        // Pixel (20, 15) maps to c = -0.5, inside the main cardioid.
        assert_eq!(grid.get(20, 15), 256);
    }
}
