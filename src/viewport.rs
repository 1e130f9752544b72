//! The visible region of the complex plane and the zoom transform over it.

use bytemuck::{Pod, Zeroable};
use log::debug;

use crate::screen::Size;

/// A rectangle in the complex plane.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    /// Non-empty on both axes.
    pub fn is_valid(&self) -> bool {
        self.xmax > self.xmin && self.ymax > self.ymin
    }
}

/// Everything needed to compute one frame.
///
/// Viewports are values: a zoom produces a new one rather than editing the
/// current one, so the display thread and the render worker never observe a
/// half-updated view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub bounds: Bounds,
    /// Render resolution. The presenter scales this to the window.
    pub size: Size,
    pub max_iterations: u32,
}

impl Viewport {
    /// Plane coordinate of the pixel `(x, y)` at this viewport's resolution.
    #[inline]
    pub fn pixel_to_plane(&self, x: u32, y: u32) -> (f32, f32) {
        let Bounds {
            xmin,
            xmax,
            ymin,
            ymax,
        } = self.bounds;
        let real = xmin + (xmax - xmin) * x as f32 / self.size.width as f32;
        let imag = ymin + (ymax - ymin) * y as f32 / self.size.height as f32;
        (real, imag)
    }
}

/// Zoom by `factor` around the screen point `(focal_x, focal_y)`.
///
/// `factor > 1` zooms in, `factor < 1` zooms out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomRequest {
    pub focal_x: f32,
    pub focal_y: f32,
    pub factor: f32,
}

/// Bounds on how far a zoom may scale the render resolution and iteration cap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomLimits {
    pub min_size: Size,
    pub max_size: Size,
    pub min_iterations: u32,
    pub max_iterations: u32,
}

/// Maps zoom gestures onto viewports.
///
/// Every way of zooming (clicks, scrolling, auto-zoom) goes through
/// [`ViewportController::zoom`]; there is no other way to derive a new view.
#[derive(Clone, Copy, Debug)]
pub struct ViewportController {
    screen: Size,
    factor: f32,
    limits: ZoomLimits,
}

impl ViewportController {
    pub fn new(screen: Size, factor: f32, limits: ZoomLimits) -> Self {
        Self {
            screen,
            factor,
            limits,
        }
    }

    pub fn zoom_in_at(&self, focal_x: f32, focal_y: f32) -> ZoomRequest {
        ZoomRequest {
            focal_x,
            focal_y,
            factor: self.factor,
        }
    }

    pub fn zoom_out_at(&self, focal_x: f32, focal_y: f32) -> ZoomRequest {
        ZoomRequest {
            focal_x,
            focal_y,
            factor: 1.0 / self.factor,
        }
    }

    pub fn zoom(&self, viewport: &Viewport, request: ZoomRequest) -> Viewport {
        let bounds = viewport.bounds;
        let centre_x = bounds.xmin + bounds.width() * request.focal_x / self.screen.width as f32;
        let centre_y = bounds.ymin + bounds.height() * request.focal_y / self.screen.height as f32;

        let half_width = bounds.width() / request.factor / 2.0;
        let half_height = bounds.height() / request.factor / 2.0;

        let mut new_bounds = Bounds {
            xmin: centre_x - half_width,
            xmax: centre_x + half_width,
            ymin: centre_y - half_height,
            ymax: centre_y + half_height,
        };

        // Past single precision the extents collapse; stay where we are.
        if !new_bounds.is_valid() {
            debug!("zoom saturated at {:?}", bounds);
            new_bounds = bounds;
        }

        let size = viewport
            .size
            .scale(request.factor)
            .clamp(self.limits.min_size, self.limits.max_size);

        let max_iterations = ((viewport.max_iterations as f32 * request.factor).round() as u32)
            .clamp(self.limits.min_iterations, self.limits.max_iterations);

        let zoomed = Viewport {
            bounds: new_bounds,
            size,
            max_iterations,
        };
        debug!(
            "zoom x{} at ({}, {}): {:?} {}x{} max_iterations={}",
            request.factor,
            request.focal_x,
            request.focal_y,
            zoomed.bounds,
            zoomed.size.width,
            zoomed.size.height,
            zoomed.max_iterations
        );
        zoomed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    const EPSILON: f32 = 1e-4;

    fn controller() -> ViewportController {
        let config = Config::default();
        ViewportController::new(config.window_size, config.zoom_factor, config.zoom_limits())
    }

    fn assert_bounds_near(actual: Bounds, expected: Bounds) {
        assert!(
            (actual.xmin - expected.xmin).abs() < EPSILON
                && (actual.xmax - expected.xmax).abs() < EPSILON
                && (actual.ymin - expected.ymin).abs() < EPSILON
                && (actual.ymax - expected.ymax).abs() < EPSILON,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn zoom_in_at_screen_centre() {
        let controller = controller();
        let viewport = Config::default().initial_viewport();

        let zoomed = controller.zoom(&viewport, controller.zoom_in_at(400.0, 300.0));

        // Centre (-0.5, 0.0) is kept, extents shrink from 3x3 to 2.5x2.5.
        assert_bounds_near(
            zoomed.bounds,
            Bounds {
                xmin: -1.75,
                xmax: 0.75,
                ymin: -1.25,
                ymax: 1.25,
            },
        );
        assert_eq!(zoomed.size, Size::new(800, 600));
        assert_eq!(zoomed.max_iterations, 307);
    }

    #[test]
    fn zoom_recentres_on_focal_point() {
        let controller = controller();
        let viewport = Config::default().initial_viewport();

        let zoomed = controller.zoom(&viewport, controller.zoom_in_at(0.0, 0.0));

        let centre_x = (zoomed.bounds.xmin + zoomed.bounds.xmax) / 2.0;
        let centre_y = (zoomed.bounds.ymin + zoomed.bounds.ymax) / 2.0;
        assert!((centre_x - -2.0).abs() < EPSILON);
        assert!((centre_y - -1.5).abs() < EPSILON);
    }

    #[test]
    fn zoom_in_then_out_at_centre_restores_bounds() {
        let controller = controller();
        let viewport = Config::default().initial_viewport();

        let zoomed_in = controller.zoom(&viewport, controller.zoom_in_at(400.0, 300.0));
        let restored = controller.zoom(&zoomed_in, controller.zoom_out_at(400.0, 300.0));

        assert_bounds_near(restored.bounds, viewport.bounds);
    }

    #[test]
    fn zoom_out_shrinks_resolution_down_to_minimum() {
        let controller = controller();
        let mut viewport = Config::default().initial_viewport();

        let once = controller.zoom(&viewport, controller.zoom_out_at(400.0, 300.0));
        assert_eq!(once.size, Size::new(667, 500));
        assert_eq!(once.max_iterations, 256);

        for _ in 0..30 {
            viewport = controller.zoom(&viewport, controller.zoom_out_at(400.0, 300.0));
        }
        assert_eq!(viewport.size, Size::new(100, 75));
        assert_eq!(viewport.max_iterations, 256);
    }

    #[test]
    fn repeated_zoom_in_is_monotonic_and_clamped() {
        let controller = controller();
        let mut viewport = Config::default().initial_viewport();
        viewport.size = Size::new(100, 75);

        for _ in 0..40 {
            let next = controller.zoom(&viewport, controller.zoom_in_at(123.0, 456.0));
            assert!(next.size.width >= viewport.size.width);
            assert!(next.size.height >= viewport.size.height);
            assert!(next.max_iterations >= viewport.max_iterations);
            viewport = next;
        }

        assert_eq!(viewport.size, Size::new(800, 600));
        assert_eq!(viewport.max_iterations, 2048);
    }

    #[test]
    fn zoom_never_produces_empty_bounds() {
        let controller = controller();
        let mut viewport = Config::default().initial_viewport();

        for _ in 0..400 {
            viewport = controller.zoom(&viewport, controller.zoom_in_at(271.0, 133.0));
            assert!(viewport.bounds.is_valid(), "{:?}", viewport.bounds);
        }
    }

    #[test]
    fn pixel_to_plane_interpolates_from_top_left() {
        let viewport = Config::default().initial_viewport();
        assert_eq!(viewport.pixel_to_plane(0, 0), (-2.0, -1.5));
        assert_eq!(viewport.pixel_to_plane(400, 300), (-0.5, 0.0));
    }
}
