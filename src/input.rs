//! Input events and the interactive session that turns them into renders.

use log::{debug, info};

use crate::{
    colour::RenderedImage,
    config::Config,
    evaluator::ParallelEvaluator,
    scheduler::RenderScheduler,
    viewport::{ViewportController, ZoomRequest},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

/// Input as delivered by the presenter, in window pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Quit,
    PointerMove { x: f32, y: f32 },
    PointerDown { button: PointerButton, x: f32, y: f32 },
    /// Positive is away from the user (zoom in).
    Scroll { delta_y: f32 },
    ToggleAutoZoom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Display-side state: where the cursor is, whether auto-zoom is on and the
/// image currently on screen.
pub struct Session {
    controller: ViewportController,
    scheduler: RenderScheduler,
    cursor: (f32, f32),
    auto_zoom: bool,
    image: Option<RenderedImage>,
}

impl Session {
    /// Start the render worker and request the initial view.
    pub fn new(config: &Config, evaluator: Box<dyn ParallelEvaluator>) -> Self {
        let controller = ViewportController::new(
            config.window_size,
            config.zoom_factor,
            config.zoom_limits(),
        );
        let initial = config.initial_viewport();
        let scheduler = RenderScheduler::new(evaluator, controller, initial);
        scheduler.request_render(initial);

        Self {
            controller,
            scheduler,
            cursor: (
                config.window_size.width as f32 / 2.0,
                config.window_size.height as f32 / 2.0,
            ),
            auto_zoom: false,
            image: None,
        }
    }

    pub fn handle(&mut self, event: InputEvent) -> Flow {
        match event {
            InputEvent::Quit => return Flow::Exit,
            InputEvent::PointerMove { x, y } => {
                self.cursor = (x, y);
                if self.auto_zoom {
                    self.scheduler
                        .set_auto_zoom(Some(self.controller.zoom_in_at(x, y)));
                }
            }
            InputEvent::PointerDown { button, x, y } => match button {
                PointerButton::Primary => self.zoom(self.controller.zoom_in_at(x, y)),
                PointerButton::Secondary => self.zoom(self.controller.zoom_out_at(x, y)),
                PointerButton::Other => {}
            },
            InputEvent::Scroll { delta_y } => {
                let (x, y) = self.cursor;
                if delta_y > 0.0 {
                    self.zoom(self.controller.zoom_in_at(x, y));
                } else if delta_y < 0.0 {
                    self.zoom(self.controller.zoom_out_at(x, y));
                }
            }
            InputEvent::ToggleAutoZoom => {
                self.auto_zoom = !self.auto_zoom;
                info!("auto-zoom {}", if self.auto_zoom { "on" } else { "off" });
                let request = self
                    .auto_zoom
                    .then(|| self.controller.zoom_in_at(self.cursor.0, self.cursor.1));
                self.scheduler.set_auto_zoom(request);
            }
        }
        Flow::Continue
    }

    /// Called once per presentation tick. Returns the new image if one
    /// finished since the last tick.
    pub fn frame(&mut self) -> Option<&RenderedImage> {
        let image = self.scheduler.poll_completed()?;
        self.image = Some(image);
        self.image.as_ref()
    }

    /// The image to keep showing while the next one is computed.
    pub fn current_image(&self) -> Option<&RenderedImage> {
        self.image.as_ref()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn is_auto_zooming(&self) -> bool {
        self.auto_zoom
    }

    fn zoom(&mut self, request: ZoomRequest) {
        if self.scheduler.is_busy() {
            debug!("ignoring zoom while rendering");
            return;
        }
        let next = self
            .controller
            .zoom(&self.scheduler.current_viewport(), request);
        self.scheduler.request_render(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use crate::{
        config::Backend, evaluator::SequentialEvaluator, grid::EscapeGrid, kernel,
        screen::Size, viewport::Viewport,
    };

    const TIMEOUT: Duration = Duration::from_secs(10);

    struct SlowEvaluator(Duration);

    impl ParallelEvaluator for SlowEvaluator {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn evaluate(&self, viewport: &Viewport) -> EscapeGrid {
            thread::sleep(self.0);
            kernel::evaluate_grid(viewport)
        }
    }

    fn config() -> Config {
        let window_size = Size::new(40, 30);
        Config {
            window_size,
            min_render_size: Size::new(10, 8),
            max_render_size: window_size,
            backend: Backend::Sequential,
            ..Config::default()
        }
    }

    fn session() -> Session {
        Session::new(&config(), Box::new(SequentialEvaluator))
    }

    fn wait_for_frame(session: &mut Session) -> bool {
        let start = Instant::now();
        while start.elapsed() < TIMEOUT {
            if session.frame().is_some() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn wait_idle(session: &Session) {
        let start = Instant::now();
        while session.scheduler().is_busy() && start.elapsed() < TIMEOUT {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn initial_view_is_rendered_without_input() {
        let mut session = session();

        assert!(wait_for_frame(&mut session));
        let image = session.current_image().unwrap();
        assert_eq!((image.width(), image.height()), (40, 30));
        assert_eq!(image.viewport().bounds, config().initial_bounds);
    }

    #[test]
    fn last_image_is_kept_between_frames() {
        let mut session = session();
        assert!(wait_for_frame(&mut session));

        assert!(session.frame().is_none());
        assert!(session.current_image().is_some());
    }

    #[test]
    fn primary_click_zooms_in_at_pointer() {
        let mut session = session();
        assert!(wait_for_frame(&mut session));
        wait_idle(&session);

        let before = session.scheduler().current_viewport();
        session.handle(InputEvent::PointerDown {
            button: PointerButton::Primary,
            x: 20.0,
            y: 15.0,
        });
        let after = session.scheduler().current_viewport();

        assert!((after.bounds.width() - before.bounds.width() / 1.2).abs() < 1e-5);
        assert!(after.max_iterations > before.max_iterations);
        assert!(wait_for_frame(&mut session));
    }

    #[test]
    fn secondary_click_and_scroll_down_zoom_out() {
        let mut session = session();
        assert!(wait_for_frame(&mut session));
        wait_idle(&session);

        let before = session.scheduler().current_viewport();
        session.handle(InputEvent::PointerDown {
            button: PointerButton::Secondary,
            x: 20.0,
            y: 15.0,
        });
        let after_click = session.scheduler().current_viewport();
        assert!((after_click.bounds.width() - before.bounds.width() * 1.2).abs() < 1e-5);

        wait_idle(&session);
        session.handle(InputEvent::Scroll { delta_y: -1.0 });
        let after_scroll = session.scheduler().current_viewport();
        assert!(after_scroll.bounds.width() > after_click.bounds.width());
    }

    #[test]
    fn scroll_up_zooms_at_tracked_cursor() {
        let mut session = session();
        assert!(wait_for_frame(&mut session));
        wait_idle(&session);

        session.handle(InputEvent::PointerMove { x: 0.0, y: 0.0 });
        session.handle(InputEvent::Scroll { delta_y: 1.0 });

        let bounds = session.scheduler().current_viewport().bounds;
        let centre = ((bounds.xmin + bounds.xmax) / 2.0, (bounds.ymin + bounds.ymax) / 2.0);
        assert!((centre.0 - -2.0).abs() < 1e-5);
        assert!((centre.1 - -1.5).abs() < 1e-5);
    }

    #[test]
    fn zoom_is_ignored_while_busy_but_pointer_is_tracked() {
        let mut session = Session::new(
            &config(),
            Box::new(SlowEvaluator(Duration::from_millis(300))),
        );
        // The initial render has just been requested.
        assert!(session.scheduler().is_busy());

        let before = session.scheduler().current_viewport();
        session.handle(InputEvent::PointerMove { x: 3.0, y: 4.0 });
        session.handle(InputEvent::PointerDown {
            button: PointerButton::Primary,
            x: 3.0,
            y: 4.0,
        });
        session.handle(InputEvent::Scroll { delta_y: 1.0 });

        assert_eq!(session.scheduler().current_viewport(), before);
        assert_eq!(session.cursor, (3.0, 4.0));
    }

    #[test]
    fn other_buttons_and_zero_scroll_do_nothing() {
        let mut session = session();
        assert!(wait_for_frame(&mut session));
        wait_idle(&session);

        let before = session.scheduler().current_viewport();
        session.handle(InputEvent::PointerDown {
            button: PointerButton::Other,
            x: 1.0,
            y: 1.0,
        });
        session.handle(InputEvent::Scroll { delta_y: 0.0 });

        assert_eq!(session.scheduler().current_viewport(), before);
        assert!(!session.scheduler().is_busy());
    }

    #[test]
    fn toggling_auto_zoom_starts_and_stops_zooming() {
        let mut session = session();
        assert!(wait_for_frame(&mut session));
        wait_idle(&session);
        let initial = session.scheduler().current_viewport();

        assert_eq!(session.handle(InputEvent::ToggleAutoZoom), Flow::Continue);
        assert!(session.is_auto_zooming());
        assert!(session.scheduler().is_auto_zooming());

        let start = Instant::now();
        while session.scheduler().renders_started() < 4 && start.elapsed() < TIMEOUT {
            session.frame();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(session.scheduler().renders_started() >= 4);

        session.handle(InputEvent::ToggleAutoZoom);
        assert!(!session.scheduler().is_auto_zooming());
        wait_idle(&session);

        let current = session.scheduler().current_viewport();
        assert!(current.bounds.width() < initial.bounds.width());
    }

    #[test]
    fn quit_exits() {
        let mut session = session();
        assert_eq!(session.handle(InputEvent::Quit), Flow::Exit);
    }
}
