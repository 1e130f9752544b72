use log::{error, warn};
use mandelbrot_zoom::{
    config::Config,
    evaluator,
    input::{Flow, InputEvent, PointerButton, Session},
    presenter::Presenter,
    Result,
};
use winit::{
    dpi::PhysicalSize,
    event::{
        ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode,
        WindowEvent,
    },
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

fn main() {
    env_logger::init();

    let config = Config::from_env().unwrap_or_else(|err| {
        warn!("{}; using defaults", err);
        Config::default()
    });

    if let Err(err) = run(config) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Mandelbrot Set Zoom")
        .with_inner_size(PhysicalSize::new(
            config.window_size.width,
            config.window_size.height,
        ))
        .with_resizable(false)
        .build(&event_loop)?;

    let mut presenter = Presenter::new(&window)?;
    let mut session = Session::new(&config, evaluator::select(&config));
    let mut cursor = (
        config.window_size.width as f32 / 2.0,
        config.window_size.height as f32 / 2.0,
    );

    event_loop.run(move |event, _, control_flow| match event {
        Event::MainEventsCleared => {
            // Redraw continuously; the frame rate doesn't depend on rendering.
            window.request_redraw();
        }
        Event::WindowEvent { window_id, event } if window_id == window.id() => {
            if let WindowEvent::Resized(size) = event {
                presenter.resize(size);
            }
            if let Some(input) = translate(&event, &mut cursor) {
                if session.handle(input) == Flow::Exit {
                    *control_flow = ControlFlow::Exit;
                }
            }
        }
        Event::RedrawRequested(window_id) if window_id == window.id() => {
            if let Some(image) = session.frame() {
                presenter.upload(image);
            }
            if let Err(err) = presenter.draw() {
                error!("{}", err);
                *control_flow = ControlFlow::Exit;
            }
        }
        _ => {}
    })
}

/// Map a window event onto the session's input vocabulary.
///
/// Button presses carry no position in `winit`, so the last cursor position is
/// tracked here.
fn translate(event: &WindowEvent, cursor: &mut (f32, f32)) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested => Some(InputEvent::Quit),
        WindowEvent::CursorMoved { position, .. } => {
            *cursor = (position.x as f32, position.y as f32);
            Some(InputEvent::PointerMove {
                x: cursor.0,
                y: cursor.1,
            })
        }
        WindowEvent::MouseInput {
            state: ElementState::Pressed,
            button,
            ..
        } => {
            let button = match button {
                MouseButton::Left => PointerButton::Primary,
                MouseButton::Right => PointerButton::Secondary,
                _ => PointerButton::Other,
            };
            Some(InputEvent::PointerDown {
                button,
                x: cursor.0,
                y: cursor.1,
            })
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let delta_y = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(position) => position.y as f32,
            };
            Some(InputEvent::Scroll { delta_y })
        }
        WindowEvent::KeyboardInput {
            input:
                KeyboardInput {
                    state: ElementState::Pressed,
                    virtual_keycode: Some(key),
                    ..
                },
            ..
        } => match key {
            VirtualKeyCode::Space => Some(InputEvent::ToggleAutoZoom),
            VirtualKeyCode::Escape => Some(InputEvent::Quit),
            _ => None,
        },
        _ => None,
    }
}
