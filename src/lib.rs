//! Interactive Mandelbrot zoom.
//!
//! The fractal is computed on a background worker ([`scheduler`]) by one of
//! several interchangeable backends ([`evaluator`]) while the display loop keeps
//! showing the last finished frame.

pub mod colour;
pub mod command_encoder;
pub mod compute;
pub mod config;
pub mod device;
pub mod error;
pub mod evaluator;
pub mod grid;
pub mod input;
pub mod kernel;
pub mod presenter;
pub mod scheduler;
pub mod screen;
pub mod thread_pool;
pub mod typed_buffer;
pub mod var;
pub mod viewport;

pub use error::{Error, Result};
