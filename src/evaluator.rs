//! Backends that turn a [`Viewport`] into an [`EscapeGrid`].
//!
//! The render worker only sees `dyn ParallelEvaluator`; which backend runs is
//! decided once, by [`select`].

use log::{info, warn};

use crate::{
    config::{Backend, Config},
    device::DeviceEvaluator,
    error::Result,
    grid::EscapeGrid,
    kernel,
    thread_pool::ThreadPoolEvaluator,
    viewport::Viewport,
};

pub trait ParallelEvaluator: Send {
    fn name(&self) -> &'static str;

    /// Compute the complete grid for `viewport`, blocking until it's done.
    fn evaluate(&self, viewport: &Viewport) -> EscapeGrid;
}

/// Row by row on the calling thread. Always available.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEvaluator;

impl ParallelEvaluator for SequentialEvaluator {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn evaluate(&self, viewport: &Viewport) -> EscapeGrid {
        kernel::evaluate_grid(viewport)
    }
}

/// Bring up the configured backend, falling back towards
/// [`SequentialEvaluator`] when a backend can't be initialised.
pub fn select(config: &Config) -> Box<dyn ParallelEvaluator> {
    let evaluator = match config.backend {
        Backend::Device => {
            let device = DeviceEvaluator::new().map(|device| {
                let fallback = threads_or_sequential(config.threads);
                Box::new(device.with_fallback(fallback)) as Box<dyn ParallelEvaluator>
            });
            or_fallback(device, || threads_or_sequential(config.threads))
        }
        Backend::Threads => threads_or_sequential(config.threads),
        Backend::Sequential => Box::new(SequentialEvaluator),
    };
    info!("using {} evaluator", evaluator.name());
    evaluator
}

fn threads_or_sequential(threads: usize) -> Box<dyn ParallelEvaluator> {
    let pool = ThreadPoolEvaluator::new(threads)
        .map(|pool| Box::new(pool) as Box<dyn ParallelEvaluator>);
    or_fallback(pool, || Box::new(SequentialEvaluator))
}

fn or_fallback(
    evaluator: Result<Box<dyn ParallelEvaluator>>,
    fallback: impl FnOnce() -> Box<dyn ParallelEvaluator>,
) -> Box<dyn ParallelEvaluator> {
    match evaluator {
        Ok(evaluator) => evaluator,
        Err(err) => {
            warn!("backend unavailable, falling back: {}", err);
            fallback()
        }
    }
}
