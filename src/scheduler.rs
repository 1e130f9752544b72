//! Background rendering.
//!
//! One worker thread owns the evaluator. The display thread talks to it through
//! two single-value slots: the pending request, which a newer request simply
//! overwrites, and the completed image, which the display thread takes.
//! Neither side ever waits on the other except the worker when it has nothing
//! to do.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Condvar, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use log::{debug, trace};

use crate::{
    colour::{self, RenderedImage},
    evaluator::ParallelEvaluator,
    viewport::{Viewport, ViewportController, ZoomRequest},
};

#[derive(Clone, Copy, Debug)]
struct Job {
    generation: u64,
    viewport: Viewport,
}

struct State {
    /// Requested but not started. Only the newest request survives.
    pending: Option<Job>,
    computing: bool,
    /// Generation of the newest request; results from older ones are stale.
    generation: u64,
    /// The newest requested viewport.
    current: Viewport,
    auto_zoom: Option<ZoomRequest>,
    shutdown: bool,
}

impl State {
    fn enqueue(&mut self, viewport: Viewport) {
        self.generation += 1;
        self.current = viewport;
        let superseded = self.pending.replace(Job {
            generation: self.generation,
            viewport,
        });
        if let Some(superseded) = superseded {
            debug!("request {} superseded before it started", superseded.generation);
        }
    }

    fn is_idle(&self) -> bool {
        !self.computing && self.pending.is_none()
    }
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
    completed: Mutex<Option<RenderedImage>>,
    controller: ViewportController,
    renders_started: AtomicU64,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn completed(&self) -> MutexGuard<'_, Option<RenderedImage>> {
        self.completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue the next auto-zoom step from the current viewport.
    fn advance_auto_zoom(&self, state: &mut State) {
        if let Some(request) = state.auto_zoom {
            let next = self.controller.zoom(&state.current, request);
            state.enqueue(next);
            self.wake.notify_one();
        }
    }
}

pub struct RenderScheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl RenderScheduler {
    /// Spawn the render worker. Nothing is rendered until the first request.
    pub fn new(
        evaluator: Box<dyn ParallelEvaluator>,
        controller: ViewportController,
        initial: Viewport,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                pending: None,
                computing: false,
                generation: 0,
                current: initial,
                auto_zoom: None,
                shutdown: false,
            }),
            wake: Condvar::new(),
            completed: Mutex::new(None),
            controller,
            renders_started: AtomicU64::new(0),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || worker_loop(&worker_shared, evaluator));

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Ask for `viewport` to be rendered.
    ///
    /// A computation already running is left to finish; its result will be
    /// discarded. A request that hasn't started yet is replaced.
    pub fn request_render(&self, viewport: Viewport) {
        let mut state = self.shared.state();
        state.enqueue(viewport);
        self.shared.wake.notify_one();
    }

    /// Take the most recently completed image, if there is one. Never blocks
    /// on the computation.
    pub fn poll_completed(&self) -> Option<RenderedImage> {
        self.shared.completed().take()
    }

    /// Whether a render is running or waiting to start.
    pub fn is_busy(&self) -> bool {
        !self.shared.state().is_idle()
    }

    /// The most recently requested viewport.
    pub fn current_viewport(&self) -> Viewport {
        self.shared.state().current
    }

    /// Start, retarget or (with `None`) stop auto-zoom.
    ///
    /// While active, every completed render is immediately followed by one of
    /// the current viewport zoomed by `request`. Starting while idle kicks off
    /// the first step straight away.
    pub fn set_auto_zoom(&self, request: Option<ZoomRequest>) {
        let mut state = self.shared.state();
        state.auto_zoom = request;
        if state.is_idle() {
            self.shared.advance_auto_zoom(&mut state);
        }
    }

    pub fn is_auto_zooming(&self) -> bool {
        self.shared.state().auto_zoom.is_some()
    }

    /// Number of computations the worker has started.
    pub fn renders_started(&self) -> u64 {
        self.shared.renders_started.load(Ordering::Acquire)
    }

    pub fn shutdown(&mut self) {
        self.shared.state().shutdown = true;
        self.shared.wake.notify_one();

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared, evaluator: Box<dyn ParallelEvaluator>) {
    loop {
        let job = {
            let mut state = shared.state();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(job) = state.pending.take() {
                    state.computing = true;
                    break job;
                }
                state = shared
                    .wake
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
        };

        shared.renders_started.fetch_add(1, Ordering::AcqRel);
        debug!(
            "render {} started: {}x{} max_iterations={}",
            job.generation,
            job.viewport.size.width,
            job.viewport.size.height,
            job.viewport.max_iterations
        );

        let start = Instant::now();
        let grid = evaluator.evaluate(&job.viewport);
        trace!("render {} evaluated in {:?}", job.generation, start.elapsed());
        let image = colour::colourise(&grid);
        debug!("render {} finished in {:?}", job.generation, start.elapsed());

        let mut state = shared.state();
        if job.generation == state.generation {
            *shared.completed() = Some(image);
        } else {
            debug!(
                "dropping stale render {} (latest is {})",
                job.generation, state.generation
            );
        }
        state.computing = false;

        if !state.shutdown && state.pending.is_none() {
            shared.advance_auto_zoom(&mut state);
        }
    }
}
