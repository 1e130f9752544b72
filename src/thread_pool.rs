use log::debug;
use rayon::prelude::{IndexedParallelIterator, ParallelIterator, ParallelSliceMut};

use crate::{
    error::Result, evaluator::ParallelEvaluator, grid::EscapeGrid, kernel, viewport::Viewport,
};

/// Rows handed to a pool thread at a time.
pub const ROWS_PER_TASK: usize = 4;

/// Splits the grid into bands of rows and evaluates them on a dedicated `rayon` pool.
///
/// Each task writes straight into its own band of the output, so no two tasks
/// touch the same cells.
pub struct ThreadPoolEvaluator {
    pool: rayon::ThreadPool,
}

impl ThreadPoolEvaluator {
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("mandelbrot-{index}"))
            .build()?;
        debug!("thread pool with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }
}

impl ParallelEvaluator for ThreadPoolEvaluator {
    fn name(&self) -> &'static str {
        "thread-pool"
    }

    fn evaluate(&self, viewport: &Viewport) -> EscapeGrid {
        let width = viewport.size.width as usize;
        let mut counts = vec![0; viewport.size.area()];

        if !counts.is_empty() {
            self.pool.install(|| {
                counts
                    .par_chunks_mut(width * ROWS_PER_TASK)
                    .enumerate()
                    .for_each(|(band, out)| {
                        kernel::evaluate_rows(viewport, (band * ROWS_PER_TASK) as u32, out)
                    });
            });
        }

        EscapeGrid::new(*viewport, counts)
    }
}
