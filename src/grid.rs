use crate::viewport::Viewport;

/// Escape iteration counts for every pixel of a [`Viewport`], row-major.
///
/// A grid is only ever constructed complete; evaluators fill their own
/// storage and hand over the finished grid by value.
#[derive(Clone, Debug, PartialEq)]
pub struct EscapeGrid {
    viewport: Viewport,
    counts: Vec<u32>,
}

impl EscapeGrid {
    pub fn new(viewport: Viewport, counts: Vec<u32>) -> Self {
        assert_eq!(
            counts.len(),
            viewport.size.area(),
            "escape grid does not match {}x{} viewport",
            viewport.size.width,
            viewport.size.height
        );
        Self { viewport, counts }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn width(&self) -> usize {
        self.viewport.size.width as usize
    }

    pub fn height(&self) -> usize {
        self.viewport.size.height as usize
    }

    pub fn max_iterations(&self) -> u32 {
        self.viewport.max_iterations
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.counts[y * self.width() + x]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.counts.chunks_exact(self.width())
    }
}
