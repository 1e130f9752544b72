use bytemuck::{Pod, Zeroable};

/// A pixel resolution.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Clamp each axis independently into `[min, max]`.
    pub fn clamp(self, min: Size, max: Size) -> Size {
        Size {
            width: self.width.clamp(min.width, max.width),
            height: self.height.clamp(min.height, max.height),
        }
    }

    /// Scale both axes by `factor`, rounding to the nearest pixel.
    pub fn scale(self, factor: f32) -> Size {
        Size {
            width: (self.width as f32 * factor).round() as u32,
            height: (self.height as f32 * factor).round() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_rounds_to_nearest() {
        assert_eq!(Size::new(800, 600).scale(1.0 / 1.2), Size::new(667, 500));
        assert_eq!(Size::new(100, 75).scale(1.2), Size::new(120, 90));
    }

    #[test]
    fn clamp_is_per_axis() {
        let clamped = Size::new(960, 50).clamp(Size::new(100, 75), Size::new(800, 600));
        assert_eq!(clamped, Size::new(800, 75));
    }
}
