use serde::{Deserialize, Serialize};

/// Upper bound of the normalized coordinate space used by the decision model.
pub const NORMALIZED_MAX: f64 = 1000.0;

/// Fixed virtual screen size for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn denormalize_x(&self, x: f64) -> i64 {
        denormalize(x, self.width)
    }

    pub fn denormalize_y(&self, y: f64) -> i64 {
        denormalize(y, self.height)
    }

    pub fn to_pixels(&self, x: f64, y: f64) -> (i64, i64) {
        (self.denormalize_x(x), self.denormalize_y(y))
    }

    pub fn center(&self) -> (i64, i64) {
        (self.width as i64 / 2, self.height as i64 / 2)
    }
}

/// Values outside [0,1000] land on the nearest screen edge; NaN maps to 0.
fn denormalize(value: f64, extent: u32) -> i64 {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, NORMALIZED_MAX) };
    (clamped / NORMALIZED_MAX * extent as f64).round() as i64
}
