/// Wheel units per normalized scroll unit, one OS notch being 120.
pub const SCROLL_UNITS_PER_DELTA: f64 = 120.0;

/// Maps normalized pointer positions onto a screen of fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerMapper {
    width: u32,
    height: u32,
}

impl PointerMapper {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn to_screen(&self, pointer: (f64, f64)) -> (i32, i32) {
        let x = (pointer.0 * self.width as f64).round() as i32;
        let y = (pointer.1 * self.height as f64).round() as i32;
        (x, y)
    }

    pub fn scroll_amount(&self, scroll_delta: f64) -> f64 {
        scroll_delta * SCROLL_UNITS_PER_DELTA
    }
}
