use anyhow::{anyhow, bail, Result};
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Mouse, Settings};

use super::{MouseButton, PointerSink};

/// Drives the OS pointer through `enigo` on every desktop platform.
pub struct EnigoPointer {
    enigo: Enigo,
}

impl EnigoPointer {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("failed to connect to the input system: {:?}", e))?;
        Ok(Self { enigo })
    }

    fn button(&mut self, button: MouseButton, direction: Direction) -> Result<()> {
        self.enigo
            .button(enigo_button(button), direction)
            .map_err(|e| anyhow!("{:?}", e))
    }
}

fn enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

fn display_size(width: i32, height: i32) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => bail!("main display reports an unusable size {width}x{height}"),
    }
}

/// Whole wheel steps for `enigo`, whose vertical axis grows downward.
/// A positive `dy` scrolls content up, a positive `dx` scrolls right.
fn wheel_steps(dy: f64, dx: f64) -> (i32, i32) {
    (-(dy.round() as i32), dx.round() as i32)
}

impl PointerSink for EnigoPointer {
    fn screen_size(&mut self) -> Result<(u32, u32)> {
        let (width, height) = self
            .enigo
            .main_display()
            .map_err(|e| anyhow!("failed to query main display: {:?}", e))?;
        display_size(width, height)
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| anyhow!("{:?}", e))
    }

    fn click(&mut self, button: MouseButton) -> Result<()> {
        self.button(button, Direction::Click)
    }

    fn press(&mut self, button: MouseButton) -> Result<()> {
        self.button(button, Direction::Press)
    }

    fn release(&mut self, button: MouseButton) -> Result<()> {
        self.button(button, Direction::Release)
    }

    fn scroll(&mut self, dy: f64, dx: f64) -> Result<()> {
        let (vertical, horizontal) = wheel_steps(dy, dx);
        if vertical != 0 {
            self.enigo
                .scroll(vertical, Axis::Vertical)
                .map_err(|e| anyhow!("{:?}", e))?;
        }
        if horizontal != 0 {
            self.enigo
                .scroll(horizontal, Axis::Horizontal)
                .map_err(|e| anyhow!("{:?}", e))?;
        }
        Ok(())
    }
}
