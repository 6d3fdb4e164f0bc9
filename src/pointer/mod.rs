pub mod recording;
pub mod system;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use recording::RecordingPointer;
pub use system::EnigoPointer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl Default for MouseButton {
    fn default() -> Self {
        MouseButton::Left
    }
}

/// A single command issued to a pointer sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum PointerCommand {
    Move { x: i32, y: i32 },
    Click(MouseButton),
    Press(MouseButton),
    Release(MouseButton),
    Scroll { dy: f64, dx: f64 },
}

/// OS pointer control used by the engine. Every call is fire-and-forget.
pub trait PointerSink: Send {
    fn screen_size(&mut self) -> Result<(u32, u32)>;

    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    fn click(&mut self, button: MouseButton) -> Result<()>;

    fn press(&mut self, button: MouseButton) -> Result<()>;

    fn release(&mut self, button: MouseButton) -> Result<()>;

    fn scroll(&mut self, dy: f64, dx: f64) -> Result<()>;
}

/// The OS pointer of the current desktop session.
pub fn system_pointer() -> Result<Box<dyn PointerSink>> {
    Ok(Box::new(EnigoPointer::new()?))
}
