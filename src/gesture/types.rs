use serde::{Deserialize, Serialize};

/// High level gestures understood by the pointer engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    Idle,
    Move,
    Click,
    Drag,
    Scroll,
}

impl Default for GestureKind {
    fn default() -> Self {
        GestureKind::Idle
    }
}

/// Result of gesture inference for a single observation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GestureEvent {
    pub kind: GestureKind,
    /// Smoothed index fingertip, clamped to `[0, 1]` per axis.
    pub pointer: Option<(f64, f64)>,
    pub scroll_delta: f64,
    pub is_click: bool,
    pub is_drag: bool,
    /// Set on the frame where an armed pinch is let go.
    pub drag_released: bool,
}

impl GestureEvent {
    pub fn idle() -> Self {
        Self::default()
    }
}
