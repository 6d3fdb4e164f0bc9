use serde::{Deserialize, Serialize};

/// Hand landmark indices (MediaPipe hand landmark model convention).
#[allow(dead_code)]
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
}

pub const LANDMARK_COUNT: usize = 21;

/// A single landmark, `x`/`y` normalized to the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
    Unknown,
}

impl Default for Handedness {
    fn default() -> Self {
        Handedness::Unknown
    }
}

impl Handedness {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "left" => Handedness::Left,
            "right" => Handedness::Right,
            _ => Handedness::Unknown,
        }
    }
}

/// One frame's worth of detected hand landmarks.
///
/// `landmarks` is index-addressed; a well-formed observation carries
/// [`LANDMARK_COUNT`] points but consumers must tolerate shorter sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandObservation {
    pub frame_size: (u32, u32),
    pub landmarks: Vec<Landmark>,
    pub handedness: Handedness,
    /// Monotonic seconds.
    pub timestamp: f64,
}

impl HandObservation {
    pub fn landmark(&self, idx: usize) -> Option<&Landmark> {
        self.landmarks.get(idx)
    }
}
