use anyhow::Result;

use crate::camera::Frame;

use super::HandObservation;

/// Extracts hand landmarks from a single frame.
///
/// Synchronous and CPU-bound; called at most once per engine tick.
pub trait LandmarkDetector: Send {
    /// `Ok(None)` means no hand was visible in the frame.
    fn detect(&mut self, frame: &Frame) -> Result<Option<HandObservation>>;

    /// Releases model or process resources.
    fn close(&mut self) {}
}
