pub mod capture;
pub mod sequence;

use anyhow::Result;

pub use capture::{FrameGrabber, ThreadedFrameSource};
pub use sequence::ImageSequenceGrabber;

/// A captured RGB frame.
pub type Frame = image::RgbImage;

/// Delivers the most recent frame to the engine.
pub trait FrameSource: Send {
    fn start(&mut self) -> Result<()>;

    fn stop(&mut self);

    /// Most recent complete frame not yet handed out, if any.
    fn latest(&mut self) -> Option<Frame>;

    /// Low-power hint raised while no hand is in view.
    fn set_idle(&mut self, idle: bool);
}
