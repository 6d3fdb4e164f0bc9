pub mod detector;
pub mod landmarks;
pub mod subprocess;

pub use detector::LandmarkDetector;
pub use landmarks::{HandObservation, Handedness, Landmark, LANDMARK_COUNT};
pub use subprocess::SubprocessDetector;
