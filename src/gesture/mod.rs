pub mod classifier;
pub mod mapper;
pub mod types;

pub use classifier::{ClassifierState, GestureClassifier};
pub use mapper::PointerMapper;
pub use types::{GestureEvent, GestureKind};
