pub mod loop_worker;
pub mod state;

pub use loop_worker::Engine;
pub use state::{EnginePhase, EngineState, SessionSummary, StopReason};
