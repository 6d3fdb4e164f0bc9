use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;
use uuid::Uuid;

/// Pointer-level phase of a running session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EnginePhase {
    /// No hand, no pointer.
    Idle,
    /// Pointer follows the hand with no button held.
    Tracking,
    /// Button held down at the sink.
    Dragging,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Stopped,
    IdleTimeout,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Stopped => write!(f, "stopped"),
            StopReason::IdleTimeout => write!(f, "idle_timeout"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineState {
    pub dragging: bool,
    pub last_seen: Instant,
    pub phase: EnginePhase,
    /// Whether the low-power hint is currently raised on the frame source.
    pub source_idle: bool,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            dragging: false,
            last_seen: Instant::now(),
            phase: EnginePhase::Idle,
            source_idle: false,
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters and outcome of one engine run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub reason: StopReason,
    pub frames: u64,
    pub observations: u64,
    pub clicks: u64,
    pub drags: u64,
    pub scrolls: u64,
    pub sink_errors: u64,
}

impl SessionSummary {
    pub fn begin() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            ended_at: None,
            reason: StopReason::Stopped,
            frames: 0,
            observations: 0,
            clicks: 0,
            drags: 0,
            scrolls: 0,
            sink_errors: 0,
        }
    }

    pub fn finish(&mut self, reason: StopReason) {
        self.reason = reason;
        self.ended_at = Some(Utc::now());
    }
}
