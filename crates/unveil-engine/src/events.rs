//! Engine event and state types.
//!
//! Updates are serializable so hosts can forward them over any transport
//! they own (the core itself never does).

use serde::{Deserialize, Serialize};

/// Lifecycle state of a reveal run.
///
/// `Idle` is initial. `Complete` is terminal only until the next `start()`
/// or `reset()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    /// No run in progress; nothing revealed.
    #[default]
    Idle,
    /// Ticking; the revealed prefix grows.
    Streaming,
    /// Frozen mid-run; the revealed prefix is preserved.
    Paused,
    /// The whole document is revealed.
    Complete,
}

impl RevealState {
    pub fn is_streaming(self) -> bool {
        self == RevealState::Streaming
    }

    pub fn is_complete(self) -> bool {
        self == RevealState::Complete
    }
}

/// One push-based engine update: the currently revealed prefix and the
/// state it was observed in. Emitted on every tick and every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealUpdate {
    pub prefix: String,
    pub state: RevealState,
}
