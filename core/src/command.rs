use crate::types::FieldId;
use serde::{Deserialize, Serialize};

/// All player-issued commands.
/// Variants may be added — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Quiz ──────────────────────────────────────
    SubmitAnswer { answer: String },
    /// Sent by the host once the delay from `NextQuestionScheduled` elapses.
    CompletePendingAdvance,

    // ── Deployment ────────────────────────────────
    AttemptDeployment { field: FieldId },

    // ── Clock ─────────────────────────────────────
    AdvanceTime,

    // ── Session ───────────────────────────────────
    Reset,
}
