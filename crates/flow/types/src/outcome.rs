//! Dispatch outcomes: what a single `send_event` call reports back
//!
//! `SendEventResult` is a transient value object built per call. The
//! per-action outcome list covers exactly the actions that were invoked,
//! in invocation order; under fail-fast, actions after the first failure
//! never ran and produce no outcome.

use crate::definition::StateName;
use crate::error::FlowError;
use serde::{Deserialize, Serialize};

// ── Per-Action Outcome ───────────────────────────────────────────────

/// How a single action invocation ended
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionStatus {
    /// The handler returned cleanly
    Succeeded,
    /// The handler returned an error or panicked
    Failed { reason: String },
}

impl ActionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// The recorded result of one action invocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// The action's registry kind
    pub action: String,
    /// How the invocation ended
    pub status: ActionStatus,
}

impl ActionOutcome {
    pub fn succeeded(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: ActionStatus::Succeeded,
        }
    }

    pub fn failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: ActionStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The failure reason, if the invocation failed
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            ActionStatus::Failed { reason } => Some(reason),
            ActionStatus::Succeeded => None,
        }
    }
}

// ── Aggregate Result ─────────────────────────────────────────────────

/// The aggregate result of one `send_event` call
///
/// Callers distinguish a recoverable non-transition from a genuine action
/// failure through `error` and the populated outcome list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SendEventResult {
    /// Whether the instance advanced
    pub succeeded: bool,
    /// The state the instance is in after the call
    pub resulting_state: StateName,
    /// One outcome per invoked action, in invocation order
    pub outcomes: Vec<ActionOutcome>,
    /// Why the instance did not advance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FlowError>,
}

impl SendEventResult {
    /// The instance advanced to `resulting_state`
    pub fn advanced(resulting_state: StateName, outcomes: Vec<ActionOutcome>) -> Self {
        Self {
            succeeded: true,
            resulting_state,
            outcomes,
            error: None,
        }
    }

    /// The instance stayed where it was
    pub fn rejected(
        resulting_state: StateName,
        outcomes: Vec<ActionOutcome>,
        error: FlowError,
    ) -> Self {
        Self {
            succeeded: false,
            resulting_state,
            outcomes,
            error: Some(error),
        }
    }
}
