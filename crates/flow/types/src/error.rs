//! Error taxonomy for flow definition, registration, and dispatch.
//!
//! Dispatch errors (`InvalidState`, `NoSuchTransition`, `ActionFailure`,
//! `TransitionDenied`) never cross the engine boundary as `Err`: they are
//! folded into the `SendEventResult` returned to the caller. The remaining
//! variants surface at definition registration time.

use crate::definition::{FlowDefinitionId, StateName};
use serde::{Deserialize, Serialize};

/// Result alias used throughout the flow crates
pub type FlowResult<T> = Result<T, FlowError>;

/// Everything that can go wrong while registering a definition or
/// dispatching an event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum FlowError {
    /// The instance references a definition the engine does not know.
    #[error("flow definition not found: {0}")]
    DefinitionNotFound(FlowDefinitionId),

    /// The instance's recorded state does not exist in its own definition.
    /// A data-integrity fault: fatal, never retried.
    #[error("instance state '{state}' does not exist in definition '{definition}'")]
    InvalidState {
        definition: FlowDefinitionId,
        state: StateName,
    },

    /// The current state has no event matching the requested name.
    /// Expected and recoverable; the instance is left where it was.
    #[error("state '{state}' has no event named '{event}'")]
    NoSuchTransition { state: StateName, event: String },

    /// An action raised a fault during execution.
    #[error("action '{action}' failed: {reason}")]
    ActionFailure { action: String, reason: String },

    /// The transition policy declined to advance despite action success.
    #[error("transition denied: {reason}")]
    TransitionDenied { reason: String },

    /// Two states in one definition share a name.
    #[error("duplicate state name: {0}")]
    DuplicateState(StateName),

    /// Two events within one state share a name.
    #[error("duplicate event name '{event}' in state '{state}'")]
    DuplicateEvent { state: StateName, event: String },

    /// An event targets a state that is not part of the definition.
    #[error("event '{event}' in state '{state}' targets unknown state '{target}'")]
    UnknownTargetState {
        state: StateName,
        event: String,
        target: StateName,
    },

    /// A definition must contain at least one state.
    #[error("definition has no states")]
    EmptyDefinition,

    /// Exactly one state must be marked initial.
    #[error("definition has no initial state")]
    NoInitialState,

    /// Exactly one state must be marked initial.
    #[error("definition has more than one initial state")]
    MultipleInitialStates,
}

impl FlowError {
    /// Dispatch errors that indicate upstream data corruption rather than
    /// an expected runtime outcome
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. } | Self::DefinitionNotFound(_)
        )
    }
}
