//! Transition policy: the state-advancement rule
//!
//! The policy decides where an instance goes after an event's action
//! chain has run. It is a replaceable strategy so that guard conditions
//! can be layered in later without touching the engine's orchestration.

use flow_types::{ActionOutcome, EventDef, StateName};

/// What the policy decided
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionDecision {
    /// Advance the instance to this state
    Advance(StateName),
    /// Keep the instance where it is
    Stay,
    /// Refuse to advance even though the action chain succeeded
    Deny { reason: String },
}

/// Computes the next state from the fired event and the action outcomes
pub trait TransitionPolicy: Send + Sync {
    fn next_state(&self, event: &EventDef, outcomes: &[ActionOutcome]) -> TransitionDecision;
}

/// The default rule: all-or-nothing advancement.
///
/// Advance to the event's declared target only when every invoked action
/// succeeded; any failure keeps the instance where it is, with no partial
/// transition. An event with no actions advances unconditionally.
#[derive(Clone, Debug, Default)]
pub struct AllOrNothing;

impl TransitionPolicy for AllOrNothing {
    fn next_state(&self, event: &EventDef, outcomes: &[ActionOutcome]) -> TransitionDecision {
        if outcomes.iter().all(ActionOutcome::is_success) {
            TransitionDecision::Advance(event.target.clone())
        } else {
            TransitionDecision::Stay
        }
    }
}
