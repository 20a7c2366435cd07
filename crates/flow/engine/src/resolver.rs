//! Event resolution: match an incoming trigger against the current state
//!
//! The resolver only looks; it never mutates the instance and has no
//! side effects. It distinguishes the two non-dispatch outcomes: a
//! current state missing from its own definition is a data-integrity
//! fault, while an event the state does not recognize is an expected,
//! recoverable miss.

use flow_types::{EventDef, FlowDefinition, FlowError, FlowResult, StateName};

/// Locates the event definition matching an incoming event name
#[derive(Clone, Debug, Default)]
pub struct EventResolver;

impl EventResolver {
    pub fn new() -> Self {
        Self
    }

    /// Find the event named `event_name` within `current_state`.
    ///
    /// Matching is case-sensitive and exact; the first event with the
    /// name wins. Events in other states are never considered.
    pub fn resolve<'d>(
        &self,
        definition: &'d FlowDefinition,
        current_state: &StateName,
        event_name: &str,
    ) -> FlowResult<&'d EventDef> {
        let state = definition
            .get_state(current_state.as_str())
            .ok_or_else(|| FlowError::InvalidState {
                definition: definition.id.clone(),
                state: current_state.clone(),
            })?;

        state
            .event(event_name)
            .ok_or_else(|| FlowError::NoSuchTransition {
                state: current_state.clone(),
                event: event_name.to_string(),
            })
    }
}
