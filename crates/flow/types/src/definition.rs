//! Flow definitions: the immutable template instances execute against
//!
//! A FlowDefinition is a graph of named states. Each state exposes named
//! events, and each event carries an ordered action chain plus the state
//! to advance to when the chain completes cleanly.
//!
//! Definitions are immutable once validated. To modify, create a new
//! version; running instances keep referring to theirs by id.

use crate::error::{FlowError, FlowResult};
use crate::event::EventDef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a flow definition
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowDefinitionId(pub String);

impl FlowDefinitionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for FlowDefinitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The name of a state, the key instances point into their definition with
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateName(pub String);

impl StateName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for StateName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for StateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Flow Definition ──────────────────────────────────────────────────

/// A flow definition — the shared, read-only blueprint for instances
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Unique identifier
    pub id: FlowDefinitionId,
    /// Human-readable name
    pub name: String,
    /// Description of what this flow accomplishes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Version for tracking definition evolution
    pub version: u32,
    /// The states of the graph, in declaration order
    pub states: Vec<StateDef>,
    /// When this definition was created
    pub created_at: DateTime<Utc>,
    /// Metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl FlowDefinition {
    /// Create a new, empty flow definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FlowDefinitionId::generate(),
            name: name.into(),
            description: String::new(),
            version: 1,
            states: Vec::new(),
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Add a state to the definition
    pub fn add_state(&mut self, state: StateDef) -> FlowResult<()> {
        if self.states.iter().any(|s| s.name == state.name) {
            return Err(FlowError::DuplicateState(state.name));
        }
        self.states.push(state);
        Ok(())
    }

    /// Get the state marked initial
    pub fn initial_state(&self) -> Option<&StateDef> {
        self.states.iter().find(|s| s.initial)
    }

    /// Get a state by name
    pub fn get_state(&self, name: &str) -> Option<&StateDef> {
        self.states.iter().find(|s| s.name.as_str() == name)
    }

    /// Total number of states
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Validate the definition for structural correctness.
    ///
    /// Runs the full sweep even for graphs built through the checked
    /// constructors, since definitions may also arrive deserialized from
    /// an external loader.
    pub fn validate(&self) -> FlowResult<()> {
        if self.states.is_empty() {
            return Err(FlowError::EmptyDefinition);
        }

        let initial_count = self.states.iter().filter(|s| s.initial).count();
        if initial_count == 0 {
            return Err(FlowError::NoInitialState);
        }
        if initial_count > 1 {
            return Err(FlowError::MultipleInitialStates);
        }

        let mut seen = HashSet::new();
        for state in &self.states {
            if !seen.insert(&state.name) {
                return Err(FlowError::DuplicateState(state.name.clone()));
            }
        }

        for state in &self.states {
            let mut event_names = HashSet::new();
            for event in &state.events {
                if !event_names.insert(event.name.as_str()) {
                    return Err(FlowError::DuplicateEvent {
                        state: state.name.clone(),
                        event: event.name.clone(),
                    });
                }
                if self.get_state(event.target.as_str()).is_none() {
                    return Err(FlowError::UnknownTargetState {
                        state: state.name.clone(),
                        event: event.name.clone(),
                        target: event.target.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

// ── State ────────────────────────────────────────────────────────────

/// A named node in the flow graph
///
/// A state with no events is terminal: every dispatch against it resolves
/// to `NoSuchTransition`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateDef {
    /// Unique name within the owning definition
    pub name: StateName,
    /// Whether instances start here by default
    #[serde(default)]
    pub initial: bool,
    /// The events this state recognizes, in declaration order
    #[serde(default)]
    pub events: Vec<EventDef>,
}

impl StateDef {
    /// Create a new state
    pub fn new(name: impl Into<StateName>) -> Self {
        Self {
            name: name.into(),
            initial: false,
            events: Vec::new(),
        }
    }

    /// Create a state marked as the definition's entry point
    pub fn initial(name: impl Into<StateName>) -> Self {
        Self {
            name: name.into(),
            initial: true,
            events: Vec::new(),
        }
    }

    /// Add an event to this state
    pub fn add_event(&mut self, event: EventDef) -> FlowResult<()> {
        if self.events.iter().any(|e| e.name == event.name) {
            return Err(FlowError::DuplicateEvent {
                state: self.name.clone(),
                event: event.name,
            });
        }
        self.events.push(event);
        Ok(())
    }

    /// Find the first event with the given name (case-sensitive)
    pub fn event(&self, name: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.name == name)
    }

    /// A state with no outgoing events never leaves
    pub fn is_terminal(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events this state recognizes
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionSpec;

    fn make_definition() -> FlowDefinition {
        let mut def = FlowDefinition::new("order-intake").with_description("Intake and approval");

        let mut submitted = StateDef::initial("submitted");
        submitted
            .add_event(
                EventDef::new("approve", "approved").with_action(ActionSpec::new("notify")),
            )
            .unwrap();
        submitted
            .add_event(EventDef::new("discard", "discarded"))
            .unwrap();

        def.add_state(submitted).unwrap();
        def.add_state(StateDef::new("approved")).unwrap();
        def.add_state(StateDef::new("discarded")).unwrap();
        def
    }

    #[test]
    fn test_create_definition() {
        let def = make_definition();
        assert_eq!(def.name, "order-intake");
        assert_eq!(def.version, 1);
        assert_eq!(def.state_count(), 3);
        assert_eq!(def.initial_state().unwrap().name.as_str(), "submitted");
    }

    #[test]
    fn test_validate_valid() {
        assert!(make_definition().validate().is_ok());
    }

    #[test]
    fn test_validate_empty() {
        let def = FlowDefinition::new("empty");
        assert_eq!(def.validate(), Err(FlowError::EmptyDefinition));
    }

    #[test]
    fn test_validate_no_initial_state() {
        let mut def = FlowDefinition::new("no-initial");
        def.add_state(StateDef::new("a")).unwrap();
        def.add_state(StateDef::new("b")).unwrap();
        assert_eq!(def.validate(), Err(FlowError::NoInitialState));
    }

    #[test]
    fn test_validate_multiple_initial_states() {
        let mut def = FlowDefinition::new("two-entries");
        def.add_state(StateDef::initial("a")).unwrap();
        def.add_state(StateDef::initial("b")).unwrap();
        assert_eq!(def.validate(), Err(FlowError::MultipleInitialStates));
    }

    #[test]
    fn test_add_state_duplicate() {
        let mut def = FlowDefinition::new("dup");
        def.add_state(StateDef::initial("a")).unwrap();
        let result = def.add_state(StateDef::new("a"));
        assert!(matches!(result, Err(FlowError::DuplicateState(_))));
    }

    #[test]
    fn test_add_event_duplicate() {
        let mut state = StateDef::new("a");
        state.add_event(EventDef::new("go", "b")).unwrap();
        let result = state.add_event(EventDef::new("go", "c"));
        assert!(matches!(result, Err(FlowError::DuplicateEvent { .. })));
    }

    #[test]
    fn test_validate_unknown_target() {
        let mut def = FlowDefinition::new("dangling");
        let mut start = StateDef::initial("start");
        start.add_event(EventDef::new("go", "nowhere")).unwrap();
        def.add_state(start).unwrap();
        assert!(matches!(
            def.validate(),
            Err(FlowError::UnknownTargetState { .. })
        ));
    }

    #[test]
    fn test_terminal_state() {
        let def = make_definition();
        assert!(def.get_state("approved").unwrap().is_terminal());
        assert!(!def.get_state("submitted").unwrap().is_terminal());
    }

    #[test]
    fn test_event_lookup_is_exact() {
        let def = make_definition();
        let submitted = def.get_state("submitted").unwrap();
        assert!(submitted.event("approve").is_some());
        assert!(submitted.event("Approve").is_none());
        assert!(submitted.event("approv").is_none());
    }

    #[test]
    fn test_definition_from_json() {
        // The shape an external loader hands the engine.
        let json = r#"{
            "id": "review-v1",
            "name": "review",
            "version": 1,
            "created_at": "2025-11-02T09:30:00Z",
            "states": [
                {
                    "name": "draft",
                    "initial": true,
                    "events": [
                        {
                            "name": "submit",
                            "target": "in_review",
                            "actions": [{ "kind": "notify-reviewers" }]
                        }
                    ]
                },
                { "name": "in_review" }
            ]
        }"#;

        let def: FlowDefinition = serde_json::from_str(json).unwrap();
        assert!(def.validate().is_ok());
        assert_eq!(def.id, FlowDefinitionId::new("review-v1"));
        assert_eq!(def.initial_state().unwrap().name.as_str(), "draft");

        let submit = def.get_state("draft").unwrap().event("submit").unwrap();
        assert!(submit.fail_fast);
        assert_eq!(submit.actions.len(), 1);
    }

    #[test]
    fn test_definition_id() {
        let id = FlowDefinitionId::generate();
        assert!(!id.0.is_empty());
        assert!(id.short().len() <= 8);

        let named = FlowDefinitionId::new("order-intake-v2");
        assert_eq!(format!("{}", named), "order-intake-v2");
    }
}
