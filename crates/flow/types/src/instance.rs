//! Flow instances: running executions of a flow definition
//!
//! A FlowInstance is the engine's unit of work. It holds a name-based
//! reference to its definition (definitions version independently of
//! running instances) and a current-state pointer, plus the ordered
//! record of every committed transition.
//!
//! Each instance is a single-writer resource. The engine performs no
//! internal locking: callers must not dispatch two events against the
//! same instance concurrently without their own serialization (a
//! per-instance lock, or one logical task per instance).

use crate::definition::{FlowDefinitionId, StateName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Instance Identifier ──────────────────────────────────────────────

/// Unique identifier for a flow instance
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
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

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Flow Instance ────────────────────────────────────────────────────

/// A single running execution of a flow definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowInstance {
    /// Unique instance identifier
    pub id: InstanceId,
    /// The definition this instance executes against
    pub definition_id: FlowDefinitionId,
    /// Name of the state the instance is currently waiting in.
    /// Always the name of some state in the definition.
    pub current_state: StateName,
    /// Ordered record of every committed transition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<TransitionRecord>,
    /// When the instance was created
    pub created_at: DateTime<Utc>,
    /// When the instance last changed state
    pub updated_at: DateTime<Utc>,
    /// Metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl FlowInstance {
    /// Create an instance waiting in the given state.
    ///
    /// Conventionally the definition's designated initial state; callers
    /// rehydrating a persisted instance supply whatever state was stored.
    pub fn new(definition_id: FlowDefinitionId, start_state: impl Into<StateName>) -> Self {
        let now = Utc::now();
        Self {
            id: InstanceId::generate(),
            definition_id,
            current_state: start_state.into(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Commit a transition: move to `to` and append a history record.
    ///
    /// Called by the engine once the action chain and transition policy
    /// have allowed advancement; this is the only mutation the dispatch
    /// path performs on an instance.
    pub fn advance_to(&mut self, event: impl Into<String>, to: StateName) {
        let now = Utc::now();
        self.history.push(TransitionRecord {
            sequence: self.history.len() as u64,
            event: event.into(),
            from: self.current_state.clone(),
            to: to.clone(),
            at: now,
        });
        self.current_state = to;
        self.updated_at = now;
    }

    /// The most recent committed transition, if any
    pub fn last_transition(&self) -> Option<&TransitionRecord> {
        self.history.last()
    }

    /// Number of committed transitions
    pub fn transition_count(&self) -> usize {
        self.history.len()
    }
}

// ── Transition Record ────────────────────────────────────────────────

/// One committed state advancement
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Monotonically increasing sequence number, dense from 0
    pub sequence: u64,
    /// The event that fired
    pub event: String,
    /// State the instance left
    pub from: StateName,
    /// State the instance entered
    pub to: StateName,
    /// When the transition was committed
    pub at: DateTime<Utc>,
}
