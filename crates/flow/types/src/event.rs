//! Events: named triggers recognized by a state
//!
//! An event owns the ordered action chain that runs when it fires and
//! names the state the instance advances to once the chain completes
//! without a fatal failure. Action order is significant: later actions
//! may depend on effects of earlier ones.

use crate::action::ActionSpec;
use crate::definition::StateName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named trigger with its action chain and declared target state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventDef {
    /// Name callers dispatch with; unique within the owning state
    pub name: String,
    /// Actions to execute when this event fires, in declaration order
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    /// The state to advance to when the chain succeeds
    pub target: StateName,
    /// Stop at the first failing action, or run the whole chain and
    /// aggregate every outcome
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
    /// Metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

fn default_fail_fast() -> bool {
    true
}

impl EventDef {
    /// Create a new event with an empty action chain
    pub fn new(name: impl Into<String>, target: impl Into<StateName>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
            target: target.into(),
            fail_fast: true,
            metadata: HashMap::new(),
        }
    }

    /// Append an action to the chain
    pub fn with_action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of actions in the chain
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}
