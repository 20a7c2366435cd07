//! Actions as data: what to invoke, not how
//!
//! An ActionSpec names a handler kind registered with the engine and
//! carries an arbitrary configuration payload for it. Specs are stateless
//! across invocations; anything a handler needs beyond its params must be
//! passed in through the call context or fetched externally.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A unit of invocable side-effecting work attached to an event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Registry key selecting the handler that executes this action
    pub kind: String,
    /// Arbitrary configuration payload handed to the handler
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl ActionSpec {
    /// Create an action with no configuration
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Value::Null,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}
