//! Action execution: the engine's only side-effecting seam
//!
//! Concrete action behavior lives outside the engine. Implementations of
//! [`ActionHandler`] are registered by kind in an [`ActionRegistry`]; the
//! [`ActionExecutor`] invokes one action at a time and converts every
//! fault (an `Err`, a panic, an unregistered kind) into a `Failed`
//! outcome. No action is allowed to leave the engine's control flow via
//! an unhandled fault.

use flow_types::{ActionOutcome, ActionSpec, FlowInstance, InstanceId, StateName};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

// ── Handler Contract ─────────────────────────────────────────────────

/// Error returned by an action handler
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<String> for ActionError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

impl From<&str> for ActionError {
    fn from(reason: &str) -> Self {
        Self(reason.to_string())
    }
}

/// Everything a handler gets to see about the invocation
///
/// Actions are stateless across invocations; whatever they need beyond
/// this context must be fetched externally.
#[derive(Clone, Debug)]
pub struct ActionCall<'a> {
    /// The instance the event fired on
    pub instance: &'a InstanceId,
    /// The state the instance is dispatching from
    pub state: &'a StateName,
    /// The event name that triggered the chain
    pub event: &'a str,
    /// The action's configuration payload
    pub params: &'a Value,
}

/// The capability contract action implementations plug in through.
///
/// `execute` is a blocking call from the engine's perspective; a handler
/// may run async machinery internally but must not return before its
/// work has an outcome.
pub trait ActionHandler: Send + Sync {
    fn execute(&self, call: &ActionCall<'_>) -> Result<(), ActionError>;
}

impl<F> ActionHandler for F
where
    F: Fn(&ActionCall<'_>) -> Result<(), ActionError> + Send + Sync,
{
    fn execute(&self, call: &ActionCall<'_>) -> Result<(), ActionError> {
        self(call)
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Registry of action handlers, keyed by action kind
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an action kind, replacing any previous one
    pub fn register(&mut self, kind: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let kind = kind.into();
        tracing::debug!(kind = %kind, "action handler registered");
        self.handlers.insert(kind, handler);
    }

    /// Get the handler for a kind
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(kind)
    }

    /// Check whether a kind has a handler
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Number of registered handlers
    pub fn count(&self) -> usize {
        self.handlers.len()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("ActionRegistry").field("kinds", &kinds).finish()
    }
}

// ── Executor ─────────────────────────────────────────────────────────

/// Invokes a single action and reports its outcome
#[derive(Clone, Debug)]
pub struct ActionExecutor {
    actions: ActionRegistry,
}

impl ActionExecutor {
    pub fn new(actions: ActionRegistry) -> Self {
        Self { actions }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Execute one action of the event firing on `instance`.
    ///
    /// Handler faults never propagate: an `Err`, a panic, or a kind with
    /// no registered handler all come back as a `Failed` outcome.
    pub fn execute(
        &self,
        spec: &ActionSpec,
        instance: &FlowInstance,
        event: &str,
    ) -> ActionOutcome {
        let handler = match self.actions.get(&spec.kind) {
            Some(handler) => Arc::clone(handler),
            None => {
                tracing::warn!(kind = %spec.kind, "no handler registered for action kind");
                return ActionOutcome::failed(
                    &spec.kind,
                    format!("no handler registered for action kind '{}'", spec.kind),
                );
            }
        };

        let call = ActionCall {
            instance: &instance.id,
            state: &instance.current_state,
            event,
            params: &spec.params,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.execute(&call))) {
            Ok(Ok(())) => ActionOutcome::succeeded(&spec.kind),
            Ok(Err(err)) => ActionOutcome::failed(&spec.kind, err.to_string()),
            Err(payload) => {
                let reason = panic_reason(&payload);
                tracing::error!(kind = %spec.kind, reason = %reason, "action panicked");
                ActionOutcome::failed(&spec.kind, format!("action panicked: {}", reason))
            }
        }
    }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_types::FlowDefinitionId;
    use serde_json::json;
    use std::sync::Mutex;

    struct Noop;

    impl ActionHandler for Noop {
        fn execute(&self, _call: &ActionCall<'_>) -> Result<(), ActionError> {
            Ok(())
        }
    }

    struct AlwaysFails;

    impl ActionHandler for AlwaysFails {
        fn execute(&self, _call: &ActionCall<'_>) -> Result<(), ActionError> {
            Err(ActionError::new("backend unreachable"))
        }
    }

    struct Panics;

    impl ActionHandler for Panics {
        fn execute(&self, _call: &ActionCall<'_>) -> Result<(), ActionError> {
            panic!("boom");
        }
    }

    /// Records what the handler was invoked with.
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl ActionHandler for Recorder {
        fn execute(&self, call: &ActionCall<'_>) -> Result<(), ActionError> {
            self.seen.lock().unwrap().push(format!(
                "{}:{}:{}",
                call.state,
                call.event,
                call.params["channel"].as_str().unwrap_or("-")
            ));
            Ok(())
        }
    }

    fn make_instance() -> FlowInstance {
        FlowInstance::new(FlowDefinitionId::new("def"), "submitted")
    }

    fn make_executor(kind: &str, handler: Arc<dyn ActionHandler>) -> ActionExecutor {
        let mut registry = ActionRegistry::new();
        registry.register(kind, handler);
        ActionExecutor::new(registry)
    }

    #[test]
    fn test_successful_action() {
        let executor = make_executor("noop", Arc::new(Noop));
        let outcome = executor.execute(&ActionSpec::new("noop"), &make_instance(), "go");
        assert!(outcome.is_success());
        assert_eq!(outcome.action, "noop");
    }

    #[test]
    fn test_failing_action() {
        let executor = make_executor("charge", Arc::new(AlwaysFails));
        let outcome = executor.execute(&ActionSpec::new("charge"), &make_instance(), "go");
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_reason(), Some("backend unreachable"));
    }

    #[test]
    fn test_panicking_action_is_contained() {
        let executor = make_executor("explode", Arc::new(Panics));
        let outcome = executor.execute(&ActionSpec::new("explode"), &make_instance(), "go");
        assert!(!outcome.is_success());
        assert!(outcome.failure_reason().unwrap().contains("boom"));
    }

    #[test]
    fn test_unregistered_kind_fails_the_action() {
        let executor = ActionExecutor::new(ActionRegistry::new());
        let outcome = executor.execute(&ActionSpec::new("missing"), &make_instance(), "go");
        assert!(!outcome.is_success());
        assert!(outcome
            .failure_reason()
            .unwrap()
            .contains("no handler registered"));
    }

    #[test]
    fn test_call_context_reaches_the_handler() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let executor = make_executor("notify", recorder.clone());

        let spec = ActionSpec::new("notify").with_params(json!({ "channel": "email" }));
        let outcome = executor.execute(&spec, &make_instance(), "approve");

        assert!(outcome.is_success());
        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            ["submitted:approve:email"]
        );
    }

    #[test]
    fn test_plain_fn_handlers() {
        fn strict(call: &ActionCall<'_>) -> Result<(), ActionError> {
            if call.params.is_null() {
                Err(ActionError::new("params required"))
            } else {
                Ok(())
            }
        }
        let executor = make_executor("strict", Arc::new(strict));

        let bare = executor.execute(&ActionSpec::new("strict"), &make_instance(), "go");
        assert!(!bare.is_success());

        let configured = executor.execute(
            &ActionSpec::new("strict").with_params(json!({ "ok": true })),
            &make_instance(),
            "go",
        );
        assert!(configured.is_success());
    }

    #[test]
    fn test_registry_queries() {
        let mut registry = ActionRegistry::new();
        assert_eq!(registry.count(), 0);

        registry.register("noop", Arc::new(Noop));
        assert!(registry.contains("noop"));
        assert!(!registry.contains("other"));
        assert_eq!(registry.count(), 1);
        assert!(registry.get("noop").is_some());
    }
}
