//! The flow engine: dispatch orchestration for a single event
//!
//! `send_event` is the engine's whole public job: resolve the incoming
//! event against the instance's current state, run the event's action
//! chain in declaration order, ask the transition policy where to go,
//! commit the advancement, and report an aggregate result. Every error
//! on that path is folded into the [`SendEventResult`]; nothing escapes
//! the boundary as `Err` or a panic.
//!
//! The engine holds no instances. Callers own them, persist them after
//! each dispatch if they need durability, and serialize access so that
//! at most one `send_event` is in flight per instance at a time.

use crate::executor::{ActionExecutor, ActionRegistry};
use crate::policy::{AllOrNothing, TransitionDecision, TransitionPolicy};
use crate::registry::DefinitionRegistry;
use crate::resolver::EventResolver;
use flow_types::{
    ActionOutcome, FlowDefinition, FlowDefinitionId, FlowError, FlowInstance, FlowResult,
    SendEventResult,
};

/// Executes events against flow instances
pub struct FlowEngine {
    definitions: DefinitionRegistry,
    resolver: EventResolver,
    executor: ActionExecutor,
    policy: Box<dyn TransitionPolicy>,
}

impl FlowEngine {
    /// Create an engine with the given action handlers and the default
    /// all-or-nothing transition policy
    pub fn new(actions: ActionRegistry) -> Self {
        Self {
            definitions: DefinitionRegistry::new(),
            resolver: EventResolver::new(),
            executor: ActionExecutor::new(actions),
            policy: Box::new(AllOrNothing),
        }
    }

    /// Replace the transition policy
    pub fn with_policy(mut self, policy: Box<dyn TransitionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    // ── Definition Management ────────────────────────────────────────

    /// Validate and register a flow definition
    pub fn register_definition(
        &mut self,
        definition: FlowDefinition,
    ) -> FlowResult<FlowDefinitionId> {
        self.definitions.register(definition)
    }

    /// Get a registered definition
    pub fn get_definition(&self, id: &FlowDefinitionId) -> FlowResult<&FlowDefinition> {
        self.definitions.get(id)
    }

    /// List all registered definitions
    pub fn list_definitions(&self) -> Vec<&FlowDefinition> {
        self.definitions.list()
    }

    /// Number of registered definitions
    pub fn definition_count(&self) -> usize {
        self.definitions.count()
    }

    /// The registered action handlers
    pub fn actions(&self) -> &ActionRegistry {
        self.executor.registry()
    }

    // ── Instance Lifecycle ───────────────────────────────────────────

    /// Create an instance waiting in the definition's initial state.
    ///
    /// The engine does not keep the instance; the caller owns it and is
    /// responsible for persisting it between dispatches.
    pub fn create_instance(&self, definition_id: &FlowDefinitionId) -> FlowResult<FlowInstance> {
        let definition = self.definitions.get(definition_id)?;
        let initial = definition
            .initial_state()
            .ok_or(FlowError::NoInitialState)?;

        let instance = FlowInstance::new(definition.id.clone(), initial.name.clone());
        tracing::info!(
            instance_id = %instance.id,
            definition_id = %definition_id,
            state = %instance.current_state,
            "flow instance created"
        );
        Ok(instance)
    }

    // ── Event Dispatch ───────────────────────────────────────────────

    /// Dispatch an event against an instance.
    ///
    /// Runs the matching event's actions in declaration order (under
    /// `fail_fast` the chain stops at the first failure, otherwise every
    /// action runs and every outcome is reported), then commits whatever
    /// advancement the transition policy allows. The instance's
    /// `current_state` is the only thing mutated, and only on success.
    pub fn send_event(&self, instance: &mut FlowInstance, event_name: &str) -> SendEventResult {
        let definition = match self.definitions.get(&instance.definition_id) {
            Ok(definition) => definition,
            Err(err) => {
                tracing::error!(
                    instance_id = %instance.id,
                    definition_id = %instance.definition_id,
                    "instance references an unknown definition"
                );
                return SendEventResult::rejected(instance.current_state.clone(), Vec::new(), err);
            }
        };

        let event = match self
            .resolver
            .resolve(definition, &instance.current_state, event_name)
        {
            Ok(event) => event,
            Err(err) => {
                if err.is_fatal() {
                    tracing::error!(
                        instance_id = %instance.id,
                        state = %instance.current_state,
                        "instance state missing from its definition"
                    );
                } else {
                    tracing::debug!(
                        instance_id = %instance.id,
                        state = %instance.current_state,
                        event = event_name,
                        "event not handled in current state"
                    );
                }
                return SendEventResult::rejected(instance.current_state.clone(), Vec::new(), err);
            }
        };

        let mut outcomes = Vec::with_capacity(event.actions.len());
        for spec in &event.actions {
            let outcome = self.executor.execute(spec, instance, event_name);
            let failed = !outcome.is_success();
            outcomes.push(outcome);
            if failed && event.fail_fast {
                break;
            }
        }

        match self.policy.next_state(event, &outcomes) {
            TransitionDecision::Advance(target) => {
                instance.advance_to(event_name, target.clone());
                tracing::info!(
                    instance_id = %instance.id,
                    event = event_name,
                    state = %target,
                    "flow advanced"
                );
                SendEventResult::advanced(target, outcomes)
            }
            TransitionDecision::Stay => {
                let error = first_failure(&outcomes).unwrap_or_else(|| {
                    FlowError::TransitionDenied {
                        reason: format!(
                            "policy kept the instance in '{}'",
                            instance.current_state
                        ),
                    }
                });
                SendEventResult::rejected(instance.current_state.clone(), outcomes, error)
            }
            TransitionDecision::Deny { reason } => SendEventResult::rejected(
                instance.current_state.clone(),
                outcomes,
                FlowError::TransitionDenied { reason },
            ),
        }
    }
}

impl std::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine")
            .field("definitions", &self.definitions.count())
            .field("actions", &self.executor.registry().count())
            .finish()
    }
}

/// The first failed outcome in the chain, as the result's error detail
fn first_failure(outcomes: &[ActionOutcome]) -> Option<FlowError> {
    outcomes.iter().find_map(|outcome| {
        outcome.failure_reason().map(|reason| FlowError::ActionFailure {
            action: outcome.action.clone(),
            reason: reason.to_string(),
        })
    })
}
