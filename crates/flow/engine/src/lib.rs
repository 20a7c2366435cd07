//! Event dispatch runtime for flow instances
//!
//! The engine takes a validated flow definition and a running instance,
//! accepts an incoming event name, locates the matching transition in the
//! instance's current state, executes the event's ordered action chain,
//! and commits the advancement the transition policy allows.
//!
//! # Key Principle
//!
//! **No fault crosses `send_event`'s boundary.** Action errors, panics,
//! unknown events, and corrupted instances all come back as a structured
//! [`SendEventResult`](flow_types::SendEventResult); the caller decides
//! what to retry, persist, or surface.
//!
//! # Architecture
//!
//! [`FlowEngine`] composes specialized components:
//!
//! - [`DefinitionRegistry`] — validates and stores flow definitions
//! - [`EventResolver`] — matches an incoming event within the current state
//! - [`ActionExecutor`] — invokes one action at a time, containing faults
//! - [`TransitionPolicy`] — the replaceable state-advancement rule
//!
//! The engine owns no instances and takes no locks: each instance is a
//! single-writer resource and callers keep at most one `send_event` in
//! flight per instance.
//!
//! # Example
//!
//! ```rust
//! use flow_engine::{ActionRegistry, FlowEngine};
//! use flow_types::{EventDef, FlowDefinition, StateDef};
//!
//! let mut engine = FlowEngine::new(ActionRegistry::new());
//!
//! // Register a definition: submitted --(approve)--> approved
//! let mut definition = FlowDefinition::new("order-intake");
//! let mut submitted = StateDef::initial("submitted");
//! submitted.add_event(EventDef::new("approve", "approved")).unwrap();
//! definition.add_state(submitted).unwrap();
//! definition.add_state(StateDef::new("approved")).unwrap();
//! let def_id = engine.register_definition(definition).unwrap();
//!
//! // Run an instance through it
//! let mut instance = engine.create_instance(&def_id).unwrap();
//! let result = engine.send_event(&mut instance, "approve");
//!
//! assert!(result.succeeded);
//! assert_eq!(instance.current_state.as_str(), "approved");
//! ```

#![deny(unsafe_code)]

pub mod engine;
pub mod executor;
pub mod policy;
pub mod registry;
pub mod resolver;

// Re-export main types
pub use engine::FlowEngine;
pub use executor::{ActionCall, ActionError, ActionExecutor, ActionHandler, ActionRegistry};
pub use policy::{AllOrNothing, TransitionDecision, TransitionPolicy};
pub use registry::DefinitionRegistry;
pub use resolver::EventResolver;
