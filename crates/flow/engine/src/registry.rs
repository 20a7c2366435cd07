//! Definition registry: validated, immutable-once-registered flow definitions
//!
//! Definitions are validated on the way in and never mutated afterwards;
//! to change a flow, register a new version. A name index keeps every
//! version reachable while instances keep executing against the version
//! they were created from.

use flow_types::{FlowDefinition, FlowDefinitionId, FlowError, FlowResult};
use std::collections::HashMap;

/// Registry of flow definitions
#[derive(Clone, Debug, Default)]
pub struct DefinitionRegistry {
    /// All registered definitions, keyed by id
    definitions: HashMap<FlowDefinitionId, FlowDefinition>,
    /// Name → definition ids, in registration order (for versioning)
    by_name: HashMap<String, Vec<FlowDefinitionId>>,
}

impl DefinitionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Validate and store a definition, returning its id
    pub fn register(&mut self, definition: FlowDefinition) -> FlowResult<FlowDefinitionId> {
        definition.validate()?;

        let id = definition.id.clone();
        let name = definition.name.clone();

        self.definitions.insert(id.clone(), definition);
        self.by_name.entry(name).or_default().push(id.clone());

        tracing::info!(definition_id = %id, "flow definition registered");
        Ok(id)
    }

    /// Get a definition by id
    pub fn get(&self, id: &FlowDefinitionId) -> FlowResult<&FlowDefinition> {
        self.definitions
            .get(id)
            .ok_or_else(|| FlowError::DefinitionNotFound(id.clone()))
    }

    /// Get the most recently registered definition with this name
    pub fn get_latest_by_name(&self, name: &str) -> Option<&FlowDefinition> {
        self.by_name
            .get(name)
            .and_then(|ids| ids.last())
            .and_then(|id| self.definitions.get(id))
    }

    /// Get every registered version of a named flow
    pub fn get_versions_by_name(&self, name: &str) -> Vec<&FlowDefinition> {
        self.by_name
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.definitions.get(id)).collect())
            .unwrap_or_default()
    }

    /// List all registered definitions
    pub fn list(&self) -> Vec<&FlowDefinition> {
        self.definitions.values().collect()
    }

    /// Total number of registered definitions
    pub fn count(&self) -> usize {
        self.definitions.len()
    }

    /// Check if a definition exists
    pub fn contains(&self, id: &FlowDefinitionId) -> bool {
        self.definitions.contains_key(id)
    }

    /// Remove a definition
    ///
    /// Instances referencing it will fail dispatch with
    /// `DefinitionNotFound` until a definition with that id returns.
    pub fn remove(&mut self, id: &FlowDefinitionId) -> FlowResult<FlowDefinition> {
        let def = self
            .definitions
            .remove(id)
            .ok_or_else(|| FlowError::DefinitionNotFound(id.clone()))?;

        if let Some(ids) = self.by_name.get_mut(&def.name) {
            ids.retain(|i| i != id);
            if ids.is_empty() {
                self.by_name.remove(&def.name);
            }
        }

        tracing::info!(definition_id = %id, "flow definition removed");
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_types::{EventDef, StateDef};

    fn make_valid_definition(name: &str) -> FlowDefinition {
        let mut def = FlowDefinition::new(name);
        let mut start = StateDef::initial("start");
        start.add_event(EventDef::new("finish", "done")).unwrap();
        def.add_state(start).unwrap();
        def.add_state(StateDef::new("done")).unwrap();
        def
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = DefinitionRegistry::new();
        let id = registry.register(make_valid_definition("intake")).unwrap();

        assert_eq!(registry.get(&id).unwrap().name, "intake");
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_register_rejects_invalid() {
        let mut registry = DefinitionRegistry::new();
        let result = registry.register(FlowDefinition::new("no-states"));
        assert_eq!(result, Err(FlowError::EmptyDefinition));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_versions_by_name() {
        let mut registry = DefinitionRegistry::new();
        registry.register(make_valid_definition("intake")).unwrap();
        let second = registry
            .register(make_valid_definition("intake").with_version(2))
            .unwrap();

        assert_eq!(registry.get_versions_by_name("intake").len(), 2);
        assert_eq!(registry.get_latest_by_name("intake").unwrap().id, second);
        assert!(registry.get_latest_by_name("unknown").is_none());
    }

    #[test]
    fn test_remove() {
        let mut registry = DefinitionRegistry::new();
        let id = registry.register(make_valid_definition("intake")).unwrap();

        assert!(registry.contains(&id));
        let removed = registry.remove(&id).unwrap();
        assert_eq!(removed.name, "intake");
        assert!(!registry.contains(&id));
        assert!(registry.get_latest_by_name("intake").is_none());
    }

    #[test]
    fn test_get_nonexistent() {
        let registry = DefinitionRegistry::new();
        let result = registry.get(&FlowDefinitionId::new("missing"));
        assert!(matches!(result, Err(FlowError::DefinitionNotFound(_))));
    }

    #[test]
    fn test_remove_nonexistent() {
        let mut registry = DefinitionRegistry::new();
        let result = registry.remove(&FlowDefinitionId::new("missing"));
        assert!(matches!(result, Err(FlowError::DefinitionNotFound(_))));
    }
}
