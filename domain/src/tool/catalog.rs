//! Tool catalog: the closed, immutable name → capability registry

use super::entities::ToolDescriptor;
use super::traits::Capability;
use crate::core::error::DomainError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of every capability the engine may run.
///
/// Built once at startup from a fixed list; there is no way to add or
/// remove a capability afterwards. Names are matched case-insensitively.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    /// Registration order, for stable listings
    capabilities: Vec<Arc<dyn Capability>>,
    /// Lowercased name → index into `capabilities`
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    /// Build a catalog, rejecting duplicate names (case-insensitively)
    pub fn new(
        capabilities: impl IntoIterator<Item = Arc<dyn Capability>>,
    ) -> Result<Self, DomainError> {
        let mut catalog = Self::default();
        for capability in capabilities {
            let name = capability.describe().name.clone();
            let key = name.to_lowercase();
            if catalog.index.contains_key(&key) {
                return Err(DomainError::DuplicateTool(name));
            }
            catalog.index.insert(key, catalog.capabilities.len());
            catalog.capabilities.push(capability);
        }
        Ok(catalog)
    }

    /// Look up a capability by name (case-insensitive)
    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn Capability>, DomainError> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.capabilities[i])
            .ok_or_else(|| DomainError::ToolNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.capabilities.iter().map(|c| c.describe())
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.descriptors().map(|d| &d.name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolCall;
    use crate::tool::value_objects::ExecutionResult;

    struct Fixed(ToolDescriptor);

    impl Capability for Fixed {
        fn describe(&self) -> &ToolDescriptor {
            &self.0
        }

        fn execute(&self, _call: &ToolCall) -> ExecutionResult {
            ExecutionResult::planned("echo ok")
        }
    }

    fn cap(name: &str) -> Arc<dyn Capability> {
        Arc::new(Fixed(ToolDescriptor::new(name, "test tool")))
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = ToolCatalog::new([cap("FlushDnsCache"), cap("run_command")]).unwrap();

        assert_eq!(
            catalog.lookup("flushdnscache").unwrap().describe().name,
            "FlushDnsCache"
        );
        assert!(catalog.contains("RUN_COMMAND"));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_lookup_unknown() {
        let catalog = ToolCatalog::new([cap("FlushDnsCache")]).unwrap();
        let err = catalog.lookup("FooBar").err().unwrap();
        assert!(matches!(err, DomainError::ToolNotFound(ref n) if n == "FooBar"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = ToolCatalog::new([cap("RestartService"), cap("restartservice")]);
        assert!(matches!(result, Err(DomainError::DuplicateTool(_))));
    }

    #[test]
    fn test_descriptors_keep_registration_order() {
        let catalog = ToolCatalog::new([cap("b"), cap("a"), cap("c")]).unwrap();
        let names: Vec<&str> = catalog.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
