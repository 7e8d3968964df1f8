//! Adapter Registry
//!
//! Explicit lookup table from tool identifier to adapter. Nothing registers
//! itself; callers build the registry they need (usually [`AdapterRegistry::builtin`]).

use crate::adapter::BenchmarkAdapter;
use crate::error::AdapterError;
use crate::hammerdb::HammerDbAdapter;
use crate::swingbench::SwingbenchAdapter;
use crate::sysbench::SysbenchAdapter;
use crate::tpcc::TpccAdapter;
use fxhash::FxHashMap;
use loadbench_core::{DatabaseType, ToolKind};
use std::str::FromStr;
use std::sync::Arc;

/// Tool identifier → adapter
#[derive(Debug, Default, Clone)]
pub struct AdapterRegistry {
    adapters: FxHashMap<&'static str, Arc<dyn BenchmarkAdapter>>,
    /// Registration order, for stable listings
    order: Vec<&'static str>,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in tools
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SysbenchAdapter));
        registry.register(Arc::new(HammerDbAdapter));
        registry.register(Arc::new(SwingbenchAdapter));
        registry.register(Arc::new(TpccAdapter));
        registry
    }

    /// Add or replace the adapter for its tool
    pub fn register(&mut self, adapter: Arc<dyn BenchmarkAdapter>) {
        let id = adapter.tool().id();
        if self.adapters.insert(id, adapter).is_none() {
            self.order.push(id);
        }
    }

    /// Adapter by identifier (aliases such as `charbench` accepted)
    pub fn get(&self, id: &str) -> Result<Arc<dyn BenchmarkAdapter>, AdapterError> {
        let kind =
            ToolKind::from_str(id.trim()).map_err(|_| AdapterError::UnknownTool(id.to_string()))?;
        self.get_kind(kind)
    }

    /// Adapter for `kind`
    pub fn get_kind(&self, kind: ToolKind) -> Result<Arc<dyn BenchmarkAdapter>, AdapterError> {
        self.adapters
            .get(kind.id())
            .cloned()
            .ok_or_else(|| AdapterError::UnknownTool(kind.id().to_string()))
    }

    /// Adapters whose tool can target `database`, in registration order
    pub fn supporting(&self, database: DatabaseType) -> Vec<Arc<dyn BenchmarkAdapter>> {
        self.order
            .iter()
            .filter_map(|id| self.adapters.get(id))
            .filter(|a| a.supports(database))
            .cloned()
            .collect()
    }

    /// Registered identifiers, in registration order
    pub fn tool_ids(&self) -> &[&'static str] {
        &self.order
    }

    /// Number of registered adapters
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = AdapterRegistry::builtin();
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.tool_ids(),
            &["sysbench", "hammerdb", "swingbench", "tpcc"]
        );
        assert_eq!(registry.get("sysbench").unwrap().tool(), ToolKind::Sysbench);
        assert_eq!(registry.get("Charbench").unwrap().tool(), ToolKind::Swingbench);
        assert_eq!(registry.get("tpcc-mysql").unwrap().tool(), ToolKind::Tpcc);
    }

    #[test]
    fn test_unknown_tool() {
        let registry = AdapterRegistry::builtin();
        assert!(matches!(
            registry.get("pgbench"),
            Err(AdapterError::UnknownTool(ref id)) if id == "pgbench"
        ));

        let empty = AdapterRegistry::new();
        assert!(empty.is_empty());
        assert!(empty.get_kind(ToolKind::HammerDb).is_err());
    }

    #[test]
    fn test_supporting_database() {
        let registry = AdapterRegistry::builtin();
        let tools = |db| -> Vec<ToolKind> {
            registry.supporting(db).iter().map(|a| a.tool()).collect()
        };
        assert_eq!(
            tools(DatabaseType::MySql),
            vec![ToolKind::Sysbench, ToolKind::HammerDb, ToolKind::Tpcc]
        );
        assert_eq!(
            tools(DatabaseType::Oracle),
            vec![ToolKind::HammerDb, ToolKind::Swingbench]
        );
        assert_eq!(tools(DatabaseType::SqlServer), vec![ToolKind::HammerDb]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = AdapterRegistry::builtin();
        registry.register(Arc::new(SysbenchAdapter));
        assert_eq!(registry.len(), 4);
    }
}
