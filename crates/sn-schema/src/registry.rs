//! Schema registry storage

use std::collections::HashMap;

use crate::schema::RecordTypeSchema;

/// One registered type: the schema plus its probe priority.
#[derive(Debug, Clone)]
struct SchemaEntry {
    /// Probe priority (lower = probed earlier; most common types first).
    priority: u8,
    schema: RecordTypeSchema,
}

/// Central catalog of record type schemas.
///
/// Provides lookup by table name, sorted listing, and the
/// priority-ordered probe sequence used by type resolution.
pub struct SchemaRegistry {
    entries: HashMap<String, SchemaEntry>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with all built-in type schemas.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (schema, priority) in crate::builtins::builtin_schemas() {
            registry.register(schema, priority);
        }
        registry
    }

    /// Register a schema under its table name.
    pub fn register(&mut self, schema: RecordTypeSchema, priority: u8) {
        self.entries
            .insert(schema.table.clone(), SchemaEntry { priority, schema });
    }

    /// Get a schema by table name.
    pub fn get(&self, table: &str) -> Option<&RecordTypeSchema> {
        self.entries.get(table).map(|e| &e.schema)
    }

    /// Check if a table is registered.
    pub fn contains(&self, table: &str) -> bool {
        self.entries.contains_key(table)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All `(table, display_name)` pairs, sorted by table.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut types: Vec<_> = self
            .entries
            .values()
            .map(|e| (e.schema.table.clone(), e.schema.display_name.clone()))
            .collect();
        types.sort();
        types
    }

    /// Schemas in probe order: ascending priority, table name as tiebreak.
    pub fn probe_order(&self) -> Vec<&RecordTypeSchema> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.schema.table.cmp(&b.schema.table))
        });
        entries.into_iter().map(|e| &e.schema).collect()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
