//! Record type schemas for sn-sync
//!
//! Each remote record type is described by a `RecordTypeSchema`: how its
//! fields map to local files, which scaffolding they receive, and which
//! cross-file coherence rules apply. Per-type behavior is plain data plus
//! attached function pointers, looked up through the `SchemaRegistry` —
//! no type hierarchy.

pub mod builtins;
pub mod fallback;
pub mod registry;
pub mod schema;

pub use fallback::generic_schema;
pub use registry::SchemaRegistry;
pub use schema::{
    CoherenceRule, FieldMapping, RecordTypeSchema, RuleFn, StyleDialect, TextFn,
    ValidationReport, WrapperSpec,
};
