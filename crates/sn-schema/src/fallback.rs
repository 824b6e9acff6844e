//! Generic fallback configuration for unregistered record types
//!
//! When type resolution cannot match a registered schema, a short list of
//! custom candidate tables is probed and a generic schema is synthesized
//! from a fixed allow-list of common script-like fields. Both lists are
//! configuration data, not engine logic.

use crate::builtins::SERVER_SCRIPT_WRAPPER;
use crate::schema::{FieldMapping, RecordTypeSchema};

/// Unregistered tables probed as a last resort, in order.
pub const CUSTOM_TABLE_CANDIDATES: &[&str] = &["sys_script_fix", "u_custom_script"];

/// Field names recognized on unregistered types, with file extensions.
/// All are optional; materialization simply skips absent fields.
pub const GENERIC_FIELDS: &[(&str, &str)] = &[
    ("script", "js"),
    ("template", "html"),
    ("html", "html"),
    ("css", "css"),
    ("condition", "txt"),
    ("description", "md"),
];

/// Synthesize a generic schema for an unregistered table.
pub fn generic_schema(table: &str) -> RecordTypeSchema {
    let mut schema = RecordTypeSchema::new(
        table,
        format!("Custom Type ({table})"),
        format!("custom/{table}"),
    );
    for (field, extension) in GENERIC_FIELDS {
        let mut mapping = FieldMapping::new(*field, format!("{{name}}.{extension}"));
        if *field == "script" {
            mapping = mapping.with_wrapper(SERVER_SCRIPT_WRAPPER);
        }
        schema = schema.with_mapping(mapping);
    }
    schema
}
