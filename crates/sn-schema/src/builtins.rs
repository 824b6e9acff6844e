//! Built-in record type schemas - SINGLE SOURCE OF TRUTH
//!
//! All built-in type definitions live here, as inert configuration:
//! field mappings, wrapper scaffolds, style flags, coherence rules, and
//! the probe priorities used by type resolution. Engine logic never
//! branches on table names; it only interprets this data.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::schema::{
    CoherenceRule, FieldMapping, RecordTypeSchema, StyleDialect, ValidationReport, WrapperSpec,
};

/// Number of built-in record types.
pub const BUILTIN_COUNT: usize = 10;

/// Scaffold for server-side scripts: the classic IIFE shell.
pub const SERVER_SCRIPT_WRAPPER: WrapperSpec = WrapperSpec::new(
    "(function() {",
    "})();",
    &["gs.", "data.", "$sp.", "current."],
);

/// Scaffold for widget client controllers.
pub const CLIENT_SCRIPT_WRAPPER: WrapperSpec = WrapperSpec::new(
    "api.controller = function(api) {",
    "};",
    &["api.", "$scope", "angular.", "g_form."],
);

/// Scaffold for markup templates.
pub const TEMPLATE_WRAPPER: WrapperSpec = WrapperSpec::new("<div>", "</div>", &["<", "{{"]);

static TEMPLATE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*:{0,2}\s*data\.([A-Za-z0-9_]+)").unwrap());

static DATA_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data(?:\.([A-Za-z0-9_]+)|\[\s*['"]([A-Za-z0-9_]+)['"]\s*\])\s*="#).unwrap()
});

/// Every `{{data.x}}` placeholder in the template must have a matching
/// `data.x = ...` assignment in the server script.
fn check_template_bindings(fields: &BTreeMap<String, String>) -> ValidationReport {
    let template = fields.get("template").map(String::as_str).unwrap_or("");
    let script = fields.get("script").map(String::as_str).unwrap_or("");

    let mut assigned: Vec<&str> = Vec::new();
    for cap in DATA_ASSIGNMENT.captures_iter(script) {
        if let Some(name) = cap.get(1).or_else(|| cap.get(2)) {
            assigned.push(name.as_str());
        }
    }

    let mut report = ValidationReport::ok();
    let mut reported: Vec<&str> = Vec::new();
    for cap in TEMPLATE_PLACEHOLDER.captures_iter(template) {
        let placeholder = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        if !assigned.contains(&placeholder) && !reported.contains(&placeholder) {
            reported.push(placeholder);
            report.push_error(format!(
                "template references {{{{data.{placeholder}}}}} but the server script never assigns data.{placeholder}"
            ));
            report.push_hint(format!(
                "add `data.{placeholder} = ...;` to the server script"
            ));
        }
    }
    report
}

/// The widget option schema, when present, must be a JSON array.
fn check_option_schema(fields: &BTreeMap<String, String>) -> ValidationReport {
    let Some(raw) = fields.get("option_schema") else {
        return ValidationReport::ok();
    };
    if raw.trim().is_empty() {
        return ValidationReport::ok();
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) if value.is_array() => ValidationReport::ok(),
        Ok(_) => ValidationReport::error(
            "option_schema must be a JSON array of option descriptors",
            "wrap the option descriptors in `[ ... ]`",
        ),
        Err(e) => ValidationReport::error(
            format!("option_schema is not valid JSON: {e}"),
            "fix the JSON syntax in the .options.json file",
        ),
    }
}

/// Script includes are expected to define a callable shape.
fn validate_script_include(fields: &BTreeMap<String, String>) -> ValidationReport {
    let script = fields.get("script").map(String::as_str).unwrap_or("");
    let mut report = ValidationReport::ok();
    if !script.is_empty() && !script.contains("Class.create") && !script.contains("function") {
        report.push_warning(
            "script include defines neither Class.create() nor a function".to_string(),
        );
        report.push_hint("script includes are usually `var Name = Class.create(); ...`".to_string());
    }
    report
}

fn pretty_json(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}

fn compact_json(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}

/// Returns all built-in schemas with their probe priorities
/// (lower = probed earlier during type resolution).
pub fn builtin_schemas() -> Vec<(RecordTypeSchema, u8)> {
    vec![
        (
            RecordTypeSchema::new("sp_widget", "Service Portal Widget", "widgets")
                .with_mapping(
                    FieldMapping::new("template", "{name}.html")
                        .required()
                        .with_wrapper(TEMPLATE_WRAPPER),
                )
                .with_mapping(
                    FieldMapping::new("script", "{name}.server.js")
                        .required()
                        .with_wrapper(SERVER_SCRIPT_WRAPPER)
                        .with_style(StyleDialect::LegacyEs5),
                )
                .with_mapping(
                    FieldMapping::new("client_script", "{name}.client.js")
                        .with_wrapper(CLIENT_SCRIPT_WRAPPER),
                )
                .with_mapping(FieldMapping::new("css", "{name}.scss"))
                .with_mapping(
                    FieldMapping::new("option_schema", "{name}.options.json")
                        .with_preprocessor(pretty_json)
                        .with_postprocessor(compact_json),
                )
                .with_mapping(
                    FieldMapping::new("demo_data", "{name}.demo.json")
                        .pull_only()
                        .with_preprocessor(pretty_json),
                )
                .with_rule(CoherenceRule::new(
                    "template_bindings",
                    "every {{data.x}} placeholder in the template has a data.x assignment in the server script",
                    check_template_bindings,
                ))
                .with_rule(CoherenceRule::new(
                    "option_schema_json",
                    "the option schema, when present, is a JSON array",
                    check_option_schema,
                )),
            10,
        ),
        (
            RecordTypeSchema::new("sys_script_include", "Script Include", "script_includes")
                .with_mapping(
                    FieldMapping::new("script", "{name}.js")
                        .required()
                        .with_wrapper(SERVER_SCRIPT_WRAPPER)
                        .with_style(StyleDialect::LegacyEs5),
                )
                .with_validator(validate_script_include),
            20,
        ),
        (
            RecordTypeSchema::new("sys_script", "Business Rule", "business_rules")
                .with_mapping(
                    FieldMapping::new("script", "{name}.js")
                        .required()
                        .with_wrapper(SERVER_SCRIPT_WRAPPER)
                        .with_style(StyleDialect::LegacyEs5),
                )
                .with_mapping(FieldMapping::new("condition", "{name}.condition.txt")),
            30,
        ),
        (
            RecordTypeSchema::new("sys_script_client", "Client Script", "client_scripts")
                .with_mapping(
                    FieldMapping::new("script", "{name}.js")
                        .required()
                        .with_wrapper(CLIENT_SCRIPT_WRAPPER),
                ),
            40,
        ),
        (
            RecordTypeSchema::new("sys_ui_page", "UI Page", "ui_pages")
                .with_mapping(
                    FieldMapping::new("html", "{name}.xhtml")
                        .required()
                        .with_wrapper(TEMPLATE_WRAPPER),
                )
                .with_mapping(FieldMapping::new("client_script", "{name}.client.js"))
                .with_mapping(
                    FieldMapping::new("processing_script", "{name}.server.js")
                        .with_wrapper(SERVER_SCRIPT_WRAPPER)
                        .with_style(StyleDialect::LegacyEs5),
                ),
            50,
        ),
        (
            RecordTypeSchema::new("sys_ui_script", "UI Script", "ui_scripts")
                .with_mapping(FieldMapping::new("script", "{name}.js").required()),
            60,
        ),
        (
            RecordTypeSchema::new("sys_ws_operation", "Scripted REST Operation", "rest_operations")
                .with_mapping(
                    FieldMapping::new("operation_script", "{name}.js")
                        .required()
                        .with_wrapper(SERVER_SCRIPT_WRAPPER)
                        .with_style(StyleDialect::LegacyEs5),
                ),
            70,
        ),
        (
            RecordTypeSchema::new("sys_processor", "Processor", "processors")
                .with_mapping(
                    FieldMapping::new("script", "{name}.js")
                        .required()
                        .with_wrapper(SERVER_SCRIPT_WRAPPER)
                        .with_style(StyleDialect::LegacyEs5),
                ),
            80,
        ),
        (
            RecordTypeSchema::new("sys_ui_action", "UI Action", "ui_actions")
                .with_mapping(
                    FieldMapping::new("script", "{name}.js")
                        .required()
                        .with_wrapper(SERVER_SCRIPT_WRAPPER)
                        .with_style(StyleDialect::LegacyEs5),
                )
                .with_mapping(FieldMapping::new("condition", "{name}.condition.txt")),
            90,
        ),
        (
            RecordTypeSchema::new("sys_transform_map", "Transform Map", "transform_maps")
                .with_mapping(
                    FieldMapping::new("script", "{name}.js")
                        .with_wrapper(SERVER_SCRIPT_WRAPPER)
                        .with_style(StyleDialect::LegacyEs5),
                ),
            100,
        ),
    ]
}
