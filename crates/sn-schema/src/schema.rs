//! Schema types: field mappings, wrapper specs, coherence rules

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Transformation applied to field text while materializing (preprocessor)
/// or before writing back (postprocessor).
pub type TextFn = fn(&str) -> String;

/// A coherence or custom-validator check over a map of
/// field name → scaffold-stripped content.
pub type RuleFn = fn(&BTreeMap<String, String>) -> ValidationReport;

/// Style dialect a field's content must conform to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleDialect {
    /// Server-side scripts restricted to the legacy ES5 runtime.
    LegacyEs5,
}

/// Scaffold header/footer injected around short, unstructured content,
/// plus the signal tokens whose presence suppresses injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperSpec {
    pub header: &'static str,
    pub footer: &'static str,
    /// Content containing any of these is considered already structured.
    pub signal_tokens: &'static [&'static str],
}

impl WrapperSpec {
    pub const fn new(
        header: &'static str,
        footer: &'static str,
        signal_tokens: &'static [&'static str],
    ) -> Self {
        Self {
            header,
            footer,
            signal_tokens,
        }
    }
}

/// How one remote field maps to one local file.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    /// Remote field name (e.g. "script").
    pub field: String,
    /// Local filename template; `{attr}` placeholders are substituted
    /// from record attributes and sanitized.
    pub file_template: String,
    /// Record must carry this field for the pull to succeed.
    pub required: bool,
    /// Scaffold injected around minimal content, if any.
    pub wrapper: Option<WrapperSpec>,
    /// Applied to the raw remote value when materializing.
    pub preprocessor: Option<TextFn>,
    /// Applied to the stripped local content before writing back.
    pub postprocessor: Option<TextFn>,
    /// Style dialect enforced on push, if any.
    pub style: Option<StyleDialect>,
    /// Synthetic or read-only fields never enter push payloads.
    pub pull_only: bool,
}

impl FieldMapping {
    pub fn new(field: impl Into<String>, file_template: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            file_template: file_template.into(),
            required: false,
            wrapper: None,
            preprocessor: None,
            postprocessor: None,
            style: None,
            pull_only: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_wrapper(mut self, wrapper: WrapperSpec) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    pub fn with_preprocessor(mut self, f: TextFn) -> Self {
        self.preprocessor = Some(f);
        self
    }

    pub fn with_postprocessor(mut self, f: TextFn) -> Self {
        self.postprocessor = Some(f);
        self
    }

    pub fn with_style(mut self, style: StyleDialect) -> Self {
        self.style = Some(style);
        self
    }

    pub fn pull_only(mut self) -> Self {
        self.pull_only = true;
        self
    }
}

/// A cross-file invariant declared by a schema.
#[derive(Debug, Clone)]
pub struct CoherenceRule {
    /// Machine name (e.g. "template_bindings").
    pub name: &'static str,
    /// Human-readable description, surfaced in the generated docs file.
    pub description: &'static str,
    pub check: RuleFn,
}

impl CoherenceRule {
    pub const fn new(name: &'static str, description: &'static str, check: RuleFn) -> Self {
        Self {
            name,
            description,
            check,
        }
    }
}

/// Declarative description of one remote record type.
#[derive(Debug, Clone)]
pub struct RecordTypeSchema {
    /// Remote table name, the type key (e.g. "sp_widget").
    pub table: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Local folder name under the sync base directory.
    pub folder: String,
    /// Record field holding the human identifier (usually "name").
    pub identifier_field: String,
    /// Ordered field mappings; materialization follows this order.
    pub mappings: Vec<FieldMapping>,
    /// Cross-file invariants checked before push.
    pub coherence_rules: Vec<CoherenceRule>,
    /// Optional per-type custom validator.
    pub validator: Option<RuleFn>,
}

impl RecordTypeSchema {
    pub fn new(
        table: impl Into<String>,
        display_name: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            display_name: display_name.into(),
            folder: folder.into(),
            identifier_field: "name".into(),
            mappings: Vec::new(),
            coherence_rules: Vec::new(),
            validator: None,
        }
    }

    pub fn with_identifier_field(mut self, field: impl Into<String>) -> Self {
        self.identifier_field = field.into();
        self
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn with_rule(mut self, rule: CoherenceRule) -> Self {
        self.coherence_rules.push(rule);
        self
    }

    pub fn with_validator(mut self, validator: RuleFn) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Look up a mapping by remote field name.
    pub fn mapping(&self, field: &str) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.field == field)
    }

    /// Mappings that participate in push payloads.
    pub fn editable_mappings(&self) -> impl Iterator<Item = &FieldMapping> {
        self.mappings.iter().filter(|m| !m.pull_only)
    }
}

/// Outcome of a style check, coherence rule, or custom validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub hints: Vec<String>,
}

impl ValidationReport {
    /// A passing report.
    pub fn ok() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }

    /// A failing report with a single error and remediation hint.
    pub fn error(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![message.into()],
            warnings: Vec::new(),
            hints: vec![hint.into()],
        }
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn push_hint(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    /// Merge another report into this one; any error invalidates the whole.
    pub fn merge(&mut self, other: ValidationReport) {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.hints.extend(other.hints);
    }

    /// Demote all errors to warnings, e.g. when the caller forces a push.
    pub fn demote_errors(&mut self) {
        self.warnings.append(&mut self.errors);
        self.valid = true;
    }
}
