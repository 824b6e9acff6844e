//! Field materialization: remote record values to local files
//!
//! Writes are idempotent: a file is only touched when its final content
//! actually differs, so repeated pulls cause no churn and never flip an
//! untouched file into a false "modified" state. Whatever existed at a
//! path before the first pull is snapshotted for overwrite auditing.

use sn_content::{apply_wrapper, content_checksum, needs_wrapper, strip_scaffold};
use sn_fs::{NormalizedPath, io, sanitize_identifier};
use sn_schema::RecordTypeSchema;
use tracing::debug;

use crate::client::RemoteRecord;
use crate::error::{Error, Result};
use crate::session::LocalFile;

/// Generated documentation file, written alongside the field files.
/// Never mapped to a remote field, never pushed.
pub const DOC_FILE_NAME: &str = "ARTIFACT.md";

/// Materializes records into a directory tree under a base path.
pub struct Materializer<'a> {
    base_dir: &'a NormalizedPath,
}

impl<'a> Materializer<'a> {
    pub fn new(base_dir: &'a NormalizedPath) -> Self {
        Self { base_dir }
    }

    /// The deterministic directory for an artifact: base / schema folder /
    /// sanitized identifier.
    pub fn artifact_dir(&self, schema: &RecordTypeSchema, identifier: &str) -> Result<NormalizedPath> {
        let segment = sanitize_identifier(identifier)?;
        Ok(self.base_dir.join(&schema.folder).join(&segment))
    }

    /// Materialize all populated field mappings of `record` into the
    /// artifact directory, returning the tracked files.
    pub fn materialize(
        &self,
        schema: &RecordTypeSchema,
        id: &str,
        record: &RemoteRecord,
    ) -> Result<(NormalizedPath, Vec<LocalFile>)> {
        let identifier = record
            .get_str(&schema.identifier_field)
            .unwrap_or_else(|| id.to_string());
        let dir = self.artifact_dir(schema, &identifier)?;

        let mut files = Vec::new();
        for mapping in &schema.mappings {
            let raw = match record.get_str(&mapping.field) {
                Some(raw) => raw,
                None if mapping.required => {
                    return Err(Error::MissingRequiredField {
                        table: schema.table.clone(),
                        field: mapping.field.clone(),
                    });
                }
                None => continue,
            };

            let preprocessed = match mapping.preprocessor {
                Some(f) => f(&raw),
                None => raw,
            };

            // Baseline is always scaffold-free, whatever we end up writing.
            let baseline = strip_scaffold(&preprocessed, mapping.wrapper.as_ref());

            let content = match &mapping.wrapper {
                Some(spec) if needs_wrapper(&preprocessed, spec) => {
                    apply_wrapper(&preprocessed, spec)
                }
                _ => preprocessed,
            };

            let file_name = resolve_template(&mapping.file_template, record, &identifier)?;
            let path = dir.join(&file_name);

            let existed_before_pull = path.is_file();
            let preexisting_snapshot = if existed_before_pull {
                Some(io::read_text(&path)?)
            } else {
                None
            };

            if preexisting_snapshot.as_deref() == Some(content.as_str()) {
                debug!(field = %mapping.field, %path, "content unchanged, skipping write");
            } else {
                io::write_text(&path, &content)?;
            }

            files.push(LocalFile {
                file_name,
                path,
                field: mapping.field.clone(),
                baseline_checksum: content_checksum(&baseline),
                baseline,
                modified: false,
                existed_before_pull,
                preexisting_snapshot,
                pull_only: mapping.pull_only,
            });
        }

        self.write_docs(schema, &identifier, &dir, &files)?;

        Ok((dir, files))
    }

    /// Generated orientation file: what each file is, which fields push
    /// back, and which cross-file invariants apply.
    fn write_docs(
        &self,
        schema: &RecordTypeSchema,
        identifier: &str,
        dir: &NormalizedPath,
        files: &[LocalFile],
    ) -> Result<()> {
        let content = render_docs(schema, identifier, files);
        let path = dir.join(DOC_FILE_NAME);
        let existing = if path.is_file() {
            Some(io::read_text(&path)?)
        } else {
            None
        };
        if existing.as_deref() != Some(content.as_str()) {
            io::write_text(&path, &content)?;
        }
        Ok(())
    }
}

fn render_docs(schema: &RecordTypeSchema, identifier: &str, files: &[LocalFile]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {} — {}\n\n", schema.display_name, identifier));
    out.push_str(&format!(
        "Synchronized from remote type `{}`. Edit the files below and push; \
         this file is generated and never uploaded.\n\n",
        schema.table
    ));

    out.push_str("| File | Source field | Pushed back |\n|---|---|---|\n");
    for file in files {
        out.push_str(&format!(
            "| `{}` | `{}` | {} |\n",
            file.file_name,
            file.field,
            if file.pull_only { "no" } else { "yes" }
        ));
    }

    if !schema.coherence_rules.is_empty() {
        out.push_str("\n## Coherence rules\n\n");
        for rule in &schema.coherence_rules {
            out.push_str(&format!("- **{}**: {}\n", rule.name, rule.description));
        }
    }
    out
}

/// Substitute `{attr}` placeholders from record attributes; unresolvable
/// attributes fall back to the artifact identifier. Substituted values
/// are sanitized so templates always yield safe file names.
fn resolve_template(template: &str, record: &RemoteRecord, fallback: &str) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let attr = &rest[start + 1..start + len];
        let value = record
            .get_str(attr)
            .unwrap_or_else(|| fallback.to_string());
        out.push_str(&sanitize_identifier(&value)?);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
