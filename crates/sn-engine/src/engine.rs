//! SyncEngine implementation
//!
//! The engine coordinates the resolver, materializer, validators, and
//! session store into the pull/push lifecycle. Remote update failures and
//! validation failures come back as data on `PushOutcome` so the caller
//! can retry or override; only fetch/resolution/filesystem problems are
//! errors, and those leave no partial bookkeeping behind.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sn_content::{ChangedField, check_style, content_checksum, detect_change, strip_scaffold};
use sn_fs::{NormalizedPath, io};
use sn_schema::{RecordTypeSchema, SchemaRegistry, ValidationReport};
use tracing::{debug, info, warn};

use crate::client::{
    ClientError, RecordClient, RemoteRecord, UpdateOutcome, call_with_timeout, looks_like_sys_id,
};
use crate::error::{Error, Result};
use crate::materialize::Materializer;
use crate::resolver::TypeResolver;
use crate::session::{ArtifactStatus, LocalArtifact, SessionStore};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root of the local artifact tree.
    pub base_dir: NormalizedPath,
    /// Per-remote-call timeout.
    pub call_timeout: Duration,
    /// Overall wall-clock budget for type-resolution probing.
    pub resolve_budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            base_dir: NormalizedPath::new(home.join(".sn-sync")),
            call_timeout: Duration::from_secs(5),
            resolve_budget: Duration::from_secs(30),
        }
    }
}

/// One named validation result (style check, coherence rule, or custom
/// validator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: String,
    pub report: ValidationReport,
}

/// Outcome of a push attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushOutcome {
    /// The remote update succeeded.
    pub pushed: bool,
    /// Nothing differed from the baselines; no remote call was made.
    pub up_to_date: bool,
    /// Validation errors blocked the push (and force was not set).
    pub blocked: bool,
    pub changed_fields: Vec<ChangedField>,
    pub validation: Vec<RuleResult>,
}

impl PushOutcome {
    fn up_to_date() -> Self {
        Self {
            pushed: false,
            up_to_date: true,
            blocked: false,
            changed_fields: Vec::new(),
            validation: Vec::new(),
        }
    }
}

/// The artifact synchronization engine.
///
/// Holds the remote client, the schema registry, and the session store;
/// all state is explicit and caller-provided.
pub struct SyncEngine {
    client: Arc<dyn RecordClient>,
    registry: SchemaRegistry,
    store: SessionStore,
    config: EngineConfig,
}

impl SyncEngine {
    pub fn new(
        client: Arc<dyn RecordClient>,
        registry: SchemaRegistry,
        store: SessionStore,
        config: EngineConfig,
    ) -> Self {
        Self {
            client,
            registry,
            store,
            config,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// All supported `(table, display_name)` pairs.
    pub fn list_supported_types(&self) -> Vec<(String, String)> {
        self.registry.list()
    }

    /// Pull a record into a local artifact directory.
    ///
    /// Resolves the type, fetches the record, materializes its fields,
    /// and registers a `Synced` artifact. Any failure along the way
    /// leaves no session entry behind.
    pub async fn pull(&mut self, id: &str, type_hint: Option<&str>) -> Result<LocalArtifact> {
        let resolver = TypeResolver::new(
            self.client.as_ref(),
            &self.registry,
            self.config.call_timeout,
            self.config.resolve_budget,
        );
        let resolved = resolver.resolve(id, type_hint).await?;
        debug!(id, table = %resolved.schema.table, path = ?resolved.path, "type resolved");

        let record = self.fetch_record(&resolved.schema, id).await?;

        let materializer = Materializer::new(&self.config.base_dir);
        let (dir, files) = materializer.materialize(&resolved.schema, id, &record)?;

        let now = Utc::now();
        let created_at = self.store.get(id).map(|a| a.created_at).unwrap_or(now);
        let artifact = LocalArtifact {
            id: id.to_string(),
            sys_id: record.get_str("sys_id"),
            schema: resolved.schema,
            dir,
            files,
            status: ArtifactStatus::Synced,
            created_at,
            last_synced_at: now,
        };

        info!(id, table = %artifact.schema.table, dir = %artifact.dir, "pulled artifact");
        self.store.register(artifact.clone());
        Ok(artifact)
    }

    /// Push local edits back to the remote record.
    ///
    /// Reads the files from disk, strips scaffolding, diffs against the
    /// baselines, validates, and issues at most one remote update call
    /// carrying only the genuinely changed editable fields.
    pub async fn push(&mut self, id: &str, force: bool) -> Result<PushOutcome> {
        let artifact = self
            .store
            .get(id)
            .ok_or_else(|| Error::ArtifactNotRegistered { id: id.to_string() })?
            .clone();

        let fields = read_stripped_fields(&artifact)?;

        let mut changed = Vec::new();
        for file in &artifact.files {
            if file.pull_only {
                continue;
            }
            let Some(stripped) = fields.get(&file.field) else {
                warn!(id, field = %file.field, "tracked file missing on disk, skipping");
                continue;
            };
            if let Some(change) = detect_change(&file.field, &file.baseline, stripped) {
                changed.push(change);
            }
        }

        if changed.is_empty() {
            info!(id, "no changes detected, nothing to push");
            self.store.set_status(id, ArtifactStatus::Synced);
            return Ok(PushOutcome::up_to_date());
        }

        let mut validation = run_validation(&artifact.schema, &fields, &changed);
        let has_errors = validation.iter().any(|r| !r.report.valid);
        if has_errors {
            if force {
                warn!(id, "validation errors overridden by caller");
                for result in &mut validation {
                    result.report.demote_errors();
                }
            } else {
                self.store.set_status(id, ArtifactStatus::Modified);
                return Ok(PushOutcome {
                    pushed: false,
                    up_to_date: false,
                    blocked: true,
                    changed_fields: changed,
                    validation,
                });
            }
        }

        let mut payload = BTreeMap::new();
        for change in &changed {
            let postprocessor = artifact
                .schema
                .mapping(&change.field)
                .and_then(|m| m.postprocessor);
            let content = match postprocessor {
                Some(f) => f(&change.content),
                None => change.content.clone(),
            };
            payload.insert(change.field.clone(), content);
        }

        let target = artifact.sys_id.as_deref().unwrap_or(id);
        let outcome = call_with_timeout(
            self.config.call_timeout,
            self.client.update_by_id(
                &artifact.schema.table,
                target,
                payload,
                self.config.call_timeout,
            ),
        )
        .await;

        match outcome {
            Ok(UpdateOutcome { success: true, .. }) => {
                let entry = self
                    .store
                    .get_mut(id)
                    .ok_or_else(|| Error::ArtifactNotRegistered { id: id.to_string() })?;
                for change in &changed {
                    if let Some(file) = entry.file_mut(&change.field) {
                        file.baseline = change.content.clone();
                        file.baseline_checksum = content_checksum(&change.content);
                        file.modified = false;
                    }
                }
                entry.status = ArtifactStatus::Synced;
                entry.last_synced_at = Utc::now();
                info!(id, fields = changed.len(), "pushed artifact");
                Ok(PushOutcome {
                    pushed: true,
                    up_to_date: false,
                    blocked: false,
                    changed_fields: changed,
                    validation,
                })
            }
            Ok(UpdateOutcome { error, .. }) => {
                warn!(id, error = ?error, "remote update rejected, keeping edits for retry");
                self.mark_pending(id, &changed);
                Ok(PushOutcome {
                    pushed: false,
                    up_to_date: false,
                    blocked: false,
                    changed_fields: changed,
                    validation,
                })
            }
            Err(e) => {
                warn!(id, error = %e, "remote update failed, keeping edits for retry");
                self.mark_pending(id, &changed);
                Ok(PushOutcome {
                    pushed: false,
                    up_to_date: false,
                    blocked: false,
                    changed_fields: changed,
                    validation,
                })
            }
        }
    }

    /// Run the schema's coherence rules (and custom validator) against
    /// the current on-disk content.
    pub fn validate_coherence(&self, id: &str) -> Result<Vec<RuleResult>> {
        let artifact = self
            .store
            .get(id)
            .ok_or_else(|| Error::ArtifactNotRegistered { id: id.to_string() })?;
        let fields = read_stripped_fields(artifact)?;

        let mut results = Vec::new();
        for rule in &artifact.schema.coherence_rules {
            results.push(RuleResult {
                rule: rule.name.to_string(),
                report: (rule.check)(&fields),
            });
        }
        if let Some(validator) = artifact.schema.validator {
            results.push(RuleResult {
                rule: "custom_validator".to_string(),
                report: validator(&fields),
            });
        }
        Ok(results)
    }

    /// All known artifacts, sorted by identifier.
    pub fn list_artifacts(&self) -> Vec<&LocalArtifact> {
        self.store.list()
    }

    /// The artifact's bookkeeping status as last observed.
    pub fn get_status(&self, id: &str) -> Result<ArtifactStatus> {
        self.store
            .get(id)
            .map(|a| a.status)
            .ok_or_else(|| Error::ArtifactNotRegistered { id: id.to_string() })
    }

    /// Re-read the files from disk and update Synced/Modified bookkeeping
    /// without pushing. PendingUpload is sticky until a push succeeds.
    pub fn refresh_status(&mut self, id: &str) -> Result<ArtifactStatus> {
        let artifact = self
            .store
            .get(id)
            .ok_or_else(|| Error::ArtifactNotRegistered { id: id.to_string() })?;
        let status = compute_status(artifact)?;
        self.store.set_status(id, status);
        Ok(status)
    }

    /// Delete the artifact's directory and session entry.
    ///
    /// Refuses while unsynchronized edits exist unless `force` is set; a
    /// refusal touches neither the filesystem nor the bookkeeping.
    pub fn cleanup(&mut self, id: &str, force: bool) -> Result<()> {
        let artifact = self
            .store
            .get(id)
            .ok_or_else(|| Error::ArtifactNotRegistered { id: id.to_string() })?;

        if !force {
            let status = compute_status(artifact)?;
            if status != ArtifactStatus::Synced {
                return Err(Error::CleanupRefused {
                    id: id.to_string(),
                    status,
                });
            }
        }

        io::remove_dir_all(&artifact.dir)?;
        self.store.remove(id);
        info!(id, "cleaned up artifact");
        Ok(())
    }

    async fn fetch_record(&self, schema: &RecordTypeSchema, id: &str) -> Result<RemoteRecord> {
        let table = &schema.table;
        let map_err = |e: ClientError| match e {
            ClientError::Timeout => Error::RemoteTimeout {
                table: table.clone(),
                id: id.to_string(),
            },
            other => Error::RemoteFailure {
                table: table.clone(),
                id: id.to_string(),
                message: other.to_string(),
            },
        };

        if looks_like_sys_id(id) {
            let record = call_with_timeout(
                self.config.call_timeout,
                self.client.fetch_by_id(table, id, self.config.call_timeout),
            )
            .await
            .map_err(map_err)?;
            record.ok_or_else(|| Error::RecordMissing {
                table: table.clone(),
                id: id.to_string(),
            })
        } else {
            let filter = format!("{}={}", schema.identifier_field, id);
            let mut records = call_with_timeout(
                self.config.call_timeout,
                self.client
                    .query_by_filter(table, &filter, 1, self.config.call_timeout),
            )
            .await
            .map_err(map_err)?;
            if records.is_empty() {
                Err(Error::RecordMissing {
                    table: table.clone(),
                    id: id.to_string(),
                })
            } else {
                Ok(records.remove(0))
            }
        }
    }

    fn mark_pending(&mut self, id: &str, changed: &[ChangedField]) {
        if let Some(entry) = self.store.get_mut(id) {
            for change in changed {
                if let Some(file) = entry.file_mut(&change.field) {
                    file.modified = true;
                }
            }
            entry.status = ArtifactStatus::PendingUpload;
        }
    }
}

/// Current on-disk content per field, scaffold-stripped. Files deleted
/// locally are simply absent from the map.
fn read_stripped_fields(artifact: &LocalArtifact) -> Result<BTreeMap<String, String>> {
    let mut fields = BTreeMap::new();
    for file in &artifact.files {
        if !file.path.is_file() {
            continue;
        }
        let raw = io::read_text(&file.path)?;
        let wrapper = artifact
            .schema
            .mapping(&file.field)
            .and_then(|m| m.wrapper.as_ref());
        fields.insert(file.field.clone(), strip_scaffold(&raw, wrapper));
    }
    Ok(fields)
}

fn compute_status(artifact: &LocalArtifact) -> Result<ArtifactStatus> {
    if artifact.status == ArtifactStatus::PendingUpload {
        return Ok(ArtifactStatus::PendingUpload);
    }
    let fields = read_stripped_fields(artifact)?;
    for file in &artifact.files {
        if file.pull_only {
            continue;
        }
        if let Some(stripped) = fields.get(&file.field)
            && content_checksum(stripped) != file.baseline_checksum
        {
            return Ok(ArtifactStatus::Modified);
        }
    }
    Ok(ArtifactStatus::Synced)
}

/// Style checks for the changed fields, then the schema's coherence
/// rules and custom validator over the full field map.
fn run_validation(
    schema: &RecordTypeSchema,
    fields: &BTreeMap<String, String>,
    changed: &[ChangedField],
) -> Vec<RuleResult> {
    let mut results = Vec::new();

    for change in changed {
        if let Some(dialect) = schema.mapping(&change.field).and_then(|m| m.style) {
            results.push(RuleResult {
                rule: format!("style:{}", change.field),
                report: check_style(&change.content, dialect),
            });
        }
    }

    for rule in &schema.coherence_rules {
        results.push(RuleResult {
            rule: rule.name.to_string(),
            report: (rule.check)(fields),
        });
    }

    if let Some(validator) = schema.validator {
        results.push(RuleResult {
            rule: "custom_validator".to_string(),
            report: validator(fields),
        });
    }

    results
}
