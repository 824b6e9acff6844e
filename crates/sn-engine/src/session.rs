//! In-memory session bookkeeping for pulled artifacts
//!
//! The store is an explicit object constructed once and handed to the
//! engine, so lifetime and test isolation stay caller-controlled. Nothing
//! here is persisted: a process restart loses the map while local files
//! remain on disk, and a re-pull rebuilds baselines from the freshly
//! fetched remote values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sn_fs::NormalizedPath;
use sn_schema::RecordTypeSchema;

/// Lifecycle status of a local artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Local files match the last-synced remote state.
    Synced,
    /// At least one file's stripped content differs from its baseline.
    Modified,
    /// A push reached the remote but the update failed; edits are
    /// preserved locally for retry.
    PendingUpload,
}

impl std::fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Synced => "synced",
            Self::Modified => "modified",
            Self::PendingUpload => "pending_upload",
        };
        write!(f, "{s}")
    }
}

/// One materialized file of an artifact.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub file_name: String,
    pub path: NormalizedPath,
    /// Remote field this file materializes.
    pub field: String,
    /// Scaffold-free content as of the last successful sync.
    pub baseline: String,
    /// SHA-256 of the baseline.
    pub baseline_checksum: String,
    pub modified: bool,
    /// A file already existed at this path before the pull.
    pub existed_before_pull: bool,
    /// Snapshot of any pre-existing content, kept for overwrite auditing.
    pub preexisting_snapshot: Option<String>,
    /// Synthetic or read-only fields never enter push payloads.
    pub pull_only: bool,
}

/// A remote record materialized as a local directory of files.
#[derive(Debug, Clone)]
pub struct LocalArtifact {
    /// Identifier the artifact was pulled with.
    pub id: String,
    /// Resolved type schema (kept on the artifact so generic fallback
    /// types survive without a registry entry).
    pub schema: RecordTypeSchema,
    /// Unique remote id, when known (may equal `id`).
    pub sys_id: Option<String>,
    pub dir: NormalizedPath,
    pub files: Vec<LocalFile>,
    pub status: ArtifactStatus,
    pub created_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
}

impl LocalArtifact {
    pub fn table(&self) -> &str {
        &self.schema.table
    }

    pub fn file(&self, field: &str) -> Option<&LocalFile> {
        self.files.iter().find(|f| f.field == field)
    }

    pub fn file_mut(&mut self, field: &str) -> Option<&mut LocalFile> {
        self.files.iter_mut().find(|f| f.field == field)
    }
}

/// In-memory map from identifier to local artifact.
pub struct SessionStore {
    artifacts: HashMap<String, LocalArtifact>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            artifacts: HashMap::new(),
        }
    }

    /// Register an artifact, replacing any previous entry for the id.
    pub fn register(&mut self, artifact: LocalArtifact) {
        self.artifacts.insert(artifact.id.clone(), artifact);
    }

    pub fn get(&self, id: &str) -> Option<&LocalArtifact> {
        self.artifacts.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut LocalArtifact> {
        self.artifacts.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.artifacts.contains_key(id)
    }

    /// All artifacts, sorted by identifier.
    pub fn list(&self) -> Vec<&LocalArtifact> {
        let mut artifacts: Vec<_> = self.artifacts.values().collect();
        artifacts.sort_by(|a, b| a.id.cmp(&b.id));
        artifacts
    }

    /// Update an artifact's status. Returns false if the id is unknown.
    pub fn set_status(&mut self, id: &str, status: ArtifactStatus) -> bool {
        match self.artifacts.get_mut(id) {
            Some(artifact) => {
                artifact.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<LocalArtifact> {
        self.artifacts.remove(id)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
