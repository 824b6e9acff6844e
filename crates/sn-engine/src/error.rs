//! Error types for sn-engine
//!
//! Every variant carries a human-actionable remediation hint in its
//! message. Validation failures and remote-update failures are *not*
//! errors; they come back as data on `PushOutcome` so the caller can
//! decide whether to override or retry.

use crate::session::ArtifactStatus;

/// Result type for sn-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sn-engine operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Type resolution exhausted its budget with no match
    #[error(
        "Could not determine the record type for {id:?} within the probing budget. \
         Specify the type explicitly with a type hint."
    )]
    TypeNotFound { id: String },

    /// Explicit hint given but no schema matches and no fallback applies
    #[error(
        "No schema registered for type {table:?} and no generic fallback applies. \
         Check the table name spelling."
    )]
    UnsupportedType { table: String },

    /// A remote call exceeded its per-call timeout
    #[error(
        "Remote call for {table}/{id} timed out. \
         Check instance connectivity or raise the call timeout."
    )]
    RemoteTimeout { table: String, id: String },

    /// The remote fetch itself failed
    #[error(
        "Remote fetch for {table}/{id} failed: {message}. \
         Check credentials and field-level read permissions."
    )]
    RemoteFailure {
        table: String,
        id: String,
        message: String,
    },

    /// The record does not exist remotely
    #[error("No record {id:?} found in {table}. Check the identifier or pass a different type hint.")]
    RecordMissing { table: String, id: String },

    /// The fetched record lacks a field the schema marks required
    #[error(
        "Record is missing required field {field:?} for type {table}. \
         Verify the record and field-level read permissions."
    )]
    MissingRequiredField { table: String, field: String },

    /// Operation on an identifier with no session entry
    #[error("No local artifact registered for {id:?}. Pull it first.")]
    ArtifactNotRegistered { id: String },

    /// Cleanup would discard unsynchronized local state
    #[error(
        "Refusing to clean up {id:?} while status is {status}; \
         push the changes first or pass force to discard them."
    )]
    CleanupRefused { id: String, status: ArtifactStatus },

    /// Filesystem error from sn-fs
    #[error(transparent)]
    Fs(#[from] sn_fs::Error),
}
