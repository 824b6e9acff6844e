//! Artifact synchronization engine for sn-sync
//!
//! Maps multi-field remote records to multi-file local directories and
//! synchronizes validated edits back. The remote transport is an external
//! collaborator behind the [`RecordClient`] trait; this crate owns type
//! resolution, materialization, change detection, validation dispatch,
//! and session bookkeeping.
//!
//! Concurrency contract: distinct artifacts may be processed concurrently
//! by the caller, but pull and push on the *same* identifier must be
//! serialized by the caller; the engine takes `&mut self` and provides no
//! internal locking.

pub mod client;
pub mod engine;
pub mod error;
pub mod logging;
pub mod materialize;
pub mod resolver;
pub mod session;

pub use client::{ClientError, ClientResult, RecordClient, RemoteRecord, UpdateOutcome};
pub use engine::{EngineConfig, PushOutcome, RuleResult, SyncEngine};
pub use error::{Error, Result};
pub use resolver::{ResolutionPath, ResolvedType, TypeResolver};
pub use session::{ArtifactStatus, LocalArtifact, LocalFile, SessionStore};
