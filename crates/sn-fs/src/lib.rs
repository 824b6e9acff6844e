//! Filesystem layer for sn-sync
//!
//! Normalized path handling, atomic writes with advisory locking, and
//! deterministic sanitization of remote identifiers into directory names.

pub mod error;
pub mod io;
pub mod path;
pub mod sanitize;

pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use sanitize::sanitize_identifier;
