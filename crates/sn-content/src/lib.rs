//! Content plumbing for sn-sync
//!
//! The pieces that make round-trips safe: the conservative wrapper
//! heuristic, repeat-until-stable scaffold stripping, checksum-based
//! change detection, and style validation.

pub mod diff;
pub mod strip;
pub mod validate;
pub mod wrapper;

pub use diff::{ChangedField, content_checksum, detect_change};
pub use strip::strip_scaffold;
pub use validate::check_style;
pub use wrapper::{WRAP_THRESHOLD, apply_wrapper, needs_wrapper};
