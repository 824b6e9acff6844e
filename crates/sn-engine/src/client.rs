//! Remote record client seam
//!
//! The transport/auth layer is an external collaborator. This module
//! defines the async trait the engine consumes, the loosely-typed record
//! payload, and the timeout guard wrapped around every remote call.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Result type for remote client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by a remote record client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("remote call timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("permission denied: {0}")]
    Denied(String),
}

/// A fetched remote record: a flat map of field name to JSON value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteRecord {
    fields: Map<String, Value>,
}

impl RemoteRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object; non-objects yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Set a field value (builder style, used heavily by mocks and tests).
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field value as text: strings come back as-is, other scalars are
    /// rendered, null and absent are `None`.
    pub fn get_str(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn has(&self, field: &str) -> bool {
        matches!(self.fields.get(field), Some(v) if !v.is_null())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Result of a remote update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl UpdateOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Async interface to the remote record store.
///
/// Every operation takes a caller-specified timeout; implementations may
/// honor it themselves, and the engine additionally guards each call with
/// [`call_with_timeout`].
#[async_trait]
pub trait RecordClient: Send + Sync {
    /// Fetch a single record by its unique identifier, or `None` if absent.
    async fn fetch_by_id(
        &self,
        table: &str,
        id: &str,
        timeout: Duration,
    ) -> ClientResult<Option<RemoteRecord>>;

    /// Query up to `limit` records matching an encoded filter expression.
    async fn query_by_filter(
        &self,
        table: &str,
        filter: &str,
        limit: usize,
        timeout: Duration,
    ) -> ClientResult<Vec<RemoteRecord>>;

    /// Update fields of a record by its unique identifier.
    async fn update_by_id(
        &self,
        table: &str,
        id: &str,
        fields: BTreeMap<String, String>,
        timeout: Duration,
    ) -> ClientResult<UpdateOutcome>;
}

/// Bound a remote call by wall-clock time.
///
/// This is the engine's only cancellation mechanism: there is no
/// cooperative cancel signal, just per-call timeouts.
pub async fn call_with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = ClientResult<T>>,
) -> ClientResult<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout),
    }
}

/// Whether an identifier looks like a remote unique id (32 hex chars)
/// rather than a display name.
pub fn looks_like_sys_id(id: &str) -> bool {
    id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit())
}
