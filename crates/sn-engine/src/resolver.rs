//! Type resolution for bare identifiers
//!
//! Resolution order: explicit hint, one direct metadata lookup, a
//! priority-ordered probe of registered types, then the custom-table
//! fallback. Probing is strictly sequential and time-boxed: the elapsed
//! wall clock is checked before every probe, and the loop aborts once the
//! budget is spent regardless of remaining candidates — bounded latency
//! over completeness.

use std::time::{Duration, Instant};

use sn_schema::{RecordTypeSchema, SchemaRegistry, fallback, generic_schema};
use tracing::{debug, warn};

use crate::client::{RecordClient, call_with_timeout, looks_like_sys_id};
use crate::error::{Error, Result};

/// Metadata table consulted for the direct class-name lookup.
const METADATA_TABLE: &str = "sys_metadata";

/// How a type was resolved; probes are observable for testing the
/// short-circuit paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
    /// Explicit hint matched a registered schema.
    Hint,
    /// Explicit hint, satisfied by the generic fallback schema.
    HintFallback,
    /// Direct metadata lookup answered before any probe ran.
    Metadata,
    /// Found by probing registered types in priority order.
    Probe,
    /// Found by probing the unregistered custom-table candidates.
    CustomFallback,
}

/// Outcome of type resolution.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub schema: RecordTypeSchema,
    pub path: ResolutionPath,
    /// Number of existence probes issued.
    pub probes: usize,
}

/// Resolves an identifier (and optional hint) to a type schema.
pub struct TypeResolver<'a> {
    client: &'a dyn RecordClient,
    registry: &'a SchemaRegistry,
    call_timeout: Duration,
    budget: Duration,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        client: &'a dyn RecordClient,
        registry: &'a SchemaRegistry,
        call_timeout: Duration,
        budget: Duration,
    ) -> Self {
        Self {
            client,
            registry,
            call_timeout,
            budget,
        }
    }

    /// Resolve `id` to a schema.
    pub async fn resolve(&self, id: &str, hint: Option<&str>) -> Result<ResolvedType> {
        if let Some(table) = hint {
            return self.resolve_hint(table);
        }

        let started = Instant::now();
        let mut probes = 0usize;

        if let Some(resolved) = self.metadata_lookup(id).await {
            return Ok(resolved);
        }

        for schema in self.registry.probe_order() {
            if started.elapsed() >= self.budget {
                warn!(id, "type probing budget exhausted, aborting probe loop");
                break;
            }
            probes += 1;
            debug!(id, table = %schema.table, "probing registered type");
            if self.record_exists(&schema.table, &schema.identifier_field, id).await {
                return Ok(ResolvedType {
                    schema: schema.clone(),
                    path: ResolutionPath::Probe,
                    probes,
                });
            }
        }

        for table in fallback::CUSTOM_TABLE_CANDIDATES {
            if started.elapsed() >= self.budget {
                break;
            }
            probes += 1;
            debug!(id, table, "probing custom fallback table");
            if self.record_exists(table, "name", id).await {
                return Ok(ResolvedType {
                    schema: generic_schema(table),
                    path: ResolutionPath::CustomFallback,
                    probes,
                });
            }
        }

        Err(Error::TypeNotFound { id: id.to_string() })
    }

    fn resolve_hint(&self, table: &str) -> Result<ResolvedType> {
        if let Some(schema) = self.registry.get(table) {
            return Ok(ResolvedType {
                schema: schema.clone(),
                path: ResolutionPath::Hint,
                probes: 0,
            });
        }

        let table = table.trim();
        let valid = !table.is_empty()
            && table
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(Error::UnsupportedType {
                table: table.to_string(),
            });
        }

        debug!(table, "unregistered hint, using generic fallback schema");
        Ok(ResolvedType {
            schema: generic_schema(table),
            path: ResolutionPath::HintFallback,
            probes: 0,
        })
    }

    /// One bounded metadata lookup; any failure just falls through to
    /// the probe loop.
    async fn metadata_lookup(&self, id: &str) -> Option<ResolvedType> {
        let record = if looks_like_sys_id(id) {
            call_with_timeout(
                self.call_timeout,
                self.client.fetch_by_id(METADATA_TABLE, id, self.call_timeout),
            )
            .await
            .ok()
            .flatten()
        } else {
            call_with_timeout(
                self.call_timeout,
                self.client
                    .query_by_filter(METADATA_TABLE, &format!("name={id}"), 1, self.call_timeout),
            )
            .await
            .ok()
            .and_then(|mut records| {
                if records.is_empty() {
                    None
                } else {
                    Some(records.remove(0))
                }
            })
        };

        let class_name = record?.get_str("sys_class_name")?;
        let schema = self.registry.get(&class_name)?;
        debug!(id, table = %class_name, "resolved via metadata lookup");
        Some(ResolvedType {
            schema: schema.clone(),
            path: ResolutionPath::Metadata,
            probes: 0,
        })
    }

    /// One bounded existence check. Timeouts and transport failures count
    /// as "not here" so a single slow table cannot sink the whole loop.
    async fn record_exists(&self, table: &str, identifier_field: &str, id: &str) -> bool {
        if looks_like_sys_id(id) {
            matches!(
                call_with_timeout(
                    self.call_timeout,
                    self.client.fetch_by_id(table, id, self.call_timeout),
                )
                .await,
                Ok(Some(_))
            )
        } else {
            matches!(
                call_with_timeout(
                    self.call_timeout,
                    self.client.query_by_filter(
                        table,
                        &format!("{identifier_field}={id}"),
                        1,
                        self.call_timeout,
                    ),
                )
                .await,
                Ok(records) if !records.is_empty()
            )
        }
    }
}
