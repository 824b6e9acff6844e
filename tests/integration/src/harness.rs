//! Shared test infrastructure: a scripted in-memory record client with a
//! full call log, plus engine construction helpers.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sn_engine::{
    ClientResult, EngineConfig, RecordClient, RemoteRecord, SessionStore, SyncEngine,
    UpdateOutcome,
};
use sn_fs::NormalizedPath;
use sn_schema::SchemaRegistry;
use tempfile::TempDir;

/// One observed remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch { table: String, id: String },
    Query { table: String, filter: String },
    Update { table: String, id: String },
}

impl Call {
    pub fn table(&self) -> &str {
        match self {
            Call::Fetch { table, .. } | Call::Query { table, .. } | Call::Update { table, .. } => {
                table
            }
        }
    }
}

/// Scripted record client backed by an in-memory table map.
pub struct ScriptedClient {
    records: Mutex<Vec<(String, RemoteRecord)>>,
    calls: Mutex<Vec<Call>>,
    updates: Mutex<Vec<(String, String, BTreeMap<String, String>)>>,
    fail_updates: AtomicBool,
    slow_tables: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            fail_updates: AtomicBool::new(false),
            slow_tables: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, table: &str, record: RemoteRecord) {
        self.records
            .lock()
            .unwrap()
            .push((table.to_string(), record));
    }

    /// Make every call against `table` hang past any reasonable timeout.
    pub fn make_slow(&self, table: &str) {
        self.slow_tables.lock().unwrap().push(table.to_string());
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Tables touched by fetch/query calls, in order.
    pub fn tables_probed(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, Call::Update { .. }))
            .map(|c| c.table().to_string())
            .collect()
    }

    pub fn updates(&self) -> Vec<(String, String, BTreeMap<String, String>)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    async fn stall_if_slow(&self, table: &str) {
        let slow = self.slow_tables.lock().unwrap().contains(&table.to_string());
        if slow {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

#[async_trait::async_trait]
impl RecordClient for ScriptedClient {
    async fn fetch_by_id(
        &self,
        table: &str,
        id: &str,
        _timeout: Duration,
    ) -> ClientResult<Option<RemoteRecord>> {
        self.calls.lock().unwrap().push(Call::Fetch {
            table: table.to_string(),
            id: id.to_string(),
        });
        self.stall_if_slow(table).await;
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|(t, r)| t == table && r.get_str("sys_id").as_deref() == Some(id))
            .map(|(_, r)| r.clone()))
    }

    async fn query_by_filter(
        &self,
        table: &str,
        filter: &str,
        limit: usize,
        _timeout: Duration,
    ) -> ClientResult<Vec<RemoteRecord>> {
        self.calls.lock().unwrap().push(Call::Query {
            table: table.to_string(),
            filter: filter.to_string(),
        });
        self.stall_if_slow(table).await;
        let (field, value) = filter.split_once('=').unwrap_or((filter, ""));
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|(t, r)| t == table && r.get_str(field).as_deref() == Some(value))
            .map(|(_, r)| r.clone())
            .take(limit)
            .collect())
    }

    async fn update_by_id(
        &self,
        table: &str,
        id: &str,
        fields: BTreeMap<String, String>,
        _timeout: Duration,
    ) -> ClientResult<UpdateOutcome> {
        self.calls.lock().unwrap().push(Call::Update {
            table: table.to_string(),
            id: id.to_string(),
        });
        self.stall_if_slow(table).await;
        self.updates
            .lock()
            .unwrap()
            .push((table.to_string(), id.to_string(), fields));
        if self.fail_updates.load(Ordering::SeqCst) {
            Ok(UpdateOutcome::failed("write access denied"))
        } else {
            Ok(UpdateOutcome::ok())
        }
    }
}

/// Engine over a scripted client and a temp base directory.
pub fn engine_for(client: Arc<ScriptedClient>, base: &TempDir) -> SyncEngine {
    let config = EngineConfig {
        base_dir: NormalizedPath::new(base.path()),
        call_timeout: Duration::from_millis(250),
        resolve_budget: Duration::from_secs(10),
    };
    SyncEngine::new(
        client,
        SchemaRegistry::with_builtins(),
        SessionStore::new(),
        config,
    )
}

pub const WIDGET_SYS_ID: &str = "a81f2c3d4e5f60718293a4b5c6d7e8f9";

/// A representative widget record: markup template, empty server script,
/// option schema as the remote stores it (compact JSON).
pub fn widget_record(name: &str) -> RemoteRecord {
    RemoteRecord::new()
        .with_field("name", name)
        .with_field("sys_id", WIDGET_SYS_ID)
        .with_field(
            "template",
            "<div>\n  <p>{{data.greeting}}</p>\n</div>",
        )
        .with_field("script", "")
        .with_field("option_schema", r#"[{"name":"title","type":"string"}]"#)
}

/// Register a sys_metadata row so the resolver's direct lookup answers.
pub fn register_metadata(client: &ScriptedClient, name: &str, class: &str) {
    client.insert(
        "sys_metadata",
        RemoteRecord::new()
            .with_field("name", name)
            .with_field("sys_id", WIDGET_SYS_ID)
            .with_field("sys_class_name", class),
    );
}
