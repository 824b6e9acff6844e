//! End-to-end pull/edit/push lifecycle
//!
//! Exercises the complete flow against a scripted remote: resolve ->
//! fetch -> materialize -> edit -> validate -> push, plus the retry and
//! cleanup paths around it.

mod harness;

use harness::{Call, ScriptedClient, WIDGET_SYS_ID, engine_for, register_metadata, widget_record};
use sn_engine::{ArtifactStatus, Error, RemoteRecord};
use sn_fs::io;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn full_widget_lifecycle() {
    let client = Arc::new(ScriptedClient::new());
    client.insert("sp_widget", widget_record("morning_greeting"));
    register_metadata(&client, "morning_greeting", "sp_widget");
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    // Pull without a hint: the metadata lookup answers, no probing.
    let artifact = engine.pull("morning_greeting", None).await.unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Synced);
    assert_eq!(artifact.table(), "sp_widget");
    assert_eq!(
        client.tables_probed(),
        vec!["sys_metadata", "sp_widget"],
        "one metadata lookup, one fetch, zero probes"
    );

    // Materialized tree: markup untouched, empty script scaffolded,
    // option schema pretty-printed, docs generated.
    assert!(artifact.dir.as_str().ends_with("widgets/morning_greeting"));
    let template = io::read_text(&artifact.dir.join("morning_greeting.html")).unwrap();
    assert_eq!(template, "<div>\n  <p>{{data.greeting}}</p>\n</div>");
    let script = io::read_text(&artifact.dir.join("morning_greeting.server.js")).unwrap();
    assert_eq!(script, "(function() {\n})();\n");
    let options = io::read_text(&artifact.dir.join("morning_greeting.options.json")).unwrap();
    assert!(options.contains("\n"), "option schema is pretty-printed");
    let docs = io::read_text(&artifact.dir.join("ARTIFACT.md")).unwrap();
    assert!(docs.contains("morning_greeting.server.js"));
    assert!(docs.contains("template_bindings"));

    // Edit the server script inside the scaffold.
    let script_path = artifact.file("script").unwrap().path.clone();
    io::write_text(
        &script_path,
        "(function() {\nvar greeting = 'good morning';\ndata.greeting = greeting;\n})();\n",
    )
    .unwrap();

    let outcome = engine.push("morning_greeting", false).await.unwrap();
    assert!(outcome.pushed);
    assert_eq!(outcome.changed_fields.len(), 1);
    assert_eq!(outcome.changed_fields[0].field, "script");

    // Exactly one update, addressed by sys_id, scaffold stripped.
    let updates = client.updates();
    assert_eq!(updates.len(), 1);
    let (table, target, payload) = &updates[0];
    assert_eq!(table, "sp_widget");
    assert_eq!(target, WIDGET_SYS_ID);
    assert_eq!(payload.len(), 1);
    assert_eq!(
        payload["script"],
        "var greeting = 'good morning';\ndata.greeting = greeting;"
    );

    assert_eq!(
        engine.get_status("morning_greeting").unwrap(),
        ArtifactStatus::Synced
    );
}

#[tokio::test]
async fn push_after_clean_pull_is_a_no_op() {
    let client = Arc::new(ScriptedClient::new());
    client.insert("sp_widget", widget_record("w1"));
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    engine.pull("w1", Some("sp_widget")).await.unwrap();
    let outcome = engine.push("w1", false).await.unwrap();

    assert!(outcome.up_to_date);
    assert!(!outcome.pushed);
    assert_eq!(client.update_count(), 0, "no remote call when nothing changed");
}

#[tokio::test]
async fn modern_syntax_blocks_push_until_forced() {
    let client = Arc::new(ScriptedClient::new());
    client.insert("sp_widget", widget_record("w1"));
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine.pull("w1", Some("sp_widget")).await.unwrap();
    let script_path = artifact.file("script").unwrap().path.clone();
    io::write_text(
        &script_path,
        "(function() {\nlet greeting = 'hi';\ndata.greeting = greeting;\n})();\n",
    )
    .unwrap();

    let outcome = engine.push("w1", false).await.unwrap();
    assert!(outcome.blocked);
    assert_eq!(client.update_count(), 0);
    assert_eq!(engine.get_status("w1").unwrap(), ArtifactStatus::Modified);
    let style = outcome
        .validation
        .iter()
        .find(|r| r.rule == "style:script")
        .unwrap();
    assert!(!style.report.valid);
    assert!(!style.report.hints.is_empty(), "violations carry hints");

    let forced = engine.push("w1", true).await.unwrap();
    assert!(forced.pushed);
    assert!(forced.validation.iter().all(|r| r.report.valid));
    assert_eq!(client.update_count(), 1);
    assert_eq!(engine.get_status("w1").unwrap(), ArtifactStatus::Synced);
}

#[tokio::test]
async fn repull_overwrites_edits_and_resets_baseline() {
    let client = Arc::new(ScriptedClient::new());
    client.insert("sp_widget", widget_record("w1"));
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine.pull("w1", Some("sp_widget")).await.unwrap();
    let script_path = artifact.file("script").unwrap().path.clone();
    let edited = "(function() {\ndata.greeting = 'draft';\n})();\n";
    io::write_text(&script_path, edited).unwrap();

    let again = engine.pull("w1", Some("sp_widget")).await.unwrap();
    let on_disk = io::read_text(&script_path).unwrap();
    assert_eq!(on_disk, "(function() {\n})();\n", "remote state wins on re-pull");

    // The overwritten edit is kept in the session snapshot.
    let script = again.file("script").unwrap();
    assert!(script.existed_before_pull);
    assert_eq!(script.preexisting_snapshot.as_deref(), Some(edited));

    let outcome = engine.push("w1", false).await.unwrap();
    assert!(outcome.up_to_date, "baselines were rebuilt from remote");
}

#[tokio::test]
async fn failed_update_keeps_edits_and_retries() {
    let client = Arc::new(ScriptedClient::new());
    client.insert("sp_widget", widget_record("w1"));
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine.pull("w1", Some("sp_widget")).await.unwrap();
    let script_path = artifact.file("script").unwrap().path.clone();
    let edited = "(function() {\ndata.greeting = 'hello';\n})();\n";
    io::write_text(&script_path, edited).unwrap();

    client.set_fail_updates(true);
    let outcome = engine.push("w1", false).await.unwrap();
    assert!(!outcome.pushed);
    assert!(!outcome.blocked);
    assert_eq!(
        engine.get_status("w1").unwrap(),
        ArtifactStatus::PendingUpload
    );
    assert_eq!(io::read_text(&script_path).unwrap(), edited, "edits survive");

    client.set_fail_updates(false);
    let retry = engine.push("w1", false).await.unwrap();
    assert!(retry.pushed);
    assert_eq!(engine.get_status("w1").unwrap(), ArtifactStatus::Synced);

    // Both attempts carried the identical payload.
    let updates = client.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].2, updates[1].2);
}

#[tokio::test]
async fn timed_out_update_sets_pending_upload() {
    let client = Arc::new(ScriptedClient::new());
    client.insert("sp_widget", widget_record("w1"));
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine.pull("w1", Some("sp_widget")).await.unwrap();
    let script_path = artifact.file("script").unwrap().path.clone();
    io::write_text(
        &script_path,
        "(function() {\ndata.greeting = 'hello';\n})();\n",
    )
    .unwrap();

    client.make_slow("sp_widget");
    let outcome = engine.push("w1", false).await.unwrap();
    assert!(!outcome.pushed);
    assert_eq!(
        engine.get_status("w1").unwrap(),
        ArtifactStatus::PendingUpload
    );
}

#[tokio::test]
async fn option_schema_pushes_back_compact() {
    let client = Arc::new(ScriptedClient::new());
    // No template placeholders, so an options-only edit passes coherence.
    client.insert(
        "sp_widget",
        RemoteRecord::new()
            .with_field("name", "plain")
            .with_field("sys_id", WIDGET_SYS_ID)
            .with_field("template", "<div>static</div>")
            .with_field("script", "")
            .with_field("option_schema", r#"[{"name":"title","type":"string"}]"#),
    );
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine.pull("plain", Some("sp_widget")).await.unwrap();
    let options_path = artifact.file("option_schema").unwrap().path.clone();
    io::write_text(
        &options_path,
        "[\n  {\n    \"name\": \"title\",\n    \"type\": \"string\"\n  },\n  {\n    \"name\": \"count\",\n    \"type\": \"integer\"\n  }\n]",
    )
    .unwrap();

    let outcome = engine.push("plain", false).await.unwrap();
    assert!(outcome.pushed);
    let updates = client.updates();
    let payload = &updates[0].2;
    assert_eq!(payload.len(), 1);
    assert!(
        !payload["option_schema"].contains('\n'),
        "postprocessor compacts JSON before upload"
    );
    assert!(payload["option_schema"].contains("\"count\""));
}

#[tokio::test]
async fn demo_data_is_never_pushed() {
    let client = Arc::new(ScriptedClient::new());
    client.insert(
        "sp_widget",
        RemoteRecord::new()
            .with_field("name", "demo")
            .with_field("sys_id", WIDGET_SYS_ID)
            .with_field("template", "<div>static</div>")
            .with_field("script", "")
            .with_field("demo_data", r#"{"greeting":"hi"}"#),
    );
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine.pull("demo", Some("sp_widget")).await.unwrap();
    let demo_path = artifact.file("demo_data").unwrap().path.clone();
    io::write_text(&demo_path, r#"{"greeting":"edited"}"#).unwrap();

    let outcome = engine.push("demo", false).await.unwrap();
    assert!(outcome.up_to_date, "pull-only edits never trigger an upload");
    assert_eq!(client.update_count(), 0);
}

#[tokio::test]
async fn pull_by_sys_id_uses_direct_fetch() {
    let client = Arc::new(ScriptedClient::new());
    client.insert("sp_widget", widget_record("addressed"));
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine.pull(WIDGET_SYS_ID, Some("sp_widget")).await.unwrap();
    assert!(
        client
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Fetch { table, id } if table == "sp_widget" && id == WIDGET_SYS_ID))
    );
    // Directory is named after the record's display name, not the hex id.
    assert!(artifact.dir.as_str().ends_with("widgets/addressed"));
}

#[tokio::test]
async fn cleanup_refuses_dirty_artifact_without_force() {
    let client = Arc::new(ScriptedClient::new());
    client.insert("sp_widget", widget_record("w1"));
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine.pull("w1", Some("sp_widget")).await.unwrap();
    let dir = artifact.dir.clone();
    let script_path = artifact.file("script").unwrap().path.clone();
    io::write_text(
        &script_path,
        "(function() {\ndata.greeting = 'unsaved';\n})();\n",
    )
    .unwrap();

    let err = engine.cleanup("w1", false).unwrap_err();
    assert!(matches!(err, Error::CleanupRefused { .. }));
    assert!(err.to_string().contains("force"));
    assert!(dir.is_dir());
    assert_eq!(engine.list_artifacts().len(), 1);

    engine.cleanup("w1", true).unwrap();
    assert!(!dir.exists());
    assert!(engine.list_artifacts().is_empty());
}

#[tokio::test]
async fn missing_record_is_an_error_with_no_session_entry() {
    let client = Arc::new(ScriptedClient::new());
    register_metadata(&client, "ghost", "sp_widget");
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let err = engine.pull("ghost", None).await.unwrap_err();
    assert!(matches!(err, Error::RecordMissing { .. }));
    assert!(engine.list_artifacts().is_empty());
}
