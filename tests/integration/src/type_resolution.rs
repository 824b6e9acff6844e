//! Type resolution scenarios: hint handling, the metadata short-circuit,
//! priority-ordered probing, fallbacks, and the probing time budget.

mod harness;

use harness::{ScriptedClient, engine_for, register_metadata};
use sn_engine::{Error, RemoteRecord, ResolutionPath, TypeResolver};
use sn_schema::{SchemaRegistry, builtins::BUILTIN_COUNT, fallback};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn resolver_parts() -> (Arc<ScriptedClient>, SchemaRegistry) {
    (Arc::new(ScriptedClient::new()), SchemaRegistry::with_builtins())
}

#[tokio::test]
async fn hint_resolves_without_any_remote_calls() {
    let (client, registry) = resolver_parts();
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(250),
        Duration::from_secs(10),
    );

    let resolved = resolver.resolve("anything", Some("sp_widget")).await.unwrap();
    assert_eq!(resolved.path, ResolutionPath::Hint);
    assert_eq!(resolved.probes, 0);
    assert_eq!(resolved.schema.table, "sp_widget");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn unregistered_hint_falls_back_to_generic_schema() {
    let (client, registry) = resolver_parts();
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(250),
        Duration::from_secs(10),
    );

    let resolved = resolver
        .resolve("thing", Some("u_custom_table"))
        .await
        .unwrap();
    assert_eq!(resolved.path, ResolutionPath::HintFallback);
    assert_eq!(resolved.schema.table, "u_custom_table");
    assert_eq!(resolved.schema.folder, "custom/u_custom_table");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn malformed_hint_is_rejected() {
    let (client, registry) = resolver_parts();
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(250),
        Duration::from_secs(10),
    );

    let err = resolver
        .resolve("thing", Some("no spaces; allowed"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }));
}

#[tokio::test]
async fn metadata_lookup_short_circuits_probing() {
    let (client, registry) = resolver_parts();
    register_metadata(&client, "my_widget", "sp_widget");
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(250),
        Duration::from_secs(10),
    );

    let resolved = resolver.resolve("my_widget", None).await.unwrap();
    assert_eq!(resolved.path, ResolutionPath::Metadata);
    assert_eq!(resolved.probes, 0);
    assert_eq!(client.tables_probed(), vec!["sys_metadata"]);
}

#[tokio::test]
async fn probing_walks_registered_types_in_priority_order() {
    let (client, registry) = resolver_parts();
    client.insert(
        "sys_script_include",
        RemoteRecord::new().with_field("name", "DateUtils"),
    );
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(250),
        Duration::from_secs(10),
    );

    let resolved = resolver.resolve("DateUtils", None).await.unwrap();
    assert_eq!(resolved.path, ResolutionPath::Probe);
    assert_eq!(resolved.probes, 2, "widget probed first, then script includes");
    assert_eq!(
        client.tables_probed(),
        vec!["sys_metadata", "sp_widget", "sys_script_include"],
        "probing stops at the first hit"
    );
}

#[tokio::test]
async fn custom_tables_probed_after_all_registered_types() {
    let (client, registry) = resolver_parts();
    client.insert(
        "sys_script_fix",
        RemoteRecord::new().with_field("name", "backfill"),
    );
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(250),
        Duration::from_secs(10),
    );

    let resolved = resolver.resolve("backfill", None).await.unwrap();
    assert_eq!(resolved.path, ResolutionPath::CustomFallback);
    assert_eq!(resolved.probes, BUILTIN_COUNT + 1);
    assert_eq!(resolved.schema.folder, "custom/sys_script_fix");
    assert_eq!(
        client.tables_probed().last().map(String::as_str),
        Some("sys_script_fix")
    );
}

#[tokio::test]
async fn unknown_identifier_is_type_not_found() {
    let (client, registry) = resolver_parts();
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(250),
        Duration::from_secs(10),
    );

    let err = resolver.resolve("nowhere_to_be_found", None).await.unwrap_err();
    assert!(matches!(err, Error::TypeNotFound { .. }));
    assert!(err.to_string().contains("nowhere_to_be_found"));
    // Every registered type plus every custom candidate was tried.
    let expected = 1 + BUILTIN_COUNT + fallback::CUSTOM_TABLE_CANDIDATES.len();
    assert_eq!(client.tables_probed().len(), expected);
}

#[tokio::test]
async fn slow_table_counts_as_a_miss() {
    let (client, registry) = resolver_parts();
    client.make_slow("sp_widget");
    client.insert(
        "sys_script_include",
        RemoteRecord::new().with_field("name", "DateUtils"),
    );
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(50),
        Duration::from_secs(10),
    );

    let resolved = resolver.resolve("DateUtils", None).await.unwrap();
    assert_eq!(resolved.path, ResolutionPath::Probe);
    assert_eq!(resolved.schema.table, "sys_script_include");
}

#[tokio::test]
async fn exhausted_budget_aborts_the_probe_loop() {
    let (client, registry) = resolver_parts();
    client.insert(
        "sys_script_include",
        RemoteRecord::new().with_field("name", "DateUtils"),
    );
    let resolver = TypeResolver::new(
        client.as_ref(),
        &registry,
        Duration::from_millis(250),
        Duration::ZERO,
    );

    // The record exists, but a zero budget forbids probing for it.
    let err = resolver.resolve("DateUtils", None).await.unwrap_err();
    assert!(matches!(err, Error::TypeNotFound { .. }));
    assert_eq!(client.tables_probed(), vec!["sys_metadata"]);
}

#[tokio::test]
async fn generic_fallback_pull_materializes_under_custom_folder() {
    let client = Arc::new(ScriptedClient::new());
    client.insert(
        "u_deploy_script",
        RemoteRecord::new()
            .with_field("name", "rollout")
            .with_field("sys_id", "b81f2c3d4e5f60718293a4b5c6d7e8f9")
            .with_field("script", "gs.info('rolling out');"),
    );
    let base = TempDir::new().unwrap();
    let mut engine = engine_for(client.clone(), &base);

    let artifact = engine
        .pull("rollout", Some("u_deploy_script"))
        .await
        .unwrap();
    assert!(
        artifact
            .dir
            .as_str()
            .ends_with("custom/u_deploy_script/rollout")
    );
    assert!(artifact.dir.join("rollout.js").is_file());
}
