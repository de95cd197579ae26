#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::*;
use docucheck_protocol::{ToolErrorCode, ToolInvokeContext, ToolInvokeRequest};
use docucheck_registry::ToolRegistry;
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_register_and_list() {
    let registry = ToolRegistry::default();
    registry.register(spec("echo", "1.0.0"), Arc::new(CountingTool::default())).unwrap();
    registry.register(spec("audit", "2.1.0"), Arc::new(CountingTool::default())).unwrap();

    let tools = registry.list_tools();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name, "audit");
    assert_eq!(tools[1].name, "echo");
    assert_eq!(registry.count(), 2);
}

#[test]
fn test_duplicate_registration_conflicts() {
    let registry = ToolRegistry::default();
    let first = spec("echo", "1.0.0");
    let mut second = spec("echo", "1.0.0");
    second.description = "impostor".into();

    registry.register(first, Arc::new(CountingTool::default())).unwrap();
    let err = registry
        .register(second, Arc::new(CountingTool::default()))
        .unwrap_err();

    assert_eq!(err.code, ToolErrorCode::RegistryConflict);
    let tools = registry.list_tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].description, "echo test tool");
}

#[test]
fn test_same_name_different_versions_coexist() {
    let registry = ToolRegistry::default();
    registry.register(spec("echo", "1.0.0"), Arc::new(CountingTool::default())).unwrap();
    registry.register(spec("echo", "1.2.0"), Arc::new(CountingTool::default())).unwrap();
    assert_eq!(registry.count(), 2);
}

#[test]
fn test_get_without_version_picks_highest() {
    let registry = ToolRegistry::default();
    for version in ["1.9.0", "1.10.0", "1.2.5"] {
        registry.register(spec("echo", version), Arc::new(CountingTool::default())).unwrap();
    }
    assert_eq!(registry.get("echo", None).unwrap().version, "1.10.0");
    assert_eq!(registry.get("echo", Some("1.2.5")).unwrap().version, "1.2.5");
    assert!(registry.get("echo", Some("3.0.0")).is_none());
}

#[test]
fn test_rejects_invalid_specs() {
    let registry = ToolRegistry::default();
    let err = registry
        .register(spec("", "1.0.0"), Arc::new(CountingTool::default()))
        .unwrap_err();
    assert_eq!(err.code, ToolErrorCode::ValidationFailed);

    let err = registry
        .register(spec_with_limits("zero", 10, 0), Arc::new(CountingTool::default()))
        .unwrap_err();
    assert_eq!(err.code, ToolErrorCode::ValidationFailed);
    assert_eq!(registry.count(), 0);
}

#[tokio::test]
async fn test_replace_swaps_implementation() {
    let registry = ToolRegistry::default();
    let old = Arc::new(CountingTool::default());
    let new = Arc::new(CountingTool::default());
    registry.register(spec("echo", "1.0.0"), old.clone()).unwrap();

    let mut updated = spec("echo", "1.0.0");
    updated.description = "updated".into();
    let previous = registry.replace(updated, new.clone()).unwrap();
    assert_eq!(previous.unwrap().description, "echo test tool");

    registry
        .invoke(
            ToolInvokeRequest::new("echo", json!({})),
            ToolInvokeContext::new("u", "s"),
        )
        .await
        .unwrap();
    assert_eq!(old.calls(), 0);
    assert_eq!(new.calls(), 1);
    assert_eq!(registry.list_tools()[0].description, "updated");
}

#[test]
fn test_unregister() {
    let registry = ToolRegistry::default();
    registry.register(spec("echo", "1.0.0"), Arc::new(CountingTool::default())).unwrap();

    let removed = registry.unregister("echo", "1.0.0").unwrap();
    assert_eq!(removed.name, "echo");
    assert_eq!(registry.count(), 0);

    let err = registry.unregister("echo", "1.0.0").unwrap_err();
    assert_eq!(err.code, ToolErrorCode::NotFound);
}

#[tokio::test]
async fn test_list_is_safe_during_invocations() {
    let registry = Arc::new(ToolRegistry::default());
    registry.register(spec("echo", "1.0.0"), Arc::new(CountingTool::default())).unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            if i % 4 == 0 {
                let name = format!("tool-{i}");
                registry
                    .register(spec(&name, "1.0.0"), Arc::new(CountingTool::default()))
                    .unwrap();
            }
            let listed = registry.list_tools();
            assert!(listed.iter().any(|t| t.name == "echo"));
            registry
                .invoke(
                    ToolInvokeRequest::new("echo", json!({"i": i})),
                    ToolInvokeContext::new("u", "s"),
                )
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(registry.count(), 5);
}
