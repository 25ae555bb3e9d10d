//! Model registry: canonical names, aliases and executor binding.

mod common;

use common::MockExecutor;
use pretty_assertions::assert_eq;
use quern::model;
use quern::{Mysql, Value};
use std::sync::Arc;

const USER_SCHEMA: &[u8] = br#"{
    "name": "user",
    "table": "users",
    "columns": [
        {"name": "id", "type": "big_integer"},
        {"name": "email", "type": "string", "length": 255},
        {"name": "nickname", "type": "string", "nullable": true}
    ]
}"#;

#[test]
fn test_register_and_make_by_alias() {
    model::register("App.User", Some(USER_SCHEMA), None).unwrap();

    let executor = Arc::new(MockExecutor::new());
    // both the origin spelling and the canonical lowercased name resolve
    for name in ["App.User", "app.user"] {
        let instance = model::make(name, Arc::new(Mysql), executor.clone()).unwrap();
        assert_eq!(instance.table(), "users");
        let attributes: Vec<&String> = instance.attributes().keys().collect();
        assert_eq!(attributes, ["id", "email", "nickname"]);
    }
}

#[test]
fn test_make_unregistered_fails() {
    let executor = Arc::new(MockExecutor::new());
    let err = model::make("no.such.model", Arc::new(Mysql), executor).unwrap_err();
    assert!(matches!(err, quern::QuernError::Model(_)), "got {err}");
}

#[test]
fn test_last_write_wins() {
    model::register("billing/invoice", Some(br#"{"table": "invoices_v1"}"#), None).unwrap();
    model::register("billing.invoice", Some(br#"{"table": "invoices_v2"}"#), None).unwrap();

    let executor = Arc::new(MockExecutor::new());
    let instance = model::make("billing.invoice", Arc::new(Mysql), executor).unwrap();
    assert_eq!(instance.table(), "invoices_v2");
}

#[test]
fn test_model_query_binds_table_and_executor() {
    model::register("app.member", Some(br#"{"table": "members", "columns": [{"name": "id"}]}"#), None)
        .unwrap();

    let executor = Arc::new(MockExecutor::new());
    let mut instance = model::make("app.member", Arc::new(Mysql), executor.clone()).unwrap();
    instance.set("id", 7).unwrap();
    assert_eq!(instance.attributes()["id"], Value::Int(7));
    assert!(instance.set("missing", 1).is_err());

    let mut query = instance.query();
    query.where_("id", 7);
    query.get().unwrap();
    assert_eq!(
        executor.statements(),
        vec!["select * from `members` where `id` = ?"]
    );
}

#[test]
fn test_malformed_schema_json_is_rejected() {
    let err = model::register("bad.model", Some(b"{not json"), None).unwrap_err();
    assert!(matches!(err, quern::QuernError::Json(_)), "got {err}");
}
