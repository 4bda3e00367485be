use halo_core::{Path, Segment};
use halo_template::{EvalError, Scope, evaluate, evaluate_truthy};
use serde_json::{Map, Value, json};

fn data() -> Map<String, Value> {
    json!({
        "count": 3,
        "name": "Ann",
        "user": { "name": "Bo", "tags": ["x", "y"] },
        "empty": "",
        "nothing": null,
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[test]
fn comparisons_and_arithmetic() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(evaluate("count > 0", &s), Ok(json!(true)));
    assert_eq!(evaluate("count * 2 + 1", &s), Ok(json!(7)));
    assert_eq!(evaluate("count / 2", &s), Ok(json!(1.5)));
    assert_eq!(evaluate("count % 2 === 1", &s), Ok(json!(true)));
    assert_eq!(evaluate("-count", &s), Ok(json!(-3)));
}

#[test]
fn member_access_and_lengths() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(evaluate("user.name", &s), Ok(json!("Bo")));
    assert_eq!(evaluate("user.tags[1]", &s), Ok(json!("y")));
    assert_eq!(evaluate("user['tags'].length", &s), Ok(json!(2)));
    assert_eq!(evaluate("name.length", &s), Ok(json!(3)));
    assert_eq!(evaluate("user.missing", &s), Ok(Value::Null));
}

#[test]
fn string_concatenation_coerces() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(evaluate("'n=' + count", &s), Ok(json!("n=3")));
    assert_eq!(evaluate("name + ' ' + user.name", &s), Ok(json!("Ann Bo")));
}

#[test]
fn logical_operators_short_circuit() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(evaluate("empty || 'fallback'", &s), Ok(json!("fallback")));
    assert_eq!(evaluate("nothing && nothing.deep", &s), Ok(Value::Null));
    assert_eq!(evaluate("!empty", &s), Ok(json!(true)));
    assert_eq!(evaluate("count > 1 ? 'many' : 'few'", &s), Ok(json!("many")));
}

#[test]
fn loose_and_strict_equality() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(evaluate("count == '3'", &s), Ok(json!(true)));
    assert_eq!(evaluate("count === '3'", &s), Ok(json!(false)));
    assert_eq!(evaluate("nothing == null", &s), Ok(json!(true)));
    assert_eq!(evaluate("3 === 3.0", &s), Ok(json!(true)));
}

#[test]
fn failures_are_structured() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(
        evaluate("ghost > 1", &s),
        Err(EvalError::UndefinedVariable("ghost".into()))
    );
    assert_eq!(
        evaluate("nothing.deep", &s),
        Err(EvalError::NullAccess { property: "deep".into() })
    );
    assert_eq!(evaluate("1 / 0", &s), Err(EvalError::NonFinite { op: "/" }));
    assert!(matches!(evaluate("count >", &s), Err(EvalError::Parse { .. })));
}

#[test]
fn truthiness_fails_closed() {
    let d = data();
    let s = Scope::new(&d);
    assert!(evaluate_truthy("count", &s));
    assert!(!evaluate_truthy("ghost", &s));
    assert!(!evaluate_truthy("((", &s));
}

#[test]
fn child_scope_shadows_data() {
    let d = data();
    let root = Scope::new(&d);
    let inner = root.child().bind("name", json!("Cy"));
    assert_eq!(evaluate("name", &inner), Ok(json!("Cy")));
    assert_eq!(evaluate("count", &inner), Ok(json!(3)));
    assert_eq!(evaluate("name", &root), Ok(json!("Ann")));
}

#[test]
fn aliased_locals_map_back_to_data_paths() {
    let d = data();
    let root = Scope::new(&d);
    let rows = Path::parse("table.rows").unwrap();
    let row = root
        .child()
        .bind_at("row", json!({ "cells": ["x"] }), rows.child(Segment::Index(1)));
    assert_eq!(row.data_path("row.cells[0]").as_deref(), Some("table.rows[1].cells[0]"));
    assert_eq!(row.data_path("row").as_deref(), Some("table.rows[1]"));
    assert_eq!(row.data_path("name").as_deref(), Some("name"));
    assert_eq!(row.data_path("unknown.x").as_deref(), Some("unknown.x"));

    let cells = Path::parse(&row.data_path("row.cells").unwrap()).unwrap();
    let cell = row.child().bind_at("cell", json!("x"), cells.child(Segment::Index(0)));
    assert_eq!(cell.data_path("cell").as_deref(), Some("table.rows[1].cells[0]"));

    // a plain binding hides an outer alias and has no data path
    let shadow = row.child().bind("row", json!(1));
    assert_eq!(shadow.data_path("row.cells"), None);
}
