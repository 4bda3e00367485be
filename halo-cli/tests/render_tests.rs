use std::fs;
use std::path::PathBuf;

use halo_cli::{check_cmd, parse_assignment, render_cmd, RenderArgs};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

#[test]
fn render_with_data_file() {
    let args = RenderArgs {
        data: Some(fixture("todo.json")),
        silent: true,
        ..RenderArgs::default()
    };
    let html = render_cmd(&fixture("todo.html"), &args).expect("render");
    assert_eq!(
        html.trim(),
        r#"<h1>Chores</h1><ul><li>dishes</li><li style="display: none;">laundry</li></ul><p></p>"#
    );
}

#[test]
fn render_applies_sets_in_order() {
    let args = RenderArgs {
        data: Some(fixture("todo.json")),
        sets: vec!["todos=[]".into(), "title=Done".into()],
        silent: true,
        ..RenderArgs::default()
    };
    let html = render_cmd(&fixture("todo.html"), &args).expect("render");
    assert_eq!(
        html.trim(),
        "<h1>Done</h1><ul></ul><p>Nothing to do</p>"
    );
}

#[test]
fn render_page_at_selector() {
    let args = RenderArgs {
        selector: Some("#root".into()),
        sets: vec![r#"who="you""#.into()],
        silent: true,
        ..RenderArgs::default()
    };
    let html = render_cmd(&fixture("page.html"), &args).expect("render");
    assert!(html.starts_with(r#"<header>static</header><main id="root"><b>you</b></main>"#));
}

#[test]
fn render_fails_on_missing_selector() {
    let args = RenderArgs {
        selector: Some("#missing".into()),
        silent: true,
        ..RenderArgs::default()
    };
    let err = render_cmd(&fixture("page.html"), &args).unwrap_err();
    assert!(err.to_string().contains("#missing"));
}

#[test]
fn config_file_sets_prefix() {
    let args = RenderArgs {
        config: Some(fixture("config.json")),
        sets: vec!["msg=hello".into()],
        ..RenderArgs::default()
    };
    let html = render_cmd(&fixture("prefixed.html"), &args).expect("render");
    assert_eq!(html.trim(), "<p>hello</p>");
}

#[test]
fn render_writes_nothing_for_missing_file() {
    let err = render_cmd(&fixture("nope.html"), &RenderArgs::default()).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn assignments_parse_json_or_text() {
    assert_eq!(parse_assignment("a.b=3").unwrap(), ("a.b", json!(3)));
    assert_eq!(parse_assignment("name=Ann").unwrap(), ("name", json!("Ann")));
    assert_eq!(parse_assignment("x=").unwrap(), ("x", json!("")));
    assert!(parse_assignment("novalue").is_err());
    assert!(parse_assignment("=1").is_err());
}

#[test]
fn check_reports_each_bad_expression() {
    let problems = check_cmd(&fixture("broken.html"), "m-").expect("check");
    assert_eq!(problems.len(), 3, "{problems:?}");
    assert!(problems.iter().any(|p| p.location == "<p m-if>"));
    assert!(problems.iter().any(|p| p.location == "text"));
    assert!(problems.iter().any(|p| p.location == "<li m-for>"));
}

#[test]
fn check_accepts_valid_template() {
    let problems = check_cmd(&fixture("todo.html"), "m-").expect("check");
    assert!(problems.is_empty(), "{problems:?}");
}

#[test]
fn check_reports_markup_errors() {
    let dir = std::env::temp_dir().join(format!("halo-check-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bad.html");
    fs::write(&path, "<p><!-- never closed").unwrap();
    let problems = check_cmd(&path, "m-").expect("check");
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message.contains("comment"));
}
