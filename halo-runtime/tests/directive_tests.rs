use std::cell::Cell;
use std::rc::Rc;

use halo_runtime::{Config, Instance, Options, RuntimeError};
use halo_dom::Document;
use serde_json::{Value, json};

fn quiet() -> Config {
    Config {
        silent: true,
        ..Config::default()
    }
}

fn options(template: &str, data: Value) -> Options {
    Options::new()
        .document(Document::parse(r#"<div id="app"></div>"#).unwrap())
        .el("#app")
        .template(template)
        .data(data)
        .config(quiet())
}

fn mount(template: &str, data: Value) -> Instance {
    Instance::new(options(template, data))
}

fn bump(vm: &mut Instance, _: &[Value]) {
    let n = vm.get("count").and_then(Value::as_i64).unwrap_or(0);
    vm.set("count", json!(n + 1));
}

#[test]
fn if_clears_and_restores_content() {
    let mut vm = mount(
        r#"<p m-if="show">Hello {{name}}</p>"#,
        json!({ "show": false, "name": "Ann" }),
    );
    assert_eq!(vm.html(), "<p></p>");

    vm.set("show", json!(true));
    assert_eq!(vm.html(), "<p>Hello Ann</p>");

    vm.set("show", json!(false));
    assert_eq!(vm.html(), "<p></p>");
}

#[test]
fn if_accepts_interpolated_values() {
    let mut vm = mount(r#"<p m-if="{{flag}}">x</p>"#, json!({ "flag": false }));
    assert_eq!(vm.html(), "<p></p>");
    vm.set("flag", json!(true));
    assert_eq!(vm.html(), "<p>x</p>");
}

#[test]
fn malformed_condition_fails_closed() {
    let vm = mount(r#"<p m-if="a >">x</p><i>ok</i>"#, json!({}));
    assert_eq!(vm.html(), "<p></p><i>ok</i>");
}

#[test]
fn show_toggles_display_only() {
    let mut vm = mount(r#"<p m-show="visible">{{msg}}</p>"#, json!({ "visible": false, "msg": "m" }));
    assert_eq!(vm.html(), r#"<p style="display: none;">m</p>"#);
    vm.set("visible", json!(true));
    assert_eq!(vm.html(), "<p>m</p>");
}

#[test]
fn once_content_never_changes() {
    let mut vm = mount(
        r#"<div m-if="open"><p m-once>{{n}}</p></div><span>{{n}}</span>"#,
        json!({ "n": 1, "open": true }),
    );
    assert_eq!(vm.html(), "<div><p>1</p></div><span>1</span>");

    vm.set("n", json!(2));
    assert_eq!(vm.html(), "<div><p>1</p></div><span>2</span>");

    vm.set("open", json!(false));
    vm.set("n", json!(3));
    vm.set("open", json!(true));
    assert_eq!(vm.html(), "<div><p>1</p></div><span>3</span>");
}

#[test]
fn directive_attributes_never_render() {
    let mut vm = mount(
        r#"<div m-show="ok" m-on="click:go" m-mask m-text="{{t}}" title="{{t}}"></div>"#,
        json!({ "ok": true, "t": "T" }),
    );
    vm.set("t", json!("U"));
    let html = vm.html();
    assert_eq!(html, r#"<div title="U">U</div>"#);
    assert!(!html.contains("m-"));
}

#[test]
fn text_and_html_replace_content() {
    let mut vm = mount(
        r#"<p m-text="{{msg}}">ignored {{other}}</p><div m-html="{{frag}}"></div>"#,
        json!({ "msg": "<hi>", "frag": "<b>bold</b>" }),
    );
    assert_eq!(vm.html(), "<p>&lt;hi&gt;</p><div><b>bold</b></div>");

    vm.set("frag", json!("<i"));
    assert_eq!(vm.html(), "<p>&lt;hi&gt;</p><div>&lt;i</div>");
}

#[test]
fn falsy_if_wins_over_text() {
    let vm = mount(r#"<p m-text="shown" m-if="no">x</p>"#, json!({ "no": false }));
    assert_eq!(vm.html(), "<p></p>");
}

#[test]
fn model_input_writes_back_once() {
    let mut vm = mount(r#"<input m-model="name"><p>{{name}}</p>"#, json!({ "name": "" }));
    let input = vm.document().query_selector("input").unwrap();
    assert_eq!(vm.listeners().len(), 2);

    let before = vm.rebuild_count();
    assert_eq!(vm.input(input, "Ann"), Ok(1));
    assert_eq!(vm.rebuild_count(), before + 1);
    assert_eq!(vm.get("name"), Some(&json!("Ann")));
    assert_eq!(vm.html(), "<input><p>Ann</p>");
    assert_eq!(vm.listeners().len(), 2);
}

#[test]
fn model_seeds_value_from_data() {
    let mut vm = mount(r#"<input m-model="user.name">"#, json!({ "user": { "name": "Bo" } }));
    let input = vm.document().query_selector("input").unwrap();
    assert_eq!(vm.document().value(input), Some("Bo"));

    vm.set("user.name", json!("Cy"));
    assert_eq!(vm.document().value(input), Some("Cy"));
}

#[test]
fn on_binds_a_single_listener() {
    let mut vm = Instance::new(
        options(r#"<button m-on="click:inc">{{count}}</button>"#, json!({ "count": 0 }))
            .method("inc", bump),
    );
    let button = vm.document().query_selector("button").unwrap();
    assert_eq!(vm.dispatch(button, "click", Value::Null), Ok(1));
    assert_eq!(vm.dispatch(button, "click", Value::Null), Ok(1));
    assert_eq!(vm.html(), "<button>2</button>");
    assert_eq!(vm.listeners().len(), 1);
}

#[test]
fn on_with_unknown_method_surfaces_error() {
    let mut vm = mount(r#"<button m-on="click:nope">x</button>"#, json!({}));
    let button = vm.document().query_selector("button").unwrap();
    assert_eq!(
        vm.dispatch(button, "click", Value::Null),
        Err(RuntimeError::UnknownMethod("nope".into()))
    );
}

#[test]
fn on_prefers_instance_events() {
    let mut vm = Instance::new(
        Options::new()
            .document(Document::parse(r#"<div id="app"></div>"#).unwrap())
            .template(r#"<p m-on="ping:inc">{{count}}</p>"#)
            .method("inc", bump)
            .config(quiet()),
    );
    vm.on("ping", |_| {});
    vm.mount("#app").unwrap();
    assert!(vm.listeners().is_empty());

    assert_eq!(vm.emit("ping", Value::Null), 2);
    assert_eq!(vm.html(), "<p>1</p>");
}

#[test]
fn malformed_on_is_isolated() {
    let vm = mount(r#"<a m-on="click">x</a><b>{{v}}</b>"#, json!({ "v": 1 }));
    assert_eq!(vm.html(), "<a>x</a><b>1</b>");
    assert!(vm.listeners().is_empty());
}

#[test]
fn custom_prefix() {
    let vm = Instance::new(
        options(r#"<p x-if="no">a</p><p m-if="no">b</p>"#, json!({ "no": false })).config(Config {
            silent: true,
            attribute_prefix: "x-".into(),
        }),
    );
    assert_eq!(vm.html(), r#"<p></p><p m-if="no">b</p>"#);
}

#[test]
fn custom_directive_runs_after_builtins() {
    let seen = Rc::new(Cell::new(false));
    let flag = seen.clone();
    let vm = Instance::new(
        options(r#"<p m-upper="{{word}}" m-text="low">x</p>"#, json!({ "word": "hey" })).directive(
            "upper",
            move |cx| {
                flag.set(true);
                let up = cx.value.to_uppercase();
                cx.document.set_text_content(cx.host, &up);
                cx.replace_content();
                Ok(())
            },
        ),
    );
    assert!(seen.get());
    assert_eq!(vm.html(), "<p>HEY</p>");
}

#[test]
fn deferred_write_triggers_one_trailing_pass() {
    let vm = Instance::new(
        options("<p m-seed>{{ready}}</p>", json!({})).directive("seed", |cx| {
            if cx.scope.lookup("ready") != Some(&json!(true)) {
                cx.set_data("ready", json!(true));
            }
            Ok(())
        }),
    );
    assert_eq!(vm.rebuild_count(), 2);
    assert_eq!(vm.html(), "<p>true</p>");
}

#[test]
fn trailing_passes_are_capped() {
    let vm = Instance::new(
        options("<p m-spin>{{n}}</p>", json!({ "n": 0 })).directive("spin", |cx| {
            let n = cx.scope.lookup("n").and_then(Value::as_i64).unwrap_or(0);
            cx.set_data("n", json!(n + 1));
            Ok(())
        }),
    );
    assert_eq!(vm.rebuild_count(), 1 + halo_runtime::instance::MAX_TRAILING_BUILDS);
}
