use halo_template::{Scope, compile, has_markers};
use serde_json::{Map, Value, json};

fn data() -> Map<String, Value> {
    json!({ "greeting": "hi", "user": { "name": "Ann" }, "items": [10, 20] })
        .as_object()
        .cloned()
        .unwrap()
}

#[test]
fn resolves_every_marker_left_to_right() {
    let d = data();
    let s = Scope::new(&d);
    let out = compile("{{greeting}}, {{ user.name }}! first={{items[0]}}", &s);
    assert_eq!(out, "hi, Ann! first=10");
    assert!(!has_markers(&out));
}

#[test]
fn unresolvable_markers_render_empty() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(compile("[{{missing}}]", &s), "[]");
    assert_eq!(compile("[{{ user.name.first.x }}]", &s), "[]");
    assert_eq!(compile("a{{ }}b", &s), "ab");
}

#[test]
fn text_without_markers_is_untouched() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(compile("plain } { text", &s), "plain } { text");
    assert_eq!(compile("open {{ only", &s), "open {{ only");
}

#[test]
fn markers_use_the_same_snapshot() {
    let d = data();
    let s = Scope::new(&d);
    assert_eq!(compile("{{greeting}}{{greeting}}", &s), "hihi");
}
