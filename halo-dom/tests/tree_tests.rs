use halo_dom::{Document, NodeKind, build_tree, h, materialize, text};

#[test]
fn build_tree_mirrors_host() {
    let doc = Document::parse(r#"<div id="app"><p m-if="ok">{{ a }}</p>tail</div>"#).unwrap();
    let app = doc.query_selector("#app").unwrap();
    let tree = build_tree(&doc, app);
    assert_eq!(tree.host, Some(app));
    assert_eq!(tree.children.len(), 2);
    let p = &tree.children[0];
    assert_eq!(p.kind, NodeKind::Element("p".into()));
    assert_eq!(p.attrs.get("m-if"), Some("ok"));
    assert_eq!(p.text, "{{ a }}");
    assert_eq!(p.children[0].text, "{{ a }}");
    assert!(tree.children[1].is_text());
}

#[test]
fn materialize_binds_every_node() {
    let mut doc = Document::new();
    let mut node = h("ul", vec![("class", "l")], vec![h("li", (), vec![text("one")])]);
    let id = materialize(&mut doc, &mut node);
    assert!(!doc.is_attached(id));
    let body = doc.body();
    doc.append_child(body, id);
    assert_eq!(doc.outer_html(id), r#"<ul class="l"><li>one</li></ul>"#);
    assert!(node.children[0].children[0].host.is_some());
}
