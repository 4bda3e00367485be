use halo_dom::{Document, HostKind, Mutation};

#[test]
fn parse_and_serialize() {
    let doc = Document::parse(r#"<div id="app"><p class="x">Hi &amp; bye</p><br></div>"#).unwrap();
    let app = doc.query_selector("#app").unwrap();
    assert_eq!(
        doc.outer_html(app),
        r#"<div id="app"><p class="x">Hi &amp; bye</p><br></div>"#
    );
    assert_eq!(doc.text_content(app), "Hi & bye");
    let p = doc.query_selector(".x").unwrap();
    assert_eq!(doc.tag(p), Some("p"));
    assert_eq!(doc.query_selector("span"), None);
}

#[test]
fn unchanged_writes_are_not_logged() {
    let mut doc = Document::parse("<p title=\"a\">x</p>").unwrap();
    let p = doc.query_selector("p").unwrap();
    assert!(!doc.set_attribute(p, "title", "a"));
    assert!(!doc.set_text_content(p, "x"));
    assert!(doc.mutations().is_empty());

    assert!(doc.set_attribute(p, "title", "b"));
    assert!(doc.set_text_content(p, "y"));
    let log = doc.take_mutations();
    assert_eq!(log.len(), 2);
    assert!(matches!(&log[0], Mutation::SetAttr { value, .. } if value == "b"));
    assert!(doc.mutations().is_empty());
}

#[test]
fn hidden_merges_into_style() {
    let mut doc = Document::parse(r#"<p style="color: red">x</p>"#).unwrap();
    let p = doc.query_selector("p").unwrap();
    doc.set_hidden(p, true);
    assert_eq!(doc.style(p).as_deref(), Some("color: red; display: none;"));
    assert!(doc.outer_html(p).contains("display: none"));
    assert_eq!(doc.text_content(p), "x");
    doc.set_hidden(p, false);
    assert_eq!(doc.style(p).as_deref(), Some("color: red"));
}

#[test]
fn inner_html_replaces_children_once() {
    let mut doc = Document::parse("<div></div>").unwrap();
    let div = doc.query_selector("div").unwrap();
    assert_eq!(doc.set_inner_html(div, "<b>bold</b>"), Ok(true));
    assert_eq!(doc.set_inner_html(div, "<b>bold</b>"), Ok(false));
    assert_eq!(doc.inner_html(div), "<b>bold</b>");
    assert!(doc.set_inner_html(div, "<b").is_err());
    assert_eq!(doc.inner_html(div), "<b>bold</b>");
}

#[test]
fn detach_and_reinsert_keep_node() {
    let mut doc = Document::parse("<ul><li>a</li><li>b</li></ul>").unwrap();
    let ul = doc.query_selector("ul").unwrap();
    let kids = doc.children(ul).to_vec();
    assert!(doc.detach(kids[0]));
    assert!(!doc.is_attached(kids[0]));
    assert!(doc.insert_after(kids[1], kids[0]));
    assert_eq!(doc.inner_html(ul), "<li>b</li><li>a</li>");
    assert_eq!(doc.next_sibling(kids[1]), Some(kids[0]));
}

#[test]
fn anchors_render_nothing() {
    let mut doc = Document::parse("<ul><li>a</li></ul>").unwrap();
    let ul = doc.query_selector("ul").unwrap();
    let li = doc.children(ul)[0];
    let anchor = doc.create_anchor();
    doc.insert_after(li, anchor);
    assert_eq!(doc.kind(anchor), &HostKind::Anchor);
    assert_eq!(doc.inner_html(ul), "<li>a</li>");
}

#[test]
fn replace_children_logs_only_changes() {
    let mut doc = Document::parse("<div><i></i><b></b></div>").unwrap();
    let div = doc.query_selector("div").unwrap();
    let kids = doc.children(div).to_vec();
    assert!(!doc.replace_children(div, &kids));
    assert!(doc.replace_children(div, &kids[1..]));
    assert_eq!(doc.take_mutations(), vec![Mutation::Remove { node: kids[0] }]);
}

#[test]
fn text_updates_reuse_the_lone_text_child() {
    let mut doc = Document::parse("<p>0</p>").unwrap();
    let p = doc.query_selector("p").unwrap();
    let slots = doc.len();
    for i in 1..500 {
        assert!(doc.set_text_content(p, &i.to_string()));
    }
    assert_eq!(doc.len(), slots);
    assert_eq!(doc.inner_html(p), "499");

    assert!(doc.set_text_content(p, ""));
    assert!(doc.children(p).is_empty());
    assert!(doc.set_text_content(p, "back"));
    assert_eq!(doc.text_content(p), "back");
}

#[test]
fn generated_markup_is_released_when_replaced() {
    let mut doc = Document::parse("<div><span>kept</span></div>").unwrap();
    let div = doc.query_selector("div").unwrap();
    let original = doc.children(div).to_vec();

    doc.set_inner_html(div, "<b>a</b><i>b</i>").unwrap();
    // parsed children are not generated, so they survive detached
    assert!(!doc.is_released(original[0]));

    let slots = doc.len();
    for n in 0..100 {
        doc.set_inner_html(div, &format!("<b>{n}</b><i>x</i>")).unwrap();
    }
    assert_eq!(doc.len(), slots);
    assert_eq!(doc.inner_html(div), "<b>99</b><i>x</i>");

    // adopting the content through append stops automatic release
    let b = doc.children(div)[0];
    doc.append_child(div, original[0]);
    doc.set_inner_html(div, "<u>u</u>").unwrap();
    assert!(!doc.is_released(b));
}

#[test]
fn release_frees_a_subtree_for_reuse() {
    let mut doc = Document::parse("<ul><li><b>a</b></li><li>b</li></ul>").unwrap();
    let ul = doc.query_selector("ul").unwrap();
    let first = doc.children(ul)[0];
    let live = doc.live_count();

    let freed = doc.release(first);
    assert_eq!(freed.len(), 3);
    assert!(freed.contains(&first));
    assert_eq!(doc.children(ul).len(), 1);
    assert_eq!(doc.live_count(), live - 3);
    assert!(doc.release(first).is_empty());
    assert!(doc.release(doc.body()).is_empty());

    let slots = doc.len();
    let again = doc.create_element("li");
    assert!(freed.contains(&again));
    assert!(!doc.is_released(again));
    assert_eq!(doc.len(), slots);
}

#[test]
fn mutation_log_is_capped() {
    let mut doc = Document::parse("<p></p>").unwrap();
    let p = doc.query_selector("p").unwrap();
    doc.set_log_limit(Some(10));
    for i in 0..100 {
        doc.set_attribute(p, "n", &i.to_string());
    }
    let log = doc.mutations();
    assert!(log.len() >= 10 && log.len() <= 20);
    assert!(matches!(log.last(), Some(Mutation::SetAttr { value, .. }) if value == "99"));

    doc.set_log_limit(None);
    for i in 0..100 {
        doc.set_attribute(p, "m", &i.to_string());
    }
    assert!(doc.mutations().len() >= 100);
}

#[test]
fn fragments_stay_detached_until_placed() {
    let mut doc = Document::new();
    let ids = doc.parse_fragment("<p>a</p>tail").unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|&id| !doc.is_attached(id)));
    assert!(doc.mutations().is_empty());
    assert!(doc.parse_fragment("<p").is_err());
}
