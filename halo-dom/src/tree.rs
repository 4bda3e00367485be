use crate::host::{Document, HostId, HostKind};
use crate::{Node, NodeKind};

/// Snapshot the host subtree at `root` as a [`Node`] tree bound to it.
/// Anchors are skipped; element `text` captures the text content.
pub fn build_tree(doc: &Document, root: HostId) -> Node {
    let mut node = match doc.kind(root) {
        HostKind::Text(t) => Node::text(t.clone()),
        HostKind::Element(tag) => {
            let mut n = Node::element(tag.clone());
            for (k, v) in doc.attributes(root) {
                n.attrs.insert(k, v);
            }
            n.text = doc.text_content(root);
            n.children = doc
                .children(root)
                .iter()
                .filter(|c| !matches!(doc.kind(**c), HostKind::Anchor))
                .map(|c| build_tree(doc, *c))
                .collect();
            n
        }
        HostKind::Anchor => Node::text(""),
    };
    node.host = Some(root);
    node
}

/// Create detached host nodes for `node` and its descendants, binding each
/// node to its host. Returns the host of `node`.
pub fn materialize(doc: &mut Document, node: &mut Node) -> HostId {
    let id = match &node.kind {
        NodeKind::Text => doc.create_text(node.text.clone()),
        NodeKind::Element(tag) => {
            let id = doc.create_element(tag.clone());
            for (k, v) in node.attrs.iter() {
                doc.set_attribute(id, k, v);
            }
            for child in &mut node.children {
                let c = materialize(doc, child);
                doc.append_child(id, c);
            }
            id
        }
    };
    node.host = Some(id);
    id
}
