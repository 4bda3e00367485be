//! Tree model for halo: the [`Node`] tree the builder walks, the in-memory
//! host [`Document`] nodes are materialized into, and the glue between them.

use indexmap::IndexMap;

pub mod host;
pub mod mutation;
pub mod style;
pub mod tree;

pub use host::{DEFAULT_LOG_LIMIT, Document, HostId, HostKind};
pub use mutation::Mutation;
pub use tree::{build_tree, materialize};

/// Tag reported for text leaves.
pub const TEXT_TAG: &str = "#text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(String),
    Text,
}

/// Per-node render metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    render_eligible: bool,
    frozen: bool,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            render_eligible: true,
            frozen: false,
        }
    }
}

impl Meta {
    pub fn render_eligible(&self) -> bool {
        self.render_eligible
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Toggle eligibility. A frozen node stays ineligible.
    pub fn set_render_eligible(&mut self, eligible: bool) {
        if !self.frozen {
            self.render_eligible = eligible;
        }
    }

    /// Make the node permanently ineligible.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.render_eligible = false;
    }
}

/// Insertion-ordered attribute map; names are unique, last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes {
    map: IndexMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.insert(k, v);
        self
    }
    pub fn insert(&mut self, k: impl Into<String>, v: impl Into<String>) {
        self.map.insert(k.into(), v.into());
    }
    pub fn get(&self, k: &str) -> Option<&str> {
        self.map.get(k).map(String::as_str)
    }
    pub fn contains(&self, k: &str) -> bool {
        self.map.contains_key(k)
    }
    /// Remove keeping the order of the remaining attributes.
    pub fn remove(&mut self, k: &str) -> Option<String> {
        self.map.shift_remove(k)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// Allow concise attribute creation
impl From<()> for Attributes {
    fn from(_: ()) -> Self {
        Attributes::default()
    }
}
impl From<Vec<(&str, &str)>> for Attributes {
    fn from(v: Vec<(&str, &str)>) -> Self {
        let mut a = Attributes::new();
        for (k, v) in v {
            a.insert(k, v);
        }
        a
    }
}

/// Keyed instances produced by an iteration directive. The template's
/// own host is swapped for `anchor`; instances follow it in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Repeat {
    pub anchor: HostId,
    pub items: Vec<RepeatItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatItem {
    pub key: String,
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Raw template for text leaves; a snapshot of the text content for
    /// elements.
    pub text: String,
    pub attrs: Attributes,
    pub children: Vec<Node>,
    pub meta: Meta,
    /// The host node this node governs. Not owned: the document owns it.
    pub host: Option<HostId>,
    pub repeat: Option<Repeat>,
}

impl Node {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Element(tag.into()),
            text: String::new(),
            attrs: Attributes::new(),
            children: Vec::new(),
            meta: Meta::default(),
            host: None,
            repeat: None,
        }
    }

    pub fn text(t: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            text: t.into(),
            ..Self::element("")
        }
    }

    pub fn tag(&self) -> &str {
        match &self.kind {
            NodeKind::Element(tag) => tag,
            NodeKind::Text => TEXT_TAG,
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Deep copy with no host bindings, repetition state or metadata, ready
    /// to be materialized again.
    pub fn detached(&self) -> Node {
        Node {
            kind: self.kind.clone(),
            text: self.text.clone(),
            attrs: self.attrs.clone(),
            children: self.children.iter().map(Node::detached).collect(),
            meta: Meta::default(),
            host: None,
            repeat: None,
        }
    }

    /// Host nodes this node contributes to its parent, in order.
    pub fn host_sequence(&self) -> Vec<HostId> {
        match &self.repeat {
            Some(r) => std::iter::once(r.anchor)
                .chain(r.items.iter().filter_map(|i| i.node.host))
                .collect(),
            None => self.host.into_iter().collect(),
        }
    }

    /// Every host governed by this node and its descendants, repetition
    /// anchors and instances included.
    pub fn hosts(&self) -> Vec<HostId> {
        let mut out = Vec::new();
        self.collect_hosts(&mut out);
        out
    }

    fn collect_hosts(&self, out: &mut Vec<HostId>) {
        out.extend(self.host);
        if let Some(r) = &self.repeat {
            out.push(r.anchor);
            for item in &r.items {
                item.node.collect_hosts(out);
            }
        }
        for c in &self.children {
            c.collect_hosts(out);
        }
    }
}

pub fn h(tag: impl Into<String>, attrs: impl Into<Attributes>, children: Vec<Node>) -> Node {
    Node {
        attrs: attrs.into(),
        children,
        ..Node::element(tag)
    }
}
pub fn text(t: impl Into<String>) -> Node {
    Node::text(t)
}
