use halo_template::markup::{escape_attr, escape_text};
use halo_template::{MarkupError, MarkupNode, is_void_element, parse_markup};
use indexmap::IndexMap;

use crate::mutation::Mutation;
use crate::style::{SimpleSelector, merge_styles};

/// Handle to a node in a [`Document`]. Only meaningful for the document
/// that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(usize);

impl HostId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostKind {
    Element(String),
    Text(String),
    /// Invisible position marker (renders as nothing).
    Anchor,
}

#[derive(Debug, Clone)]
struct HostNode {
    kind: HostKind,
    attrs: IndexMap<String, String>,
    hidden: bool,
    value: Option<String>,
    // last markup written through set_inner_html, while still current
    html_source: Option<String>,
    // children were made by set_text_content/set_inner_html and are
    // referenced from nowhere else
    generated: bool,
    released: bool,
    parent: Option<HostId>,
    children: Vec<HostId>,
}

impl HostNode {
    fn new(kind: HostKind) -> Self {
        Self {
            kind,
            attrs: IndexMap::new(),
            hidden: false,
            value: None,
            html_source: None,
            generated: false,
            released: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Entries the mutation log keeps by default before dropping old ones.
pub const DEFAULT_LOG_LIMIT: usize = 4096;

/// In-memory materialized document: an arena of host nodes under a
/// `body` root. Detached nodes stay in the arena and can be re-attached
/// until they are [released](Document::release); content replaced by
/// `set_text_content` or `set_inner_html` is released automatically when
/// it was generated by one of them.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<HostNode>,
    free: Vec<HostId>,
    body: HostId,
    log: Vec<Mutation>,
    log_limit: Option<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![HostNode::new(HostKind::Element("body".into()))],
            free: Vec::new(),
            body: HostId(0),
            log: Vec::new(),
            log_limit: Some(DEFAULT_LOG_LIMIT),
        }
    }

    /// A document whose body holds the parsed `markup`.
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        let mut doc = Self::new();
        let body = doc.body;
        for node in parse_markup(markup)? {
            let id = doc.build(&node);
            doc.link(body, id);
        }
        Ok(doc)
    }

    pub fn body(&self) -> HostId {
        self.body
    }

    /// Arena slots in use or waiting for reuse.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that have not been released.
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_released(&self, id: HostId) -> bool {
        self.nodes[id.0].released
    }

    /// Always false: the body is never removed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ----- mutation log -----

    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    /// Cap the log. At least the `limit` most recent entries are kept;
    /// older ones are dropped in batches. `None` keeps everything.
    pub fn set_log_limit(&mut self, limit: Option<usize>) {
        self.log_limit = limit;
        self.trim_log();
    }

    fn record(&mut self, m: Mutation) {
        self.record(m);
        self.trim_log();
    }

    fn trim_log(&mut self) {
        if let Some(limit) = self.log_limit {
            if self.log.len() > limit.saturating_mul(2) {
                let excess = self.log.len() - limit;
                self.log.drain(..excess);
            }
        }
    }

    // ----- creation (detached, unlogged) -----

    pub fn create_element(&mut self, tag: impl Into<String>) -> HostId {
        self.alloc(HostKind::Element(tag.into()))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> HostId {
        self.alloc(HostKind::Text(text.into()))
    }

    pub fn create_anchor(&mut self) -> HostId {
        self.alloc(HostKind::Anchor)
    }

    fn alloc(&mut self, kind: HostKind) -> HostId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = HostNode::new(kind);
            return id;
        }
        self.nodes.push(HostNode::new(kind));
        HostId(self.nodes.len() - 1)
    }

    /// Detach `id` and hand it and its descendants back to the arena.
    /// Returns the released handles; none of them may be used again.
    /// The body and already released nodes are left alone.
    pub fn release(&mut self, id: HostId) -> Vec<HostId> {
        let mut out = Vec::new();
        if id == self.body || self.nodes[id.0].released {
            return out;
        }
        self.detach(id);
        self.free_subtree(id, &mut out);
        out
    }

    fn free_subtree(&mut self, id: HostId, out: &mut Vec<HostId>) {
        for c in std::mem::take(&mut self.nodes[id.0].children) {
            self.free_subtree(c, out);
        }
        let mut slot = HostNode::new(HostKind::Anchor);
        slot.released = true;
        self.nodes[id.0] = slot;
        self.free.push(id);
        out.push(id);
    }

    /// Drop every child of `id`, releasing them when they were generated.
    fn clear_children(&mut self, id: HostId) {
        let generated = std::mem::take(&mut self.nodes[id.0].generated);
        for old in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[old.0].parent = None;
            if generated {
                self.free_subtree(old, &mut Vec::new());
            }
        }
    }

    /// Build detached host nodes for `markup`, in order. The caller owns
    /// them; nothing is logged.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<Vec<HostId>, MarkupError> {
        let parsed = parse_markup(markup)?;
        Ok(parsed.iter().map(|node| self.build(node)).collect())
    }

    fn build(&mut self, markup: &MarkupNode) -> HostId {
        match markup {
            MarkupNode::Text(t) => self.create_text(t.clone()),
            MarkupNode::Element {
                tag,
                attrs,
                children,
                ..
            } => {
                let id = self.create_element(tag.clone());
                for a in attrs {
                    self.nodes[id.0]
                        .attrs
                        .insert(a.name.clone(), a.value.clone().unwrap_or_default());
                }
                for c in children {
                    let child = self.build(c);
                    self.link(id, child);
                }
                id
            }
        }
    }

    // ----- structure -----

    pub fn kind(&self, id: HostId) -> &HostKind {
        &self.nodes[id.0].kind
    }

    pub fn tag(&self, id: HostId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            HostKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn parent(&self, id: HostId) -> Option<HostId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: HostId) -> &[HostId] {
        &self.nodes[id.0].children
    }

    pub fn next_sibling(&self, id: HostId) -> Option<HostId> {
        let parent = self.parent(id)?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Whether `id` is reachable from the body.
    pub fn is_attached(&self, id: HostId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == self.body {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    pub fn append_child(&mut self, parent: HostId, child: HostId) {
        self.unlink(child);
        self.link(parent, child);
        self.nodes[parent.0].html_source = None;
        self.nodes[parent.0].generated = false;
        self.record(Mutation::Insert { parent, node: child });
    }

    /// Insert `child` right after `reference` under the same parent.
    /// Returns false when `reference` is detached.
    pub fn insert_after(&mut self, reference: HostId, child: HostId) -> bool {
        if reference == child {
            return false;
        }
        self.unlink(child);
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings
            .iter()
            .position(|c| *c == reference)
            .map_or(siblings.len(), |p| p + 1);
        siblings.insert(pos, child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].html_source = None;
        self.nodes[parent.0].generated = false;
        self.record(Mutation::Insert { parent, node: child });
        true
    }

    /// Detach `id` from its parent; the node stays in the arena.
    pub fn detach(&mut self, id: HostId) -> bool {
        let Some(parent) = self.unlink(id) else {
            return false;
        };
        self.nodes[parent.0].html_source = None;
        self.record(Mutation::Remove { node: id });
        true
    }

    /// Make `children` the exact child list of `id`, detaching the rest.
    pub fn replace_children(&mut self, id: HostId, children: &[HostId]) -> bool {
        if self.nodes[id.0].children == children {
            return false;
        }
        let generated = std::mem::take(&mut self.nodes[id.0].generated);
        for old in self.nodes[id.0].children.clone() {
            if !children.contains(&old) {
                self.nodes[old.0].parent = None;
                self.record(Mutation::Remove { node: old });
                if generated {
                    self.free_subtree(old, &mut Vec::new());
                }
            }
        }
        self.nodes[id.0].children.clear();
        for &c in children {
            let already_here = self.nodes[c.0].parent == Some(id);
            self.unlink(c);
            self.link(id, c);
            if !already_here {
                self.record(Mutation::Insert { parent: id, node: c });
            }
        }
        self.nodes[id.0].html_source = None;
        true
    }

    fn link(&mut self, parent: HostId, child: HostId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn unlink(&mut self, child: HostId) -> Option<HostId> {
        let parent = self.nodes[child.0].parent.take()?;
        let node = &mut self.nodes[parent.0];
        node.children.retain(|c| *c != child);
        // someone else holds the child now
        node.generated = false;
        Some(parent)
    }

    // ----- attributes -----

    pub fn attribute(&self, id: HostId, name: &str) -> Option<&str> {
        self.nodes[id.0].attrs.get(name).map(String::as_str)
    }

    pub fn attributes(&self, id: HostId) -> impl Iterator<Item = (&str, &str)> {
        self.nodes[id.0]
            .attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns false when the attribute already had this value.
    pub fn set_attribute(&mut self, id: HostId, name: &str, value: &str) -> bool {
        let node = &mut self.nodes[id.0];
        if !matches!(node.kind, HostKind::Element(_)) {
            return false;
        }
        if node.attrs.get(name).is_some_and(|v| v == value) {
            return false;
        }
        node.attrs.insert(name.to_string(), value.to_string());
        self.record(Mutation::SetAttr {
            node: id,
            name: name.to_string(),
            value: value.to_string(),
        });
        true
    }

    pub fn remove_attribute(&mut self, id: HostId, name: &str) -> bool {
        if self.nodes[id.0].attrs.shift_remove(name).is_none() {
            return false;
        }
        self.record(Mutation::RemoveAttr {
            node: id,
            name: name.to_string(),
        });
        true
    }

    // ----- display / value -----

    pub fn is_hidden(&self, id: HostId) -> bool {
        self.nodes[id.0].hidden
    }

    /// Suppress (or restore) display without touching content.
    pub fn set_hidden(&mut self, id: HostId, hidden: bool) -> bool {
        let node = &mut self.nodes[id.0];
        if node.hidden == hidden || !matches!(node.kind, HostKind::Element(_)) {
            return false;
        }
        node.hidden = hidden;
        self.record(Mutation::SetHidden { node: id, hidden });
        true
    }

    /// Effective inline style, including display suppression.
    pub fn style(&self, id: HostId) -> Option<String> {
        let node = &self.nodes[id.0];
        let inline = node.attrs.get("style").map(String::as_str);
        if node.hidden {
            Some(merge_styles(inline, &[("display", "none")]))
        } else {
            inline.map(str::to_string)
        }
    }

    pub fn value(&self, id: HostId) -> Option<&str> {
        self.nodes[id.0].value.as_deref()
    }

    pub fn set_value(&mut self, id: HostId, value: &str) -> bool {
        let node = &mut self.nodes[id.0];
        if node.value.as_deref() == Some(value) {
            return false;
        }
        node.value = Some(value.to_string());
        self.record(Mutation::SetValue {
            node: id,
            value: value.to_string(),
        });
        true
    }

    // ----- content -----

    pub fn text_content(&self, id: HostId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: HostId, out: &mut String) {
        match &self.nodes[id.0].kind {
            HostKind::Text(t) => out.push_str(t),
            HostKind::Anchor => {}
            HostKind::Element(_) => {
                for &c in &self.nodes[id.0].children {
                    self.collect_text(c, out);
                }
            }
        }
    }

    /// Text nodes get their data replaced; elements lose their children
    /// in favour of a single text node (none for an empty string).
    pub fn set_text_content(&mut self, id: HostId, text: &str) -> bool {
        match &self.nodes[id.0].kind {
            HostKind::Anchor => false,
            HostKind::Text(current) => {
                if current == text {
                    return false;
                }
                self.nodes[id.0].kind = HostKind::Text(text.to_string());
                self.record(Mutation::SetText {
                    node: id,
                    text: text.to_string(),
                });
                true
            }
            HostKind::Element(_) => {
                if self.holds_only_text(id, text) {
                    return false;
                }
                match self.lone_text_child(id) {
                    Some(t) if !text.is_empty() => {
                        self.nodes[t.0].kind = HostKind::Text(text.to_string());
                    }
                    _ => {
                        self.clear_children(id);
                        if !text.is_empty() {
                            let t = self.create_text(text);
                            self.link(id, t);
                            self.nodes[id.0].generated = true;
                        }
                    }
                }
                self.nodes[id.0].html_source = None;
                self.record(Mutation::SetText {
                    node: id,
                    text: text.to_string(),
                });
                true
            }
        }
    }

    fn lone_text_child(&self, id: HostId) -> Option<HostId> {
        match self.nodes[id.0].children.as_slice() {
            [only] if matches!(self.nodes[only.0].kind, HostKind::Text(_)) => Some(*only),
            _ => None,
        }
    }

    fn holds_only_text(&self, id: HostId, text: &str) -> bool {
        let children = &self.nodes[id.0].children;
        match children.as_slice() {
            [] => text.is_empty(),
            [only] => matches!(&self.nodes[only.0].kind, HostKind::Text(t) if t == text),
            _ => false,
        }
    }

    pub fn inner_html(&self, id: HostId) -> String {
        let mut out = String::new();
        for &c in &self.nodes[id.0].children {
            self.serialize(c, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: HostId) -> String {
        let mut out = String::new();
        self.serialize(id, &mut out);
        out
    }

    /// Replace the children of `id` with parsed `markup`. No sanitization
    /// is performed. Rewriting the same markup again is a no-op.
    pub fn set_inner_html(&mut self, id: HostId, markup: &str) -> Result<bool, MarkupError> {
        if self.nodes[id.0].html_source.as_deref() == Some(markup) {
            return Ok(false);
        }
        let parsed = parse_markup(markup)?;
        self.clear_children(id);
        for node in &parsed {
            let child = self.build(node);
            self.link(id, child);
        }
        self.nodes[id.0].generated = true;
        self.nodes[id.0].html_source = Some(markup.to_string());
        self.record(Mutation::SetHtml {
            node: id,
            html: markup.to_string(),
        });
        Ok(true)
    }

    fn serialize(&self, id: HostId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.kind {
            HostKind::Anchor => {}
            HostKind::Text(t) => out.push_str(&escape_text(t)),
            HostKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                let style = self.style(id);
                let mut wrote_style = false;
                for (k, v) in &node.attrs {
                    let v = if k == "style" {
                        wrote_style = true;
                        style.as_deref().unwrap_or(v)
                    } else {
                        v.as_str()
                    };
                    push_attr(out, k, v);
                }
                if !wrote_style {
                    if let Some(s) = &style {
                        push_attr(out, "style", s);
                    }
                }
                out.push('>');
                if is_void_element(tag) && node.children.is_empty() {
                    return;
                }
                for &c in &node.children {
                    self.serialize(c, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    // ----- queries -----

    /// First element in document order matching a simple selector
    /// (`tag`, `.class` or `#id`).
    pub fn query_selector(&self, selector: &str) -> Option<HostId> {
        let sel = SimpleSelector::parse(selector)?;
        self.find(self.body, &sel)
    }

    fn find(&self, id: HostId, sel: &SimpleSelector) -> Option<HostId> {
        let node = &self.nodes[id.0];
        if let HostKind::Element(tag) = &node.kind {
            let attr = |k: &str| node.attrs.get(k).map(String::as_str);
            if sel.matches(tag, attr("id"), attr("class")) {
                return Some(id);
            }
        }
        node.children.iter().find_map(|&c| self.find(c, sel))
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    if !value.is_empty() {
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
}
