#[derive(Debug, Clone, PartialEq)]
pub struct MarkupAttr {
    pub name: String,
    /// `None` for boolean attributes such as `disabled`.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element {
        tag: String,
        attrs: Vec<MarkupAttr>,
        children: Vec<MarkupNode>,
        self_closing: bool,
    },
    /// Raw text; `{{ }}` markers are kept verbatim.
    Text(String),
}
