use crate::host::HostId;

/// One observable change applied to a [`Document`](crate::Document).
/// Writes that would leave the document unchanged are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetAttr { node: HostId, name: String, value: String },
    RemoveAttr { node: HostId, name: String },
    SetText { node: HostId, text: String },
    SetHtml { node: HostId, html: String },
    SetValue { node: HostId, value: String },
    SetHidden { node: HostId, hidden: bool },
    Insert { parent: HostId, node: HostId },
    Remove { node: HostId },
}

impl Mutation {
    /// The host node the change was applied to.
    pub fn target(&self) -> HostId {
        match self {
            Mutation::SetAttr { node, .. }
            | Mutation::RemoveAttr { node, .. }
            | Mutation::SetText { node, .. }
            | Mutation::SetHtml { node, .. }
            | Mutation::SetValue { node, .. }
            | Mutation::SetHidden { node, .. }
            | Mutation::Insert { node, .. }
            | Mutation::Remove { node } => *node,
        }
    }
}
