use halo_dom::HostId;
use indexmap::IndexMap;

/// What a host listener does when its event fires. Stored as data so the
/// table never holds a reference back into the instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Invoke a method with the event payload.
    CallMethod(String),
    /// Write the element's current value to a data path.
    WriteModel(String),
}

/// Host-element listeners keyed by `(element, event)`.
#[derive(Debug, Default)]
pub struct ListenerTable {
    entries: IndexMap<(HostId, String), Vec<Action>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action`; returns false if the same action is already
    /// attached to this element and event.
    pub fn add(&mut self, host: HostId, event: impl Into<String>, action: Action) -> bool {
        let actions = self.entries.entry((host, event.into())).or_default();
        if actions.contains(&action) {
            return false;
        }
        actions.push(action);
        true
    }

    /// Point the element's model write-back for `event` at `path`. Any
    /// previous write-back is dropped; returns false when nothing changed.
    pub fn set_model(&mut self, host: HostId, event: impl Into<String>, path: &str) -> bool {
        let actions = self.entries.entry((host, event.into())).or_default();
        if actions.iter().any(|a| matches!(a, Action::WriteModel(p) if p == path)) {
            return false;
        }
        actions.retain(|a| !matches!(a, Action::WriteModel(_)));
        actions.push(Action::WriteModel(path.to_string()));
        true
    }

    pub fn has(&self, host: HostId, event: &str) -> bool {
        self.entries
            .get(&(host, event.to_string()))
            .is_some_and(|a| !a.is_empty())
    }

    pub fn matching(&self, host: HostId, event: &str) -> Vec<Action> {
        self.entries
            .get(&(host, event.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn remove(&mut self, host: HostId, event: &str) {
        self.entries.shift_remove(&(host, event.to_string()));
    }

    /// Drop every listener attached to one of `hosts`.
    pub fn forget(&mut self, hosts: &[HostId]) {
        if hosts.is_empty() {
            return;
        }
        self.entries.retain(|(host, _), _| !hosts.contains(host));
    }

    /// Total number of registered actions.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
