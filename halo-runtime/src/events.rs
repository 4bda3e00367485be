use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Event name that receives every emitted event.
pub const WILDCARD: &str = "*";

pub type Callback = Rc<dyn Fn(&Value)>;

/// Something subscribed to an instance event.
#[derive(Clone)]
pub enum Subscriber {
    /// Call an instance method with the payload.
    Method(String),
    Callback(Callback),
}

impl Subscriber {
    pub fn callback(f: impl Fn(&Value) + 'static) -> Self {
        Subscriber::Callback(Rc::new(f))
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Subscriber::Method(a), Subscriber::Method(b)) => a == b,
            (Subscriber::Callback(a), Subscriber::Callback(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscriber::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Subscriber::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Named-event pub/sub owned by one instance.
#[derive(Debug, Default)]
pub struct Emitter {
    events: IndexMap<String, Vec<Subscriber>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, event: impl Into<String>, subscriber: Subscriber) {
        self.events.entry(event.into()).or_default().push(subscriber);
    }

    /// Subscribe unless an equal subscriber is already present.
    pub fn on_unique(&mut self, event: impl Into<String>, subscriber: Subscriber) -> bool {
        let subs = self.events.entry(event.into()).or_default();
        if subs.contains(&subscriber) {
            return false;
        }
        subs.push(subscriber);
        true
    }

    /// Remove one matching subscriber.
    pub fn off(&mut self, event: &str, subscriber: &Subscriber) -> bool {
        let Some(subs) = self.events.get_mut(event) else {
            return false;
        };
        match subs.iter().position(|s| s == subscriber) {
            Some(pos) => {
                subs.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Whether the event has ever been subscribed to.
    pub fn has(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    /// Drop every subscriber, keeping the known event names.
    pub fn remove_events(&mut self) {
        for subs in self.events.values_mut() {
            subs.clear();
        }
    }

    /// Subscribers for `event`, wildcard subscribers first.
    pub fn subscribers(&self, event: &str) -> Vec<Subscriber> {
        let wildcard = self.events.get(WILDCARD).into_iter().flatten();
        let named = if event == WILDCARD {
            None
        } else {
            self.events.get(event)
        };
        wildcard.chain(named.into_iter().flatten()).cloned().collect()
    }
}

/// Attach the event name to a payload. Objects get a `type` field; any
/// other non-null payload is wrapped as `detail`.
pub fn event_payload(event: &str, payload: Value) -> Value {
    let mut map = match payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("detail".into(), other);
            map
        }
    };
    map.insert("type".into(), Value::String(event.to_string()));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wildcard_runs_first() {
        let mut em = Emitter::new();
        em.on("save", Subscriber::Method("a".into()));
        em.on(WILDCARD, Subscriber::Method("b".into()));
        let subs = em.subscribers("save");
        assert_eq!(
            subs,
            vec![Subscriber::Method("b".into()), Subscriber::Method("a".into())]
        );
    }

    #[test]
    fn off_removes_by_identity() {
        let mut em = Emitter::new();
        let cb = Subscriber::callback(|_| {});
        em.on("x", cb.clone());
        em.on("x", Subscriber::callback(|_| {}));
        assert!(em.off("x", &cb));
        assert!(!em.off("x", &cb));
        assert_eq!(em.subscribers("x").len(), 1);
    }

    #[test]
    fn payload_gets_type() {
        assert_eq!(event_payload("go", json!({"a": 1})), json!({"a": 1, "type": "go"}));
        assert_eq!(event_payload("go", Value::Null), json!({"type": "go"}));
        assert_eq!(event_payload("go", json!(3)), json!({"detail": 3, "type": "go"}));
    }
}
