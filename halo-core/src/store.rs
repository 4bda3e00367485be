use serde_json::{Map, Value};

use crate::path::{self, Path, PathError, Segment};

/// How far past the end of a list a write may land; the gap is padded
/// with `null`.
pub const MAX_INDEX_GAP: usize = 1024;

/// The mutable data model behind an instance.
///
/// Writes go through [`Store::set`] so the owner can follow every mutation
/// with a rebuild; the store itself never notifies anyone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    data: Map<String, Value>,
    version: u64,
}

impl Store {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data, version: 0 }
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Number of writes applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Read a key path. Malformed paths fall back to a literal key lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match Path::parse(key) {
            Ok(p) => self.get_path(&p),
            Err(_) => self.data.get(key),
        }
    }

    pub fn get_path(&self, p: &Path) -> Option<&Value> {
        let (first, rest) = p.segments().split_first()?;
        let head = self.data.get(&root_key(first))?;
        rest.iter().try_fold(head, |cur, seg| path::step(cur, seg))
    }

    /// Write a key path, creating intermediate containers. A key that does
    /// not parse as a path is stored verbatim.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), PathError> {
        match Path::parse(key) {
            Ok(p) => self.set_path(&p, value),
            Err(_) => {
                self.data.insert(key.to_string(), value);
                self.version += 1;
                Ok(())
            }
        }
    }

    /// Fails without touching the data when a list index lies more than
    /// [`MAX_INDEX_GAP`] past the end of its list.
    pub fn set_path(&mut self, p: &Path, value: Value) -> Result<(), PathError> {
        let Some((first, rest)) = p.segments().split_first() else {
            return Err(PathError::Empty);
        };
        let key = root_key(first);
        check(self.data.get(&key), rest)?;
        let slot = self.data.entry(key).or_insert(Value::Null);
        assign(slot, rest, value);
        self.version += 1;
        Ok(())
    }

    /// Replace the whole data model.
    pub fn replace(&mut self, data: Map<String, Value>) {
        self.data = data;
        self.version += 1;
    }
}

fn root_key(seg: &Segment) -> String {
    match seg {
        Segment::Key(k) => k.clone(),
        Segment::Index(i) => i.to_string(),
    }
}

/// Walk the path the way `assign` will, rejecting oversized indices
/// before anything is created.
fn check(slot: Option<&Value>, rest: &[Segment]) -> Result<(), PathError> {
    let Some((first, rest)) = rest.split_first() else {
        return Ok(());
    };
    let index = match (slot, first) {
        (Some(Value::Object(map)), Segment::Key(k)) => return check(map.get(k), rest),
        (Some(Value::Object(map)), Segment::Index(i)) => return check(map.get(&i.to_string()), rest),
        (Some(Value::Array(_)), Segment::Key(k)) => match k.parse::<usize>() {
            Ok(i) => i,
            Err(_) => return check(None, rest),
        },
        (_, Segment::Key(_)) => return check(None, rest),
        (_, Segment::Index(i)) => *i,
    };
    let items: &[Value] = match slot {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    let limit = items.len().saturating_add(MAX_INDEX_GAP);
    if index > limit {
        return Err(PathError::IndexTooLarge {
            index,
            len: items.len(),
        });
    }
    check(items.get(index), rest)
}

fn assign(slot: &mut Value, rest: &[Segment], value: Value) {
    let Some((first, rest)) = rest.split_first() else {
        *slot = value;
        return;
    };
    match first {
        Segment::Key(k) => {
            if let Value::Array(items) = slot {
                if let Ok(i) = k.parse::<usize>() {
                    return assign_index(items, i, rest, value);
                }
            }
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                let child = map.entry(k.clone()).or_insert(Value::Null);
                assign(child, rest, value);
            }
        }
        Segment::Index(i) => {
            if let Value::Object(map) = slot {
                let child = map.entry(i.to_string()).or_insert(Value::Null);
                return assign(child, rest, value);
            }
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                assign_index(items, *i, rest, value);
            }
        }
    }
}

fn assign_index(items: &mut Vec<Value>, i: usize, rest: &[Segment], value: Value) {
    if items.len() <= i {
        items.resize(i.saturating_add(1), Value::Null);
    }
    if let Some(slot) = items.get_mut(i) {
        assign(slot, rest, value);
    }
}
