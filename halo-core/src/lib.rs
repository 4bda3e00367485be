//! Data model primitives shared by the halo crates: JSON-backed values,
//! key paths, the mutable data store and per-instance lifecycle hooks.

pub mod lifecycle;
pub mod path;
pub mod store;
pub mod value;

pub use lifecycle::{Hooks, LifecycleState, Stage};
pub use path::{Path, PathError, Segment};
pub use store::Store;
pub use serde_json::{Map, Value};
