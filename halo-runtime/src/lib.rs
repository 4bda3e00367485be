//! Reactive runtime for halo: directive dispatch, the rebuild pass over a
//! mounted tree, keyed iteration, and the instance that ties data, methods
//! and lifecycle hooks to a document.

mod builtins;
mod builder;
pub mod component;
pub mod config;
pub mod directive;
pub mod error;
pub mod events;
pub mod instance;
pub mod listeners;
mod repeat;

pub use component::ComponentDef;
pub use config::Config;
pub use directive::{DirectiveContext, DirectiveRegistry, Effect, RepeatPlan};
pub use error::{DirectiveError, RuntimeError};
pub use events::{Emitter, Subscriber};
pub use instance::{Instance, Options, Target};
pub use listeners::{Action, ListenerTable};
pub use repeat::INDEX_VAR;
