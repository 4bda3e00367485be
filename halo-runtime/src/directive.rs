use std::fmt;
use std::rc::Rc;

use halo_core::Path;
use halo_core::value::display;
use halo_dom::{Document, HostId, Node};
use halo_template::{EvalError, Scope, evaluate, evaluate_truthy};
use indexmap::IndexMap;
use serde_json::Value;

use crate::builtins;
use crate::error::DirectiveError;
use crate::events::Emitter;
use crate::listeners::{Action, ListenerTable};

/// Priority given to directives registered without one.
pub const DEFAULT_PRIORITY: i32 = 100;

pub type Handler = Rc<dyn Fn(&mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError>>;

#[derive(Clone)]
pub struct Directive {
    pub priority: i32,
    pub handler: Handler,
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Directive handlers by bare name (without the attribute prefix). Lower
/// priorities run first on a node.
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    entries: IndexMap<String, Directive>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `for`, `once`, `if`, `show`, `model`, `on`,
    /// `text`, `html` and `mask`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        builtins::install(&mut reg);
        reg
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> + 'static,
    {
        self.register_with_priority(name, DEFAULT_PRIORITY, handler);
    }

    /// Register or replace a directive.
    pub fn register_with_priority<F>(&mut self, name: impl Into<String>, priority: i32, handler: F)
    where
        F: Fn(&mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> + 'static,
    {
        self.insert(
            name,
            Directive {
                priority,
                handler: Rc::new(handler),
            },
        );
    }

    pub fn insert(&mut self, name: impl Into<String>, directive: Directive) {
        self.entries.insert(name.into(), directive);
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Work a handler asks for that needs the whole instance. Runs after the
/// current pass completes.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Set { path: String, value: Value },
    Call { method: String, args: Vec<Value> },
    Subscribe { event: String, method: String },
}

/// A request to expand the node once per item.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatPlan {
    pub alias: String,
    pub index: Option<String>,
    pub items: Vec<Value>,
    /// Data path of each item, parallel to `items`. `None` for items that
    /// do not live in the data model (ranges, computed lists).
    pub origins: Vec<Option<Path>>,
}

/// How the builder should treat the node after its directives ran.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    pub consume: bool,
    pub suppress_content: bool,
    pub content_replaced: bool,
    pub restore_children: bool,
    pub repeat: Option<RepeatPlan>,
}

/// Everything a handler may touch while processing one directive on one
/// node.
pub struct DirectiveContext<'a, 's> {
    pub document: &'a mut Document,
    pub node: &'a mut Node,
    pub host: HostId,
    /// Bare directive name.
    pub name: &'a str,
    /// Attribute value as written.
    pub raw: &'a str,
    /// Attribute value after interpolation.
    pub value: &'a str,
    pub scope: &'a Scope<'s>,
    pub(crate) emitter: &'a Emitter,
    pub(crate) listeners: &'a mut ListenerTable,
    pub(crate) effects: &'a mut Vec<Effect>,
    pub(crate) outcome: &'a mut Outcome,
}

impl DirectiveContext<'_, '_> {
    /// Evaluate the value as an expression.
    pub fn evaluate(&self) -> Result<Value, EvalError> {
        evaluate(self.value, self.scope)
    }

    /// Fail-closed truthiness of the value.
    pub fn truthy(&self) -> bool {
        evaluate_truthy(self.value, self.scope)
    }

    /// Display form of `path` in the current scope; empty when unresolvable.
    pub fn lookup_display(&self, path: &str) -> String {
        evaluate(path, self.scope)
            .map(|v| display(&v))
            .unwrap_or_default()
    }

    pub fn malformed(&self) -> DirectiveError {
        DirectiveError::Malformed {
            directive: self.name.to_string(),
            value: self.value.to_string(),
        }
    }

    /// Drop the directive from the node once this pass is done with it.
    pub fn consume(&mut self) {
        self.outcome.consume = true;
    }

    /// Do not render children or literal text for this node this pass.
    pub fn suppress_content(&mut self) {
        self.outcome.suppress_content = true;
    }

    /// The handler wrote the node's content itself.
    pub fn replace_content(&mut self) {
        self.outcome.content_replaced = true;
    }

    pub fn is_content_suppressed(&self) -> bool {
        self.outcome.suppress_content
    }

    /// Put the node's children back under its host, in tree order.
    pub fn restore_children(&mut self) {
        self.outcome.restore_children = true;
    }

    pub fn repeat(&mut self, plan: RepeatPlan) {
        self.outcome.repeat = Some(plan);
    }

    /// Attach a host listener; duplicates are ignored.
    pub fn listen(&mut self, event: &str, action: Action) -> bool {
        self.listeners.add(self.host, event, action)
    }

    /// Bind `event` on this element to write back to `path`, replacing any
    /// model binding it had before.
    pub fn bind_model(&mut self, event: &str, path: &str) -> bool {
        self.listeners.set_model(self.host, event, path)
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.emitter.has(event)
    }

    pub fn subscribe(&mut self, event: &str, method: &str) {
        self.effects.push(Effect::Subscribe {
            event: event.to_string(),
            method: method.to_string(),
        });
    }

    /// Queue a data write; it triggers one trailing rebuild.
    pub fn set_data(&mut self, path: &str, value: Value) {
        self.effects.push(Effect::Set {
            path: path.to_string(),
            value,
        });
    }

    pub fn call(&mut self, method: &str, args: Vec<Value>) {
        self.effects.push(Effect::Call {
            method: method.to_string(),
            args,
        });
    }
}
