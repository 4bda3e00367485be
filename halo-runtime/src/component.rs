use std::rc::Rc;

use halo_core::{Hooks, Map, Value};
use halo_dom::{Document, Node};
use indexmap::IndexMap;

use crate::config::Config;
use crate::directive::{DirectiveContext, DirectiveRegistry};
use crate::error::DirectiveError;
use crate::instance::{Instance, Method, Options, RenderFn, Target};

pub type DataFactory = Rc<dyn Fn() -> Map<String, Value>>;

/// Reusable definition. Every instance built from it gets fresh data from
/// the factory and shares methods, hooks and directives.
#[derive(Clone, Default)]
pub struct ComponentDef {
    pub template: Option<String>,
    pub render: Option<RenderFn>,
    pub data: Option<DataFactory>,
    pub methods: IndexMap<String, Method>,
    pub hooks: Hooks,
    pub directives: DirectiveRegistry,
    pub config: Config,
}

impl ComponentDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn render(mut self, f: impl Fn() -> Vec<Node> + 'static) -> Self {
        self.render = Some(Rc::new(f));
        self
    }

    /// Factory for per-instance data. Non-object results give empty data.
    pub fn data(mut self, f: impl Fn() -> Value + 'static) -> Self {
        self.data = Some(Rc::new(move || match f() {
            Value::Object(map) => map,
            _ => Map::new(),
        }));
        self
    }

    pub fn method(mut self, name: impl Into<String>, f: impl Fn(&mut Instance, &[Value]) + 'static) -> Self {
        self.methods.insert(name.into(), Rc::new(f));
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn directive<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> + 'static,
    {
        self.directives.register(name, handler);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Options for a new instance, with data fresh from the factory.
    pub fn options(&self) -> Options {
        Options {
            el: None,
            document: None,
            template: self.template.clone(),
            render: self.render.clone(),
            data: self.data.as_ref().map(|f| f()).unwrap_or_default(),
            methods: self.methods.clone(),
            hooks: self.hooks.clone(),
            directives: self.directives.clone(),
            config: self.config.clone(),
        }
    }

    /// Create an instance in `document` and mount it at `target`.
    pub fn instantiate(&self, document: Document, target: impl Into<Target>) -> Instance {
        Instance::new(self.options().document(document).el(target))
    }
}
