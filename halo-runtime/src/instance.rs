use std::fmt;
use std::rc::Rc;

use halo_core::{Hooks, LifecycleState, Map, Stage, Store, Value};
use halo_dom::{Document, HostId, Node, build_tree, materialize};
use halo_template::Scope;
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::builder::{BuildCx, rebuild};
use crate::config::Config;
use crate::directive::{DirectiveContext, DirectiveRegistry, Effect};
use crate::error::{DirectiveError, RuntimeError};
use crate::events::{Emitter, Subscriber, event_payload};
use crate::listeners::{Action, ListenerTable};

/// Trailing passes allowed after one write before giving up.
pub const MAX_TRAILING_BUILDS: usize = 8;

pub type Method = Rc<dyn Fn(&mut Instance, &[Value])>;
/// Produces the nodes mounted under the root, in place of its markup.
pub type RenderFn = Rc<dyn Fn() -> Vec<Node>>;

/// Where to mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Selector(String),
    Element(HostId),
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::Selector(s.to_string())
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Target::Selector(s)
    }
}

impl From<HostId> for Target {
    fn from(id: HostId) -> Self {
        Target::Element(id)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Selector(s) => f.write_str(s),
            Target::Element(id) => write!(f, "element #{}", id.index()),
        }
    }
}

/// Construction options for an [`Instance`].
#[derive(Clone, Default)]
pub struct Options {
    pub el: Option<Target>,
    pub document: Option<Document>,
    pub template: Option<String>,
    pub render: Option<RenderFn>,
    pub data: Map<String, Value>,
    pub methods: IndexMap<String, Method>,
    pub hooks: Hooks,
    pub directives: DirectiveRegistry,
    pub config: Config,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn el(mut self, target: impl Into<Target>) -> Self {
        self.el = Some(target.into());
        self
    }

    pub fn document(mut self, doc: Document) -> Self {
        self.document = Some(doc);
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn render(mut self, f: impl Fn() -> Vec<Node> + 'static) -> Self {
        self.render = Some(Rc::new(f));
        self
    }

    /// Initial data; anything but an object is ignored.
    pub fn data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = map;
        }
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
}

/// A mounted template bound to its own data, methods and document.
pub struct Instance {
    config: Config,
    store: Store,
    hooks: Hooks,
    methods: IndexMap<String, Method>,
    directives: DirectiveRegistry,
    emitter: Emitter,
    listeners: ListenerTable,
    document: Document,
    template: Option<String>,
    render: Option<RenderFn>,
    root: Option<HostId>,
    tree: Option<Node>,
    state: LifecycleState,
    rebuilds: usize,
    building: bool,
    pending: bool,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("state", &self.state)
            .field("root", &self.root)
            .field("rebuilds", &self.rebuilds)
            .finish_non_exhaustive()
    }
}

impl Instance {
    /// Build an instance; runs `created` and, when a target is given,
    /// mounts. A failed mount is logged and leaves the instance unmounted.
    pub fn new(opts: Options) -> Self {
        let mut directives = DirectiveRegistry::with_builtins();
        for name in opts.directives.names() {
            if let Some(d) = opts.directives.get(name) {
                directives.insert(name, d.clone());
            }
        }
        let mut vm = Instance {
            config: opts.config,
            store: Store::new(opts.data),
            hooks: opts.hooks,
            methods: opts.methods,
            directives,
            emitter: Emitter::new(),
            listeners: ListenerTable::new(),
            document: opts.document.unwrap_or_default(),
            template: opts.template,
            render: opts.render,
            root: None,
            tree: None,
            state: LifecycleState::Uninitialized,
            rebuilds: 0,
            building: false,
            pending: false,
        };
        if !vm.config.silent {
            info!("halo instance created");
        }
        vm.hooks.run(Stage::Created);
        if let Some(target) = opts.el {
            // mount logs its own failures
            let _ = vm.mount(target);
        }
        vm
    }

    /// Attach to `target`, build the tree and run the first pass. A
    /// template replaces the target's content; otherwise its existing
    /// markup is used.
    pub fn mount(&mut self, target: impl Into<Target>) -> Result<(), RuntimeError> {
        let target = target.into();
        match self.state {
            LifecycleState::Destroyed => {
                debug!(%target, "mount ignored on a destroyed instance");
                return Ok(());
            }
            LifecycleState::Mounted => {
                debug!(%target, "instance already mounted");
                return Ok(());
            }
            LifecycleState::Uninitialized => {}
        }
        let Some(root) = self.resolve(&target) else {
            error!(%target, "mount target not found");
            return Err(RuntimeError::MissingElement(target.to_string()));
        };

        if let Some(template) = &self.template {
            let hosts = match self.document.parse_fragment(template) {
                Ok(hosts) => hosts,
                Err(err) => {
                    error!(%target, %err, "template rejected; instance left unmounted");
                    return Err(err.into());
                }
            };
            self.document.replace_children(root, &hosts);
        } else if let Some(render) = self.render.clone() {
            self.document.replace_children(root, &[]);
            for mut node in render() {
                let id = materialize(&mut self.document, &mut node);
                self.document.append_child(root, id);
            }
        }

        self.root = Some(root);
        self.tree = Some(build_tree(&self.document, root));
        self.state = LifecycleState::Mounted;
        self.build();
        if !self.config.silent {
            info!(%target, "mounted");
        }
        self.hooks.run(Stage::Mounted);
        Ok(())
    }

    fn resolve(&self, target: &Target) -> Option<HostId> {
        match target {
            Target::Selector(sel) => self.document.query_selector(sel),
            Target::Element(id) => (id.index() < self.document.len()).then_some(*id),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.store.get(path)
    }

    pub fn data(&self) -> &Map<String, Value> {
        self.store.data()
    }

    /// Store `value` at `path`. While live this runs one rebuild and then
    /// the `updated` hooks; after destruction the value is only stored.
    /// A rejected path is logged and changes nothing.
    pub fn set(&mut self, path: &str, value: Value) {
        if let Err(err) = self.store.set(path, value) {
            warn!(path, %err, "write rejected");
            return;
        }
        if !self.state.is_live() {
            return;
        }
        if self.building {
            // folded into the running build's trailing pass
            self.pending = true;
            return;
        }
        self.build();
        self.hooks.run(Stage::Updated);
    }

    /// Invoke a registered method by name.
    pub fn call_method(&mut self, name: &str, args: &[Value]) -> Result<(), RuntimeError> {
        let method = self
            .methods
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownMethod(name.to_string()))?;
        method(self, args);
        Ok(())
    }

    /// Fire host listeners for `event` on `host`. All listeners run; the
    /// first failure is returned.
    pub fn dispatch(&mut self, host: HostId, event: &str, payload: Value) -> Result<usize, RuntimeError> {
        let actions = self.listeners.matching(host, event);
        let payload = event_payload(event, payload);
        let mut first_err = None;
        for action in &actions {
            let res = match action {
                Action::CallMethod(name) => self.call_method(name, std::slice::from_ref(&payload)),
                Action::WriteModel(path) => {
                    let value = self.document.value(host).unwrap_or_default().to_string();
                    self.set(path, Value::String(value));
                    Ok(())
                }
            };
            if let Err(err) = res {
                warn!(event, %err, "listener failed");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(actions.len()),
        }
    }

    /// Simulate user input: set the element's value, then fire `input`.
    pub fn input(&mut self, host: HostId, value: &str) -> Result<usize, RuntimeError> {
        self.document.set_value(host, value);
        self.dispatch(host, "input", serde_json::json!({ "value": value }))
    }

    /// Subscribe a callback; the returned handle removes it via [`off`](Self::off).
    pub fn on(&mut self, event: impl Into<String>, f: impl Fn(&Value) + 'static) -> Subscriber {
        let sub = Subscriber::callback(f);
        self.emitter.on(event, sub.clone());
        sub
    }

    pub fn on_method(&mut self, event: impl Into<String>, method: impl Into<String>) {
        self.emitter.on_unique(event, Subscriber::Method(method.into()));
    }

    pub fn off(&mut self, event: &str, subscriber: &Subscriber) -> bool {
        self.emitter.off(event, subscriber)
    }

    /// Emit to `*` subscribers and then to `event` subscribers. Returns how
    /// many ran.
    pub fn emit(&mut self, event: &str, payload: Value) -> usize {
        let payload = event_payload(event, payload);
        let subs = self.emitter.subscribers(event);
        for sub in &subs {
            match sub {
                Subscriber::Callback(f) => f(&payload),
                Subscriber::Method(name) => {
                    if let Err(err) = self.call_method(name, std::slice::from_ref(&payload)) {
                        warn!(event, %err, "subscriber failed");
                    }
                }
            }
        }
        subs.len()
    }

    /// Register a directive on this instance only.
    pub fn directive<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> + 'static,
    {
        self.directives.register(name, handler);
    }

    /// Tear down: drop subscriptions, listeners and the tree, then run the
    /// `destroyed` hooks. Later calls do nothing.
    pub fn destroy(&mut self) {
        if self.state == LifecycleState::Destroyed {
            return;
        }
        self.emitter.remove_events();
        self.listeners.clear();
        self.tree = None;
        self.state = LifecycleState::Destroyed;
        self.hooks.run(Stage::Destroyed);
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn root(&self) -> Option<HostId> {
        self.root
    }

    pub fn tree(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    /// Number of rebuild passes run so far, trailing passes included.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    /// Rendered markup of the mount root.
    pub fn html(&self) -> String {
        self.root
            .map(|r| self.document.inner_html(r))
            .unwrap_or_default()
    }

    /// Run passes until no deferred write remains, up to the trailing cap.
    fn build(&mut self) {
        if self.tree.is_none() {
            return;
        }
        self.building = true;
        let mut trailing = 0;
        loop {
            let effects = self.pass();
            let dirty = self.apply(effects) | std::mem::take(&mut self.pending);
            if !dirty {
                break;
            }
            if trailing == MAX_TRAILING_BUILDS {
                warn!(passes = trailing, "trailing rebuilds capped; output may be stale");
                break;
            }
            trailing += 1;
        }
        self.building = false;
    }

    /// One walk over the root's children.
    fn pass(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(mut tree) = self.tree.take() else {
            return effects;
        };
        {
            let scope = Scope::new(self.store.data());
            let mut cx = BuildCx {
                doc: &mut self.document,
                registry: &self.directives,
                emitter: &self.emitter,
                listeners: &mut self.listeners,
                config: &self.config,
                effects: &mut effects,
            };
            for child in &mut tree.children {
                rebuild(&mut cx, child, &scope);
            }
        }
        self.tree = Some(tree);
        self.rebuilds += 1;
        effects
    }

    /// Run deferred effects; true when data was written.
    fn apply(&mut self, effects: Vec<Effect>) -> bool {
        let mut dirty = false;
        for effect in effects {
            match effect {
                Effect::Set { path, value } => match self.store.set(&path, value) {
                    Ok(()) => dirty = true,
                    Err(err) => warn!(%path, %err, "deferred write rejected"),
                },
                Effect::Call { method, args } => {
                    if let Err(err) = self.call_method(&method, &args) {
                        warn!(%err, "deferred call failed");
                    }
                }
                Effect::Subscribe { event, method } => {
                    self.emitter.on_unique(event, Subscriber::Method(method));
                }
            }
        }
        dirty
    }
}
