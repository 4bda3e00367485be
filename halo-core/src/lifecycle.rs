use std::fmt;
use std::rc::Rc;

/// A zero-argument lifecycle callback.
pub type Hook = Rc<dyn Fn()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Created,
    Mounted,
    Updated,
    Destroyed,
}

/// Where an instance is in its life. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Mounted,
    Destroyed,
}

impl LifecycleState {
    pub fn is_live(self) -> bool {
        self != LifecycleState::Destroyed
    }
}

/// Per-instance lifecycle hooks. Cloning shares the callbacks, which is
/// how a component definition hands the same hooks to every instance.
#[derive(Clone, Default)]
pub struct Hooks {
    created: Vec<Hook>,
    mounted: Vec<Hook>,
    updated: Vec<Hook>,
    destroyed: Vec<Hook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook to run before the first tree is built
    pub fn on_created(self, f: impl Fn() + 'static) -> Self {
        self.with(Stage::Created, f)
    }

    /// Register a hook to run after the first successful build
    pub fn on_mounted(self, f: impl Fn() + 'static) -> Self {
        self.with(Stage::Mounted, f)
    }

    /// Register a hook to run after every rebuild triggered by a write
    pub fn on_updated(self, f: impl Fn() + 'static) -> Self {
        self.with(Stage::Updated, f)
    }

    /// Register a hook to run once, after teardown
    pub fn on_destroyed(self, f: impl Fn() + 'static) -> Self {
        self.with(Stage::Destroyed, f)
    }

    pub fn with(mut self, stage: Stage, f: impl Fn() + 'static) -> Self {
        self.push(stage, Rc::new(f));
        self
    }

    pub fn push(&mut self, stage: Stage, hook: Hook) {
        self.slot_mut(stage).push(hook);
    }

    /// Run every hook registered for `stage`, in registration order.
    pub fn run(&self, stage: Stage) {
        for hook in self.slot(stage) {
            hook();
        }
    }

    pub fn len(&self, stage: Stage) -> usize {
        self.slot(stage).len()
    }

    fn slot(&self, stage: Stage) -> &[Hook] {
        match stage {
            Stage::Created => &self.created,
            Stage::Mounted => &self.mounted,
            Stage::Updated => &self.updated,
            Stage::Destroyed => &self.destroyed,
        }
    }

    fn slot_mut(&mut self, stage: Stage) -> &mut Vec<Hook> {
        match stage {
            Stage::Created => &mut self.created,
            Stage::Mounted => &mut self.mounted,
            Stage::Updated => &mut self.updated,
            Stage::Destroyed => &mut self.destroyed,
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("created", &self.created.len())
            .field("mounted", &self.mounted.len())
            .field("updated", &self.updated.len())
            .field("destroyed", &self.destroyed.len())
            .finish()
    }
}
