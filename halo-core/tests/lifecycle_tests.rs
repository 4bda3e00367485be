use std::cell::RefCell;
use std::rc::Rc;

use halo_core::{Hooks, LifecycleState, Stage};

#[test]
fn hooks_run_in_registration_order_per_stage() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let hooks = {
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        Hooks::new()
            .on_mounted(move || a.borrow_mut().push("mounted-1"))
            .on_mounted(move || b.borrow_mut().push("mounted-2"))
            .on_destroyed(move || c.borrow_mut().push("destroyed"))
    };

    hooks.run(Stage::Created);
    assert!(log.borrow().is_empty());

    hooks.run(Stage::Mounted);
    hooks.run(Stage::Destroyed);
    assert_eq!(&*log.borrow(), &["mounted-1", "mounted-2", "destroyed"]);
}

#[test]
fn cloned_hooks_share_callbacks() {
    let count = Rc::new(RefCell::new(0));
    let hooks = {
        let c = count.clone();
        Hooks::new().on_updated(move || *c.borrow_mut() += 1)
    };
    let copy = hooks.clone();

    hooks.run(Stage::Updated);
    copy.run(Stage::Updated);

    assert_eq!(*count.borrow(), 2);
    assert_eq!(copy.len(Stage::Updated), 1);
}

#[test]
fn destroyed_is_the_only_dead_state() {
    assert!(LifecycleState::Uninitialized.is_live());
    assert!(LifecycleState::Mounted.is_live());
    assert!(!LifecycleState::Destroyed.is_live());
}
