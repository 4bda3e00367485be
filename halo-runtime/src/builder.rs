use halo_dom::{Document, HostId, Node};
use halo_template::{Scope, compile};
use tracing::warn;

use crate::config::Config;
use crate::directive::{DirectiveContext, DirectiveRegistry, Effect, Handler, Outcome};
use crate::events::Emitter;
use crate::listeners::ListenerTable;
use crate::repeat;

/// Borrowed instance state for one rebuild pass.
pub(crate) struct BuildCx<'a> {
    pub doc: &'a mut Document,
    pub registry: &'a DirectiveRegistry,
    pub emitter: &'a Emitter,
    pub listeners: &'a mut ListenerTable,
    pub config: &'a Config,
    pub effects: &'a mut Vec<Effect>,
}

struct Pending {
    attr: String,
    name: String,
    priority: i32,
    handler: Handler,
}

/// Depth-first, pre-order re-resolution of `node` and its subtree.
pub(crate) fn rebuild(cx: &mut BuildCx<'_>, node: &mut Node, scope: &Scope<'_>) {
    if !node.meta.render_eligible() {
        return;
    }
    let Some(host) = node.host else {
        return;
    };
    if node.is_text() {
        let out = compile(&node.text, scope);
        cx.doc.set_text_content(host, &out);
        return;
    }

    let outcome = run_directives(cx, node, host, scope);
    if let Some(plan) = outcome.repeat {
        repeat::expand(cx, node, plan, scope);
        return;
    }

    for (name, raw) in node.attrs.iter() {
        if is_directive(cx, name) {
            continue;
        }
        let value = compile(raw, scope);
        cx.doc.set_attribute(host, name, &value);
    }

    if outcome.suppress_content || outcome.content_replaced {
        return;
    }
    if outcome.restore_children {
        let hosts: Vec<HostId> = node.children.iter().flat_map(Node::host_sequence).collect();
        cx.doc.replace_children(host, &hosts);
    }
    for child in &mut node.children {
        rebuild(cx, child, scope);
    }
}

fn is_directive(cx: &BuildCx<'_>, attr: &str) -> bool {
    cx.config
        .directive_name(attr)
        .is_some_and(|name| cx.registry.contains(name))
}

fn run_directives(cx: &mut BuildCx<'_>, node: &mut Node, host: HostId, scope: &Scope<'_>) -> Outcome {
    let mut pending: Vec<Pending> = node
        .attrs
        .iter()
        .filter_map(|(attr, _)| {
            let name = cx.config.directive_name(attr)?;
            let directive = cx.registry.get(name)?;
            Some(Pending {
                attr: attr.to_string(),
                name: name.to_string(),
                priority: directive.priority,
                handler: directive.handler.clone(),
            })
        })
        .collect();
    // stable: equal priorities keep attribute order
    pending.sort_by_key(|p| p.priority);

    let mut outcome = Outcome::default();
    for p in pending {
        let Some(raw) = node.attrs.get(&p.attr).map(str::to_string) else {
            continue;
        };
        let value = compile(&raw, scope);
        cx.doc.remove_attribute(host, &p.attr);

        outcome.consume = false;
        let mut dcx = DirectiveContext {
            document: &mut *cx.doc,
            node: &mut *node,
            host,
            name: &p.name,
            raw: &raw,
            value: &value,
            scope,
            emitter: cx.emitter,
            listeners: &mut *cx.listeners,
            effects: &mut *cx.effects,
            outcome: &mut outcome,
        };
        if let Err(err) = (p.handler)(&mut dcx) {
            warn!(directive = %p.attr, %err, "directive failed");
        }
        if outcome.consume {
            node.attrs.remove(&p.attr);
        }
        if outcome.repeat.is_some() {
            break;
        }
    }
    outcome
}
