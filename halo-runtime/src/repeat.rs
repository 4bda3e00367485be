use std::collections::HashMap;

use halo_core::value::display;
use halo_dom::{Node, Repeat, RepeatItem, materialize};
use halo_template::{Scope, compile, has_markers};
use serde_json::Value;

use crate::builder::{BuildCx, rebuild};
use crate::directive::RepeatPlan;

/// Index binding available in every repeated instance.
pub const INDEX_VAR: &str = "$index";
const KEY_ATTR: &str = "key";

/// Expand `node` into one keyed instance per planned item, reusing the
/// instances whose keys survive from the previous pass.
pub(crate) fn expand(cx: &mut BuildCx<'_>, node: &mut Node, plan: RepeatPlan, scope: &Scope<'_>) {
    let Some(template_host) = node.host else {
        return;
    };
    let mut repeat = match node.repeat.take() {
        Some(r) => r,
        None => {
            let anchor = cx.doc.create_anchor();
            cx.doc.insert_after(template_host, anchor);
            cx.doc.detach(template_host);
            Repeat {
                anchor,
                items: Vec::new(),
            }
        }
    };

    let key_source = node.attrs.get(KEY_ATTR).map(str::to_string);
    let template = instance_template(cx, node);
    let mut stale = std::mem::take(&mut repeat.items);
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut prev = repeat.anchor;

    let mut origins = plan.origins.into_iter();
    for (i, item) in plan.items.into_iter().enumerate() {
        let item_scope = match origins.next().flatten() {
            Some(origin) => scope.child().bind_at(plan.alias.clone(), item.clone(), origin),
            None => scope.child().bind(plan.alias.clone(), item.clone()),
        };
        let mut item_scope = item_scope.bind(INDEX_VAR, Value::from(i));
        if let Some(index) = &plan.index {
            item_scope = item_scope.bind(index.clone(), Value::from(i));
        }

        let key = unique_key(item_key(key_source.as_deref(), &item, &item_scope), &mut seen);
        let mut entry = match stale.iter().position(|e| e.key == key) {
            Some(pos) => stale.remove(pos),
            None => {
                let mut fresh = template.clone();
                materialize(cx.doc, &mut fresh);
                RepeatItem { key, node: fresh }
            }
        };
        let Some(host) = entry.node.host else {
            continue;
        };
        if cx.doc.next_sibling(prev) != Some(host) {
            cx.doc.insert_after(prev, host);
        }
        rebuild(cx, &mut entry.node, &item_scope);
        prev = host;
        repeat.items.push(entry);
    }

    // dropped instances are owned by nobody else; reclaim their hosts
    for gone in stale {
        let mut freed = Vec::new();
        for host in gone.node.hosts() {
            freed.extend(cx.doc.release(host));
        }
        cx.listeners.forget(&freed);
    }
    node.repeat = Some(repeat);
}

/// Unbound copy of the template without its iteration directive or key.
fn instance_template(cx: &BuildCx<'_>, node: &Node) -> Node {
    let mut template = node.detached();
    let prefix = &cx.config.attribute_prefix;
    template.attrs.remove(&format!("{prefix}for"));
    template.attrs.remove(KEY_ATTR);
    template
}

fn item_key(key_source: Option<&str>, item: &Value, scope: &Scope<'_>) -> String {
    if let Some(raw) = key_source {
        let key = if has_markers(raw) {
            compile(raw, scope)
        } else {
            raw.to_string()
        };
        if !key.is_empty() {
            return key;
        }
    }
    if let Value::Object(map) = item {
        if let Some(id) = map.get("id").or_else(|| map.get("key")) {
            if !id.is_null() {
                return display(id);
            }
        }
    }
    item.to_string()
}

/// Disambiguate repeated keys with an occurrence suffix.
fn unique_key(key: String, seen: &mut HashMap<String, usize>) -> String {
    let n = seen.entry(key.clone()).or_insert(0);
    *n += 1;
    if *n == 1 { key } else { format!("{key}#{}", *n - 1) }
}
