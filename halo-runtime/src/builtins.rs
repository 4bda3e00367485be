use halo_core::{Path, Segment};
use halo_template::{EvalError, Expr, Expression};
use serde_json::Value;
use tracing::{debug, warn};

use crate::directive::{DirectiveContext, DirectiveRegistry, RepeatPlan};
use crate::error::DirectiveError;
use crate::listeners::Action;

/// Largest `n` accepted by `alias in n`.
pub const MAX_RANGE: u64 = 10_000;

pub(crate) fn install(reg: &mut DirectiveRegistry) {
    reg.register_with_priority("for", 0, for_directive);
    reg.register_with_priority("once", 10, once);
    reg.register_with_priority("if", 20, if_directive);
    reg.register_with_priority("show", 30, show);
    reg.register_with_priority("model", 40, model);
    reg.register_with_priority("on", 50, on);
    reg.register_with_priority("text", 60, text);
    reg.register_with_priority("html", 70, html);
    reg.register_with_priority("mask", 80, mask);
}

/// Falsy: detach the children and skip them this pass. Truthy: make them
/// eligible again and put them back.
fn if_directive(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    let shown = cx.truthy();
    for child in &mut cx.node.children {
        child.meta.set_render_eligible(shown);
    }
    if shown {
        cx.restore_children();
    } else {
        cx.document.replace_children(cx.host, &[]);
        cx.suppress_content();
    }
    Ok(())
}

fn show(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    let hidden = !cx.truthy();
    cx.document.set_hidden(cx.host, hidden);
    Ok(())
}

fn model(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    let path = cx.value.trim().to_string();
    if path.is_empty() {
        return Err(cx.malformed());
    }
    let current = cx.lookup_display(&path);
    cx.document.set_value(cx.host, &current);
    // loop aliases write through to the list item they stand for
    match cx.scope.data_path(&path) {
        Some(target) => {
            cx.bind_model("input", &target);
            cx.bind_model("change", &target);
        }
        None => debug!(path, "model bound to a local value; edits are not stored"),
    }
    Ok(())
}

/// `event:method`. Instance events take precedence over host listeners.
fn on(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    cx.consume();
    let Some((event, method)) = cx.value.split_once(':') else {
        return Err(cx.malformed());
    };
    let (event, method) = (event.trim().to_string(), method.trim().to_string());
    if event.is_empty() || method.is_empty() {
        return Err(cx.malformed());
    }
    if cx.has_event(&event) {
        cx.subscribe(&event, &method);
    } else {
        cx.listen(&event, Action::CallMethod(method));
    }
    Ok(())
}

fn once(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    cx.node.meta.freeze();
    cx.consume();
    Ok(())
}

fn text(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    if cx.is_content_suppressed() {
        return Ok(());
    }
    cx.document.set_text_content(cx.host, cx.value);
    cx.replace_content();
    Ok(())
}

fn html(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    if cx.is_content_suppressed() {
        return Ok(());
    }
    if let Err(err) = cx.document.set_inner_html(cx.host, cx.value) {
        warn!(%err, "markup rejected, writing it as text");
        cx.document.set_text_content(cx.host, cx.value);
    }
    cx.replace_content();
    Ok(())
}

fn mask(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    cx.consume();
    Ok(())
}

/// `alias in expr` or `(alias, index) in expr`. An unusable collection
/// still yields a plan, with no items.
fn for_directive(cx: &mut DirectiveContext<'_, '_>) -> Result<(), DirectiveError> {
    let Some((alias, index, source)) = parse_for(cx.value) else {
        return Err(cx.malformed());
    };
    let items = match halo_template::evaluate(source, cx.scope) {
        Ok(v) => collect_items(v).ok_or_else(|| cx.malformed()),
        Err(EvalError::UndefinedVariable(_)) => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    };
    let (items, result) = match items {
        Ok(items) => (items, Ok(())),
        Err(err) => (Vec::new(), Err(err)),
    };
    let base = source_path(source, cx);
    let (origins, items): (Vec<Option<Path>>, Vec<Value>) = items
        .into_iter()
        .map(|(seg, item)| {
            let origin = base.as_ref().zip(seg).map(|(b, seg)| b.child(seg));
            (origin, item)
        })
        .unzip();
    cx.repeat(RepeatPlan {
        alias,
        index,
        items,
        origins,
    });
    result
}

/// Data path of the iterated collection, when the source is a plain key
/// path rather than a computed expression.
fn source_path(source: &str, cx: &DirectiveContext<'_, '_>) -> Option<Path> {
    let expr = Expression::parse(source).ok()?;
    if !is_key_path(expr.ast()) {
        return None;
    }
    Path::parse(&cx.scope.data_path(source)?).ok()
}

fn is_key_path(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) => true,
        Expr::Member(obj, _) => is_key_path(obj),
        Expr::Index(obj, key) => {
            is_key_path(obj) && matches!(&**key, Expr::Literal(Value::Number(_) | Value::String(_)))
        }
        _ => false,
    }
}

pub(crate) fn parse_for(value: &str) -> Option<(String, Option<String>, &str)> {
    let (lhs, source) = value.split_once(" in ")?;
    let (lhs, source) = (lhs.trim(), source.trim());
    if source.is_empty() {
        return None;
    }
    let (alias, index) = match lhs.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => match inner.split_once(',') {
            Some((a, i)) => (a.trim(), Some(i.trim())),
            None => (inner.trim(), None),
        },
        None => (lhs, None),
    };
    if !is_ident(alias) || index.is_some_and(|i| !is_ident(i)) {
        return None;
    }
    Some((alias.to_string(), index.map(str::to_string), source))
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Coerce a value into iteration items, each with the segment that
/// addresses it in its collection: arrays as-is, objects by value, `n`
/// into `0..n` (at most [`MAX_RANGE`]), null into nothing.
pub(crate) fn collect_items(v: Value) -> Option<Vec<(Option<Segment>, Value)>> {
    match v {
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Some(Segment::Index(i)), v))
                .collect(),
        ),
        Value::Object(map) => Some(map.into_iter().map(|(k, v)| (Some(Segment::Key(k)), v)).collect()),
        Value::Null => Some(Vec::new()),
        Value::Number(n) => n
            .as_u64()
            .filter(|n| *n <= MAX_RANGE)
            .map(|n| (0..n).map(|i| (None, Value::from(i))).collect()),
        _ => None,
    }
}
