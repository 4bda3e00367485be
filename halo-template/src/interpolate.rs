use halo_core::value;
use tracing::debug;

use crate::eval::{Scope, evaluate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'t> {
    Text(&'t str),
    /// Trimmed body of a `{{ … }}` marker.
    Marker(&'t str),
}

/// Split a template into literal text and interpolation markers, left to
/// right and non-overlapping. An unterminated `{{` stays literal.
pub fn pieces(template: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        if open > 0 {
            out.push(Piece::Text(&rest[..open]));
        }
        let body = &rest[open + 2..open + 2 + close];
        out.push(Piece::Marker(body.trim()));
        rest = &rest[open + 2 + close + 2..];
    }
    if !rest.is_empty() {
        out.push(Piece::Text(rest));
    }
    out
}

pub fn has_markers(template: &str) -> bool {
    pieces(template).iter().any(|p| matches!(p, Piece::Marker(_)))
}

/// Replace every `{{ expr }}` marker with the display form of `expr`
/// evaluated against `scope`. Failing markers render as the empty string.
pub fn compile(template: &str, scope: &Scope<'_>) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }
    let mut out = String::with_capacity(template.len());
    for piece in pieces(template) {
        match piece {
            Piece::Text(t) => out.push_str(t),
            Piece::Marker("") => {}
            Piece::Marker(body) => match evaluate(body, scope) {
                Ok(v) => out.push_str(&value::display(&v)),
                Err(err) => debug!(marker = body, %err, "interpolation rendered empty"),
            },
        }
    }
    out
}
