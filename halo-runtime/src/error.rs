use halo_template::{EvalError, MarkupError};
use thiserror::Error;

/// Failure inside a single directive handler. The builder logs these and
/// moves on to the next directive.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectiveError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("malformed `{directive}` value `{value}`")]
    Malformed { directive: String, value: String },

    #[error(transparent)]
    Markup(#[from] MarkupError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("mount target `{0}` not found")]
    MissingElement(String),

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    #[error("invalid template: {0}")]
    Template(#[from] MarkupError),

    #[error(transparent)]
    Directive(#[from] DirectiveError),
}
