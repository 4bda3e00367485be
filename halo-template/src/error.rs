use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("cannot parse expression `{expr}`: {message}")]
    Parse { expr: String, message: String },

    #[error("`{0}` is not defined")]
    UndefinedVariable(String),

    #[error("cannot read property `{property}` of null")]
    NullAccess { property: String },

    #[error("`{op}` produced a non-finite number")]
    NonFinite { op: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unterminated tag <{tag}> starting at offset {pos}")]
    UnterminatedTag { tag: String, pos: usize },

    #[error("unterminated comment starting at offset {pos}")]
    UnterminatedComment { pos: usize },
}
