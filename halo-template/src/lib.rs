//! Template side of halo: the markup parser, the sandboxed expression
//! language used by directives, and `{{ }}` interpolation.

pub mod error;
pub mod eval;
pub mod expr;
pub mod interpolate;
pub mod markup;
pub mod markup_ast;

pub use error::{EvalError, MarkupError};
pub use eval::{Scope, eval, evaluate, evaluate_truthy};
pub use expr::{BinaryOp, Expr, Expression, UnaryOp, parse_expr};
pub use interpolate::{Piece, compile, has_markers, pieces};
pub use markup::{is_void_element, parse_markup};
pub use markup_ast::{MarkupAttr, MarkupNode};
