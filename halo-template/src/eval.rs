use std::cmp::Ordering;

use halo_core::value::{self, is_truthy, to_number};
use halo_core::{Path, Segment};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::EvalError;
use crate::expr::{BinaryOp, Expr, Expression, UnaryOp};

/// Variable bindings visible to an expression: local bindings (loop
/// aliases) first, then the data model, then the enclosing scope.
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    data: Option<&'a Map<String, Value>>,
    locals: Vec<(String, Value)>,
    // data path each aliased local was read from
    origins: Vec<(String, Path)>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(data: &'a Map<String, Value>) -> Self {
        Self {
            data: Some(data),
            locals: Vec::new(),
            origins: Vec::new(),
            parent: None,
        }
    }

    /// A nested scope whose bindings shadow this one.
    pub fn child(&self) -> Scope<'_> {
        Scope {
            data: None,
            locals: Vec::new(),
            origins: Vec::new(),
            parent: Some(self),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.origins.retain(|(n, _)| *n != name);
        self.locals.push((name, value));
        self
    }

    /// Bind `name` to a value that lives at `origin` in the data model, so
    /// writes through the alias can be routed back to it.
    pub fn bind_at(self, name: impl Into<String>, value: Value, origin: Path) -> Self {
        let name = name.into();
        let mut scope = self.bind(name.clone(), value);
        scope.origins.push((name, origin));
        scope
    }

    /// The data path a key path writes to. A head naming an aliased local
    /// is replaced by the alias's origin; `None` when the head is a local
    /// that lives nowhere in the data.
    pub fn data_path(&self, path: &str) -> Option<String> {
        let Ok(parsed) = Path::parse(path) else {
            return Some(path.to_string());
        };
        let Some((Segment::Key(head), rest)) = parsed.segments().split_first() else {
            return Some(path.to_string());
        };
        match self.binding(head) {
            Binding::Data => Some(path.to_string()),
            Binding::Alias(origin) => Some(origin.join(rest).to_string()),
            Binding::Local => None,
        }
    }

    fn binding(&self, name: &str) -> Binding<'_> {
        if self.locals.iter().any(|(k, _)| k == name) {
            return match self.origins.iter().find(|(k, _)| k == name) {
                Some((_, origin)) => Binding::Alias(origin),
                None => Binding::Local,
            };
        }
        if self.data.is_some_and(|d| d.contains_key(name)) {
            return Binding::Data;
        }
        match self.parent {
            Some(p) => p.binding(name),
            None => Binding::Data,
        }
    }
}

enum Binding<'p> {
    Data,
    Alias(&'p Path),
    Local,
}

/// Parse and evaluate `source` against `scope`.
pub fn evaluate(source: &str, scope: &Scope<'_>) -> Result<Value, EvalError> {
    let expr = Expression::parse(source)?;
    eval(expr.ast(), scope)
}

/// Fail-closed truthiness: any evaluation error counts as false.
pub fn evaluate_truthy(source: &str, scope: &Scope<'_>) -> bool {
    match evaluate(source, scope) {
        Ok(v) => is_truthy(&v),
        Err(err) => {
            debug!(expr = source, %err, "expression treated as false");
            false
        }
    }
}

pub fn eval(expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Ident(name) => scope
            .lookup(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
        Expr::Member(obj, name) => {
            let base = eval(obj, scope)?;
            property(&base, name)
        }
        Expr::Index(obj, key) => {
            let base = eval(obj, scope)?;
            let key = eval(key, scope)?;
            property(&base, &value::display(&key))
        }
        Expr::Unary(op, operand) => {
            let v = eval(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!is_truthy(&v))),
                UnaryOp::Neg => numeric("-", to_number(&v).map(|n| -n)),
                UnaryOp::Pos => numeric("+", to_number(&v)),
            }
        }
        Expr::Binary(op, lhs, rhs) => binary(*op, lhs, rhs, scope),
        Expr::Conditional {
            test,
            then,
            otherwise,
        } => {
            if is_truthy(&eval(test, scope)?) {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
    }
}

fn property(base: &Value, name: &str) -> Result<Value, EvalError> {
    match base {
        Value::Null => Err(EvalError::NullAccess {
            property: name.to_string(),
        }),
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::Array(items) if name == "length" => Ok(Value::from(items.len())),
        Value::Array(items) => Ok(name
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Null)),
        Value::String(s) if name == "length" => Ok(Value::from(s.chars().count())),
        Value::String(s) => Ok(name
            .parse::<usize>()
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

fn numeric(op: &'static str, n: Option<f64>) -> Result<Value, EvalError> {
    n.and_then(value::number).ok_or(EvalError::NonFinite { op })
}

fn binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
    // logical operators short-circuit and yield an operand
    match op {
        BinaryOp::And => {
            let l = eval(lhs, scope)?;
            return if is_truthy(&l) { eval(rhs, scope) } else { Ok(l) };
        }
        BinaryOp::Or => {
            let l = eval(lhs, scope)?;
            return if is_truthy(&l) { Ok(l) } else { eval(rhs, scope) };
        }
        _ => {}
    }

    let l = eval(lhs, scope)?;
    let r = eval(rhs, scope)?;
    let sym = op.symbol();
    let nums = || (to_number(&l), to_number(&r));

    match op {
        BinaryOp::Add => {
            if is_stringy(&l) || is_stringy(&r) {
                Ok(Value::String(value::display(&l) + &value::display(&r)))
            } else {
                let (a, b) = nums();
                numeric(sym, a.zip(b).map(|(a, b)| a + b))
            }
        }
        BinaryOp::Sub => {
            let (a, b) = nums();
            numeric(sym, a.zip(b).map(|(a, b)| a - b))
        }
        BinaryOp::Mul => {
            let (a, b) = nums();
            numeric(sym, a.zip(b).map(|(a, b)| a * b))
        }
        BinaryOp::Div => {
            let (a, b) = nums();
            numeric(sym, a.zip(b).map(|(a, b)| a / b))
        }
        BinaryOp::Rem => {
            let (a, b) = nums();
            numeric(sym, a.zip(b).map(|(a, b)| a % b))
        }
        BinaryOp::StrictEq => Ok(Value::Bool(strict_eq(&l, &r))),
        BinaryOp::StrictNe => Ok(Value::Bool(!strict_eq(&l, &r))),
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(&l, &r))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(&l, &r))),
        BinaryOp::Lt => Ok(Value::Bool(compare(&l, &r) == Some(Ordering::Less))),
        BinaryOp::Le => Ok(Value::Bool(matches!(
            compare(&l, &r),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::Gt => Ok(Value::Bool(compare(&l, &r) == Some(Ordering::Greater))),
        BinaryOp::Ge => Ok(Value::Bool(matches!(
            compare(&l, &r),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        BinaryOp::And | BinaryOp::Or => Ok(Value::Null),
    }
}

fn is_stringy(v: &Value) -> bool {
    matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_))
}

fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(_) | Value::String(_) | Value::Bool(_), Value::Number(_) | Value::Bool(_))
        | (Value::Number(_) | Value::Bool(_), Value::String(_)) => {
            match (to_number(a), to_number(b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => strict_eq(a, b),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    to_number(a)?.partial_cmp(&to_number(b)?)
}
