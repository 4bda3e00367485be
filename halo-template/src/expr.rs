use std::fmt;
use std::sync::LazyLock;

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use serde_json::Value;

use crate::error::EvalError;

#[derive(pest_derive::Parser)]
#[grammar = "expr.pest"]
struct ExprParser;

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::infix(Rule::strict_eq, Assoc::Left)
            | Op::infix(Rule::strict_ne, Assoc::Left)
            | Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left))
        .op(Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::not) | Op::prefix(Rule::neg) | Op::prefix(Rule::pos))
        .op(Op::postfix(Rule::member) | Op::postfix(Rule::index))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    StrictEq,
    StrictNe,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

/// Expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let ast = parse_expr(source)?;
        Ok(Self { source: source.to_string(), ast })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

pub fn parse_expr(source: &str) -> Result<Expr, EvalError> {
    let mut pairs = ExprParser::parse(Rule::expression, source).map_err(|e| EvalError::Parse {
        expr: source.to_string(),
        message: e.variant.message().to_string(),
    })?;
    let root = pairs.next().ok_or_else(|| malformed(source))?;
    let cond = root
        .into_inner()
        .find(|p| p.as_rule() == Rule::conditional)
        .ok_or_else(|| malformed(source))?;
    build_conditional(cond, source)
}

fn malformed(source: &str) -> EvalError {
    EvalError::Parse {
        expr: source.to_string(),
        message: "unexpected parse tree".to_string(),
    }
}

fn build_conditional(pair: Pair<Rule>, source: &str) -> Result<Expr, EvalError> {
    let mut inner = pair.into_inner();
    let chain = inner.next().ok_or_else(|| malformed(source))?;
    let test = build_chain(chain.into_inner(), source)?;
    match (inner.next(), inner.next()) {
        (Some(then), Some(otherwise)) => Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(build_conditional(then, source)?),
            otherwise: Box::new(build_conditional(otherwise, source)?),
        }),
        _ => Ok(test),
    }
}

fn build_chain(pairs: Pairs<Rule>, source: &str) -> Result<Expr, EvalError> {
    PRATT
        .map_primary(|p| build_primary(p, source))
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::not => UnaryOp::Not,
                Rule::neg => UnaryOp::Neg,
                _ => UnaryOp::Pos,
            };
            Ok(Expr::Unary(op, Box::new(rhs?)))
        })
        .map_postfix(|lhs, op| {
            let lhs = Box::new(lhs?);
            match op.as_rule() {
                Rule::member => {
                    let name = op.into_inner().next().ok_or_else(|| malformed(source))?;
                    Ok(Expr::Member(lhs, name.as_str().to_string()))
                }
                _ => {
                    let key = op.into_inner().next().ok_or_else(|| malformed(source))?;
                    Ok(Expr::Index(lhs, Box::new(build_conditional(key, source)?)))
                }
            }
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::or => BinaryOp::Or,
                Rule::and => BinaryOp::And,
                Rule::strict_eq => BinaryOp::StrictEq,
                Rule::strict_ne => BinaryOp::StrictNe,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            Ok(Expr::Binary(op, Box::new(lhs?), Box::new(rhs?)))
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<Rule>, source: &str) -> Result<Expr, EvalError> {
    match pair.as_rule() {
        Rule::number => {
            let n: f64 = pair.as_str().parse().map_err(|_| malformed(source))?;
            Ok(Expr::Literal(halo_core::value::number(n).unwrap_or(Value::Null)))
        }
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Expr::Literal(Value::String(unescape(raw))))
        }
        Rule::boolean => Ok(Expr::Literal(Value::Bool(pair.as_str() == "true"))),
        Rule::null => Ok(Expr::Literal(Value::Null)),
        Rule::ident => Ok(Expr::Ident(pair.as_str().to_string())),
        Rule::conditional => build_conditional(pair, source),
        _ => Err(malformed(source)),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
