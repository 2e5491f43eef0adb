//! The callback surface a rule parser drives
//!
//! The parser knows nothing about what `min` or `zero` mean. It walks the
//! expression tree and asks a [`Builder`] to open contexts, combine them with
//! `and`/`or`, and resolve identifiers and calls.

use crate::ast::{ArgExpr, Expr};
use crate::error::ParseError;
use crate::parser::parse_expr;

/// A resolved call argument handed to [`Builder::call`]
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<C> {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    /// A bare identifier in argument position, left to the builder to resolve
    Ident(String),
    /// A nested expression already built into its own context
    Context(C),
}

/// Receiver of parse events.
///
/// `Context` accumulates whatever the builder produces for one level of the
/// boolean tree; the parser creates a fresh one per `&&`/`||` group and per
/// nested argument expression.
pub trait Builder {
    /// Accumulator for one level of the expression tree
    type Context;

    /// Error produced by the builder; syntax errors convert into it
    type Error: From<ParseError>;

    /// Create an empty context
    fn new_context(&self) -> Self::Context;

    /// Fold `sub` into `ctx` as a conjunction of everything `sub` collected
    fn and(&self, ctx: &mut Self::Context, sub: Self::Context) -> Result<(), Self::Error>;

    /// Fold `sub` into `ctx` as a disjunction of everything `sub` collected
    fn or(&self, ctx: &mut Self::Context, sub: Self::Context) -> Result<(), Self::Error>;

    /// Resolve a bare identifier in boolean position
    fn ident(&self, ctx: &mut Self::Context, name: &str) -> Result<(), Self::Error>;

    /// Resolve a call with its arguments
    fn call(
        &self,
        ctx: &mut Self::Context,
        name: &str,
        args: Vec<Arg<Self::Context>>,
    ) -> Result<(), Self::Error>;

    /// Resolve `name == value`; by default the same as `name(value)`
    fn eq(
        &self,
        ctx: &mut Self::Context,
        name: &str,
        value: Arg<Self::Context>,
    ) -> Result<(), Self::Error> {
        self.call(ctx, name, vec![value])
    }
}

/// Parse `rule` and replay it into a fresh context of `builder`
pub fn parse<B: Builder>(rule: &str, builder: &B) -> Result<B::Context, B::Error> {
    let expr = parse_expr(rule)?;
    tracing::trace!(rule, "parsed rule expression");

    let mut ctx = builder.new_context();
    emit(builder, &mut ctx, &expr)?;
    Ok(ctx)
}

fn emit<B: Builder>(builder: &B, ctx: &mut B::Context, expr: &Expr) -> Result<(), B::Error> {
    match expr {
        Expr::And(operands) => {
            let sub = emit_group(builder, operands)?;
            builder.and(ctx, sub)
        }
        Expr::Or(operands) => {
            let sub = emit_group(builder, operands)?;
            builder.or(ctx, sub)
        }
        Expr::Ident(name) => builder.ident(ctx, name),
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|arg| lower_arg(builder, arg))
                .collect::<Result<Vec<_>, _>>()?;
            builder.call(ctx, name, args)
        }
        Expr::Eq { name, value } => {
            let value = lower_arg(builder, value)?;
            builder.eq(ctx, name, value)
        }
    }
}

fn emit_group<B: Builder>(builder: &B, operands: &[Expr]) -> Result<B::Context, B::Error> {
    let mut sub = builder.new_context();
    for operand in operands {
        emit(builder, &mut sub, operand)?;
    }
    Ok(sub)
}

fn lower_arg<B: Builder>(builder: &B, arg: &ArgExpr) -> Result<Arg<B::Context>, B::Error> {
    Ok(match arg {
        ArgExpr::Integer(n) => Arg::Integer(*n),
        ArgExpr::Float(n) => Arg::Float(*n),
        ArgExpr::String(s) => Arg::String(s.clone()),
        ArgExpr::Boolean(b) => Arg::Boolean(*b),
        ArgExpr::Expr(expr) => match expr.as_ref() {
            Expr::Ident(name) => Arg::Ident(name.clone()),
            expr => {
                let mut sub = builder.new_context();
                emit(builder, &mut sub, expr)?;
                Arg::Context(sub)
            }
        },
    })
}
