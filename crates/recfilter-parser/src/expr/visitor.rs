//! The traversal contract: every consumer of the tree — evaluator,
//! domain-typing compiler, pretty-printer, HTML renderer — implements this
//! trait and calls [`accept`], which walks the tree post-order and hands
//! each node its already-reduced children.

use super::{ComparisonOp, Expr, IntValue, Literal, LogicalOp, MathOp, UnaryOp};
use crate::ip::IpLit;
use chrono::{DateTime, Duration, Utc};

/// One method per [`Expr`] variant. `Ctx` is a free-form, caller-supplied
/// context threaded unchanged through the walk (the evaluator uses it to
/// carry the target record; most other visitors ignore it).
pub trait ExprVisitor<Ctx> {
    type Output;

    fn visit_ipv4(&mut self, lit: &Literal<IpLit>, ctx: &Ctx) -> Self::Output;
    fn visit_ipv6(&mut self, lit: &Literal<IpLit>, ctx: &Ctx) -> Self::Output;
    fn visit_datetime(&mut self, lit: &Literal<DateTime<Utc>>, ctx: &Ctx) -> Self::Output;
    fn visit_timedelta(&mut self, lit: &Literal<Duration>, ctx: &Ctx) -> Self::Output;
    fn visit_integer(&mut self, value: IntValue, ctx: &Ctx) -> Self::Output;
    fn visit_float(&mut self, value: f64, ctx: &Ctx) -> Self::Output;
    fn visit_constant(&mut self, value: &str, ctx: &Ctx) -> Self::Output;
    fn visit_variable(&mut self, path: &str, ctx: &Ctx) -> Self::Output;
    fn visit_list(&mut self, items: Vec<Self::Output>, ctx: &Ctx) -> Self::Output;
    fn visit_function(&mut self, name: &str, args: Vec<Self::Output>, ctx: &Ctx) -> Self::Output;
    fn visit_unary(&mut self, op: UnaryOp, operand: Self::Output, ctx: &Ctx) -> Self::Output;
    fn visit_logical(
        &mut self,
        op: LogicalOp,
        left: Self::Output,
        right: Self::Output,
        ctx: &Ctx,
    ) -> Self::Output;
    fn visit_comparison(
        &mut self,
        op: ComparisonOp,
        left: Self::Output,
        right: Self::Output,
        ctx: &Ctx,
    ) -> Self::Output;
    fn visit_math(
        &mut self,
        op: MathOp,
        left: Self::Output,
        right: Self::Output,
        ctx: &Ctx,
    ) -> Self::Output;
}

/// Walks `expr` post-order, dispatching each node to its visitor method
/// once its children have already been reduced.
pub fn accept<V, Ctx>(expr: &Expr, visitor: &mut V, ctx: &Ctx) -> V::Output
where
    V: ExprVisitor<Ctx>,
{
    match expr {
        Expr::Ipv4(lit) => visitor.visit_ipv4(lit, ctx),
        Expr::Ipv6(lit) => visitor.visit_ipv6(lit, ctx),
        Expr::Datetime(lit) => visitor.visit_datetime(lit, ctx),
        Expr::Timedelta(lit) => visitor.visit_timedelta(lit, ctx),
        Expr::Integer(v) => visitor.visit_integer(*v, ctx),
        Expr::Float(v) => visitor.visit_float(*v, ctx),
        Expr::Constant(s) => visitor.visit_constant(s, ctx),
        Expr::Variable(path) => visitor.visit_variable(path, ctx),
        Expr::List(items) => {
            let reduced: Vec<V::Output> = items.iter().map(|e| accept(e, visitor, ctx)).collect();
            visitor.visit_list(reduced, ctx)
        }
        Expr::Function { name, args } => {
            let reduced: Vec<V::Output> = args.iter().map(|e| accept(e, visitor, ctx)).collect();
            visitor.visit_function(name, reduced, ctx)
        }
        Expr::Unary { op, operand } => {
            let reduced = accept(operand, visitor, ctx);
            visitor.visit_unary(*op, reduced, ctx)
        }
        Expr::LogicalBinOp { op, left, right } => {
            let l = accept(left, visitor, ctx);
            let r = accept(right, visitor, ctx);
            visitor.visit_logical(*op, l, r, ctx)
        }
        Expr::ComparisonBinOp { op, left, right } => {
            let l = accept(left, visitor, ctx);
            let r = accept(right, visitor, ctx);
            visitor.visit_comparison(*op, l, r, ctx)
        }
        Expr::MathBinOp { op, left, right } => {
            let l = accept(left, visitor, ctx);
            let r = accept(right, visitor, ctx);
            visitor.visit_math(*op, l, r, ctx)
        }
    }
}
