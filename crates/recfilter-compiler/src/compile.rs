//! The domain-typing compiler: a bottom-up, tree-rewriting pass over a
//! parsed [`Expr`], implemented as an [`ExprVisitor`] whose `Output` is
//! itself `Expr` rather than a final value — the same post-order contract
//! the evaluator uses, just with a different output domain.

use crate::error::CompileError;
use once_cell::sync::Lazy;
use recfilter_parser::{
    accept, parse as parse_expr, parse_datetime, parse_ip_lit, parse_timedelta, path,
    ComparisonOp, Expr, ExprVisitor, IntValue, IpLit, Literal, LogicalOp, MathOp, UnaryOp,
};
use std::collections::HashMap;

/// How a known field's opposing literal(s) should be retyped.
#[derive(Clone, Copy)]
enum FieldKind {
    Ip,
    Datetime,
}

static FIELD_REGISTRY: Lazy<HashMap<&'static str, FieldKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("Source.IP4", FieldKind::Ip);
    m.insert("Target.IP4", FieldKind::Ip);
    m.insert("Source.IP6", FieldKind::Ip);
    m.insert("Target.IP6", FieldKind::Ip);
    m.insert("DetectTime", FieldKind::Datetime);
    m.insert("CreateTime", FieldKind::Datetime);
    m.insert("EventTime", FieldKind::Datetime);
    m.insert("CeaseTime", FieldKind::Datetime);
    m.insert("WinStartTime", FieldKind::Datetime);
    m.insert("WinEndTime", FieldKind::Datetime);
    m
});

fn field_kind(path_src: &str) -> Option<FieldKind> {
    let chunks = path::cached_parse(path_src).ok()?;
    FIELD_REGISTRY
        .get(path::normalized_name(&chunks).as_str())
        .copied()
}

/// Runs the domain-typing pass once. Idempotent: a tree already rewritten
/// by `compile` is unchanged by a second call, since every rewrite rule
/// only fires on a still-`Raw`/still-untyped node.
pub fn compile(expr: &Expr) -> Expr {
    let mut compiler = Compiler;
    accept(expr, &mut compiler, &())
}

/// Parses and compiles filter source in one step.
pub fn compile_source(src: &str) -> Result<Expr, CompileError> {
    let expr = parse_expr(src).map_err(|e| CompileError::Parse(e.to_string()))?;
    Ok(compile(&expr))
}

struct Compiler;

impl ExprVisitor<()> for Compiler {
    type Output = Expr;

    fn visit_ipv4(&mut self, lit: &Literal<IpLit>, _ctx: &()) -> Expr {
        Expr::Ipv4(retype_ip(lit))
    }

    fn visit_ipv6(&mut self, lit: &Literal<IpLit>, _ctx: &()) -> Expr {
        Expr::Ipv6(retype_ip(lit))
    }

    fn visit_datetime(&mut self, lit: &Literal<chrono::DateTime<chrono::Utc>>, _ctx: &()) -> Expr {
        Expr::Datetime(retype_datetime(lit))
    }

    fn visit_timedelta(&mut self, lit: &Literal<chrono::Duration>, _ctx: &()) -> Expr {
        Expr::Timedelta(retype_timedelta(lit))
    }

    fn visit_integer(&mut self, value: IntValue, _ctx: &()) -> Expr {
        Expr::Integer(value)
    }

    fn visit_float(&mut self, value: f64, _ctx: &()) -> Expr {
        Expr::Float(value)
    }

    fn visit_constant(&mut self, value: &str, _ctx: &()) -> Expr {
        Expr::Constant(value.to_string())
    }

    fn visit_variable(&mut self, path: &str, _ctx: &()) -> Expr {
        Expr::Variable(path.to_string())
    }

    fn visit_list(&mut self, items: Vec<Expr>, _ctx: &()) -> Expr {
        Expr::List(items)
    }

    fn visit_function(&mut self, name: &str, args: Vec<Expr>, _ctx: &()) -> Expr {
        Expr::Function {
            name: name.to_string(),
            args,
        }
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: Expr, _ctx: &()) -> Expr {
        Expr::unary(op, operand)
    }

    fn visit_logical(&mut self, op: LogicalOp, left: Expr, right: Expr, _ctx: &()) -> Expr {
        Expr::logical(op, left, right)
    }

    fn visit_comparison(&mut self, op: ComparisonOp, left: Expr, right: Expr, _ctx: &()) -> Expr {
        lift_comparison(op, left, right)
    }

    fn visit_math(&mut self, op: MathOp, left: Expr, right: Expr, _ctx: &()) -> Expr {
        fold_or_lift_math(op, left, right)
    }
}

fn retype_ip(lit: &Literal<IpLit>) -> Literal<IpLit> {
    match lit {
        Literal::Typed(v) => Literal::Typed(*v),
        Literal::Raw(s) => match parse_ip_lit(s) {
            Some(v) => Literal::Typed(v),
            None => Literal::Raw(s.clone()),
        },
    }
}

fn retype_datetime(
    lit: &Literal<chrono::DateTime<chrono::Utc>>,
) -> Literal<chrono::DateTime<chrono::Utc>> {
    match lit {
        Literal::Typed(v) => Literal::Typed(*v),
        Literal::Raw(s) => match parse_datetime(s) {
            Some(v) => Literal::Typed(v),
            None => Literal::Raw(s.clone()),
        },
    }
}

fn retype_timedelta(lit: &Literal<chrono::Duration>) -> Literal<chrono::Duration> {
    match lit {
        Literal::Typed(v) => Literal::Typed(*v),
        Literal::Raw(s) => match parse_timedelta(s) {
            Some(v) => Literal::Typed(v),
            None => Literal::Raw(s.clone()),
        },
    }
}

/// Folds a math node whose both sides are already numeric literals into a
/// single literal, keeping integer-ness only when both sides are integers;
/// otherwise treats the pairing as the time-operand lifting case.
fn fold_or_lift_math(op: MathOp, left: Expr, right: Expr) -> Expr {
    if let (Some(a), Some(b)) = (as_int(&left), as_int(&right)) {
        if let Some(folded) = apply_int(op, a, b) {
            return Expr::Integer(IntValue(folded));
        }
    }
    if let (Some(a), Some(b)) = (as_numeric_literal(&left), as_numeric_literal(&right)) {
        if let Some(folded) = apply_float(op, a, b) {
            return Expr::Float(folded);
        }
    }

    if is_time_anchor(&left) {
        let right = lift_to_timedelta(right);
        return Expr::math(op, left, right);
    }
    if is_time_anchor(&right) {
        let left = lift_to_timedelta(left);
        return Expr::math(op, left, right);
    }

    Expr::math(op, left, right)
}

fn as_int(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Integer(IntValue(v)) => Some(*v),
        _ => None,
    }
}

fn as_numeric_literal(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Integer(IntValue(v)) => Some(*v as f64),
        Expr::Float(v) => Some(*v),
        _ => None,
    }
}

fn apply_int(op: MathOp, a: i64, b: i64) -> Option<i64> {
    match op {
        MathOp::Add => a.checked_add(b),
        MathOp::Sub => a.checked_sub(b),
        MathOp::Mul => a.checked_mul(b),
        MathOp::Div => (b != 0).then(|| a / b),
        MathOp::Mod => (b != 0).then(|| a % b),
    }
}

fn apply_float(op: MathOp, a: f64, b: f64) -> Option<f64> {
    match op {
        MathOp::Add => Some(a + b),
        MathOp::Sub => Some(a - b),
        MathOp::Mul => Some(a * b),
        MathOp::Div => (b != 0.0).then(|| a / b),
        MathOp::Mod => (b != 0.0).then(|| a % b),
    }
}

/// A datetime variable known to the field registry, or the `utcnow()`
/// call: the two shapes that anchor time-operand lifting on the other
/// side of a math operator.
fn is_time_anchor(expr: &Expr) -> bool {
    match expr {
        Expr::Variable(p) => matches!(field_kind(p), Some(FieldKind::Datetime)),
        Expr::Function { name, args } => name == "utcnow" && args.is_empty(),
        Expr::Datetime(_) => true,
        _ => false,
    }
}

/// Rewrites a plain number or quoted string into a `Timedelta` literal;
/// left untouched if it does not parse as a duration.
fn lift_to_timedelta(expr: Expr) -> Expr {
    let raw = match &expr {
        Expr::Integer(IntValue(v)) => Some(v.to_string()),
        Expr::Constant(s) => Some(s.clone()),
        _ => None,
    };
    match raw.and_then(|s| parse_timedelta(&s)) {
        Some(d) => Expr::Timedelta(Literal::Typed(d)),
        None => expr,
    }
}

/// Retypes the constant side(s) of a comparison that sits opposite a
/// known typed variable.
fn lift_comparison(op: ComparisonOp, left: Expr, right: Expr) -> Expr {
    let left_path = as_variable_path(&left);
    let right_path = as_variable_path(&right);

    match (left_path.and_then(field_kind), right_path.and_then(field_kind)) {
        (Some(kind), None) => Expr::comparison(op, left, lift_opposite(kind, right)),
        (None, Some(kind)) => Expr::comparison(op, lift_opposite(kind, left), right),
        _ => Expr::comparison(op, left, right),
    }
}

fn as_variable_path(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Variable(p) => Some(p),
        _ => None,
    }
}

fn lift_opposite(kind: FieldKind, expr: Expr) -> Expr {
    match expr {
        Expr::List(items) => Expr::List(items.into_iter().map(|e| lift_scalar(kind, e)).collect()),
        other => lift_scalar(kind, other),
    }
}

fn lift_scalar(kind: FieldKind, expr: Expr) -> Expr {
    let Expr::Constant(raw) = &expr else {
        return expr;
    };
    match kind {
        FieldKind::Ip => match parse_ip_lit(raw) {
            Some(v) => Expr::Ipv4(Literal::Typed(v)),
            None => expr,
        },
        FieldKind::Datetime => match parse_datetime(raw) {
            Some(v) => Expr::Datetime(Literal::Typed(v)),
            None => expr,
        },
    }
}
