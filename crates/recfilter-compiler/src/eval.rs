//! The evaluator: reduces an [`Expr`] against a record into a [`Value`],
//! as an [`ExprVisitor`] with the record as context.
//!
//! Evaluation is total: bad operand types and missing paths fold to
//! `Value::Absent` rather than failing the walk. The one escape hatch is
//! an unknown function name, which the function table itself rejects;
//! since [`accept`] does not thread a `Result` through the walk, the
//! evaluator records that one failure mode in a side cell and
//! [`evaluate`] surfaces it after the tree has been fully walked.

use crate::error::EvalError;
use crate::functions::FunctionRegistry;
use recfilter_parser::{
    accept, parse_datetime, parse_ip_lit, parse_timedelta, path, ComparisonOp, Expr, ExprVisitor,
    IntValue, IpLit, Literal, LogicalOp, MathOp, UnaryOp, Value,
};
use std::cell::RefCell;
use std::cmp::Ordering;

pub fn evaluate(
    expr: &Expr,
    record: &Value,
    functions: &FunctionRegistry,
) -> Result<Value, EvalError> {
    let mut evaluator = Evaluator {
        functions,
        error: RefCell::new(None),
    };
    let result = accept(expr, &mut evaluator, record);
    match evaluator.error.into_inner() {
        Some(e) => Err(e),
        None => Ok(result),
    }
}

struct Evaluator<'a> {
    functions: &'a FunctionRegistry,
    error: RefCell<Option<EvalError>>,
}

impl ExprVisitor<Value> for Evaluator<'_> {
    type Output = Value;

    fn visit_ipv4(&mut self, lit: &Literal<IpLit>, _ctx: &Value) -> Value {
        typed_ip(lit)
    }

    fn visit_ipv6(&mut self, lit: &Literal<IpLit>, _ctx: &Value) -> Value {
        typed_ip(lit)
    }

    fn visit_datetime(
        &mut self,
        lit: &Literal<chrono::DateTime<chrono::Utc>>,
        _ctx: &Value,
    ) -> Value {
        match lit {
            Literal::Typed(dt) => Value::Datetime(*dt),
            Literal::Raw(s) => parse_datetime(s)
                .map(Value::Datetime)
                .unwrap_or(Value::Absent),
        }
    }

    fn visit_timedelta(&mut self, lit: &Literal<chrono::Duration>, _ctx: &Value) -> Value {
        match lit {
            Literal::Typed(d) => Value::Timedelta(*d),
            Literal::Raw(s) => parse_timedelta(s)
                .map(Value::Timedelta)
                .unwrap_or(Value::Absent),
        }
    }

    fn visit_integer(&mut self, value: IntValue, _ctx: &Value) -> Value {
        Value::Int(value.0)
    }

    fn visit_float(&mut self, value: f64, _ctx: &Value) -> Value {
        Value::Float(value)
    }

    fn visit_constant(&mut self, value: &str, _ctx: &Value) -> Value {
        Value::Str(value.to_string())
    }

    fn visit_variable(&mut self, path_src: &str, ctx: &Value) -> Value {
        let Ok(chunks) = path::cached_parse(path_src) else {
            return Value::Absent;
        };
        let mut found = path::values(ctx, &chunks);
        match found.len() {
            0 => Value::Absent,
            1 => found.pop().unwrap(),
            _ => Value::Seq(found),
        }
    }

    fn visit_list(&mut self, items: Vec<Value>, _ctx: &Value) -> Value {
        Value::Seq(items)
    }

    fn visit_function(&mut self, name: &str, args: Vec<Value>, _ctx: &Value) -> Value {
        match self.functions.call(name, &args) {
            Ok(v) => v,
            Err(e) => {
                *self.error.borrow_mut() = Some(e);
                Value::Absent
            }
        }
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: Value, _ctx: &Value) -> Value {
        if operand.is_absent() {
            return Value::Absent;
        }
        match op {
            UnaryOp::Not => Value::Bool(!operand.is_truthy()),
            UnaryOp::Exists => Value::Bool(operand.is_truthy()),
        }
    }

    fn visit_logical(&mut self, op: LogicalOp, left: Value, right: Value, _ctx: &Value) -> Value {
        eval_logical(op, &left, &right)
    }

    fn visit_comparison(
        &mut self,
        op: ComparisonOp,
        left: Value,
        right: Value,
        _ctx: &Value,
    ) -> Value {
        eval_comparison(op, left, right)
    }

    fn visit_math(&mut self, op: MathOp, left: Value, right: Value, _ctx: &Value) -> Value {
        eval_math(op, left, right)
    }
}

fn typed_ip(lit: &Literal<IpLit>) -> Value {
    match lit {
        Literal::Typed(ip) => Value::IpLit(*ip),
        Literal::Raw(s) => parse_ip_lit(s).map(Value::IpLit).unwrap_or(Value::Absent),
    }
}

/// Plain operators coerce `absent` to `false`; short-circuit operators
/// propagate `absent` except where the other, present operand already
/// determines the result (`false AND_P absent = false`,
/// `true OR_P absent = true`). See DESIGN.md for the reading adopted here.
fn eval_logical(op: LogicalOp, left: &Value, right: &Value) -> Value {
    let lt = left.is_truthy();
    let rt = right.is_truthy();
    match op {
        LogicalOp::And => Value::Bool(lt && rt),
        LogicalOp::Or => Value::Bool(lt || rt),
        LogicalOp::Xor => Value::Bool(lt != rt),
        LogicalOp::AndShort => {
            if (!left.is_absent() && !lt) || (!right.is_absent() && !rt) {
                Value::Bool(false)
            } else if left.is_absent() || right.is_absent() {
                Value::Absent
            } else {
                Value::Bool(lt && rt)
            }
        }
        LogicalOp::OrShort => {
            if (!left.is_absent() && lt) || (!right.is_absent() && rt) {
                Value::Bool(true)
            } else if left.is_absent() || right.is_absent() {
                Value::Absent
            } else {
                Value::Bool(lt || rt)
            }
        }
        LogicalOp::XorShort => {
            if left.is_absent() || right.is_absent() {
                Value::Absent
            } else {
                Value::Bool(lt != rt)
            }
        }
    }
}

fn eval_comparison(op: ComparisonOp, left: Value, right: Value) -> Value {
    if left.is_absent() || right.is_absent() {
        return Value::Absent;
    }
    let lseq = left.into_seq();
    let rseq = right.into_seq();
    if lseq.is_empty() || rseq.is_empty() {
        return Value::Absent;
    }

    match op {
        ComparisonOp::Is => Value::Bool(lseq == rseq),
        ComparisonOp::In => Value::Bool(
            lseq.iter()
                .all(|l| rseq.iter().any(|r| values_match(ComparisonOp::Eq, l, r))),
        ),
        other => Value::Bool(
            lseq.iter()
                .any(|l| rseq.iter().any(|r| values_match(other, l, r))),
        ),
    }
}

fn values_match(op: ComparisonOp, l: &Value, r: &Value) -> bool {
    match op {
        ComparisonOp::Like => match (l.as_str(), r.as_str()) {
            (Some(text), Some(pattern)) => regex::Regex::new(pattern)
                .map(|re| re.is_match(text))
                .unwrap_or(false),
            _ => false,
        },
        ComparisonOp::Eq => values_equal(l, r),
        ComparisonOp::Ne => !values_equal(l, r),
        ComparisonOp::Lt => ordering(l, r) == Some(Ordering::Less),
        ComparisonOp::Le => matches!(ordering(l, r), Some(Ordering::Less | Ordering::Equal)),
        ComparisonOp::Gt => ordering(l, r) == Some(Ordering::Greater),
        ComparisonOp::Ge => matches!(ordering(l, r), Some(Ordering::Greater | Ordering::Equal)),
        ComparisonOp::Is | ComparisonOp::In => unreachable!("handled in eval_comparison"),
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Ip(_) | Value::IpLit(_), Value::Ip(_) | Value::IpLit(_)) => ip_related(l, r),
        (Value::Ip(_) | Value::IpLit(_), Value::Str(_)) | (Value::Str(_), Value::Ip(_) | Value::IpLit(_)) => {
            coerce_ip_lit(l)
                .zip(coerce_ip_lit(r))
                .is_some_and(|(a, b)| a.contains(b.cmp_key()) || b.contains(a.cmp_key()))
        }
        _ if std::mem::discriminant(l) == std::mem::discriminant(r) => l == r,
        _ => l.as_numeric().zip(r.as_numeric()).is_some_and(|(a, b)| a == b),
    }
}

/// Like [`as_ip_lit`], but also parses a bare record string. A record field
/// read through `visit_variable` is never retyped the way a literal operand
/// is by the domain-typing compiler, so it still needs to pass here for it
/// to compare equal to a typed IP on the other side.
fn coerce_ip_lit(v: &Value) -> Option<IpLit> {
    as_ip_lit(v).or_else(|| parse_ip_lit(v.as_str()?))
}

fn ordering(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        (Value::Datetime(a), Value::Datetime(b)) => a.partial_cmp(b),
        (Value::Ip(_) | Value::IpLit(_), Value::Ip(_) | Value::IpLit(_)) => {
            as_ip_lit(l)?.cmp_key().partial_cmp(&as_ip_lit(r)?.cmp_key())
        }
        _ => l.as_numeric()?.partial_cmp(&r.as_numeric()?),
    }
}

fn as_ip_lit(v: &Value) -> Option<IpLit> {
    match v {
        Value::Ip(a) => Some(IpLit::Addr(*a)),
        Value::IpLit(l) => Some(*l),
        _ => None,
    }
}

/// An address equals a range when it falls inside it, and two ranges are
/// equal when each contains the other's reference point. This is the
/// "IP ranges compare by containment" rule extended to equality, since a
/// bare address has no range of its own to compare pointwise against.
fn ip_related(l: &Value, r: &Value) -> bool {
    match (as_ip_lit(l), as_ip_lit(r)) {
        (Some(a), Some(b)) => a.contains(b.cmp_key()) || b.contains(a.cmp_key()),
        _ => false,
    }
}

fn eval_math(op: MathOp, left: Value, right: Value) -> Value {
    if left.is_absent() || right.is_absent() {
        return Value::Absent;
    }
    let lseq = left.into_seq();
    let rseq = right.into_seq();
    let len = match (lseq.len(), rseq.len()) {
        (0, _) | (_, 0) => return Value::Absent,
        (1, n) | (n, 1) if n >= 1 => n,
        (a, b) if a == b => a,
        _ => return Value::Absent,
    };
    let get = |seq: &[Value], i: usize| -> Value {
        if seq.len() == 1 {
            seq[0].clone()
        } else {
            seq.get(i).cloned().unwrap_or(Value::Absent)
        }
    };
    let results: Vec<Value> = (0..len)
        .map(|i| apply_math_values(op, get(&lseq, i), get(&rseq, i)))
        .collect();
    if results.len() == 1 {
        results.into_iter().next().unwrap()
    } else {
        Value::Seq(results)
    }
}

/// A datetime offset by a duration is still a datetime, and the
/// difference between two datetimes is a duration: broadcasting these
/// straight through `as_numeric` would flatten an instant into a bare
/// epoch-seconds float, so those combinations are reconstructed with
/// `chrono`'s own `Add`/`Sub` before falling back to numeric coercion.
fn apply_math_values(op: MathOp, a: Value, b: Value) -> Value {
    use MathOp::{Add, Sub};
    match (&a, &b, op) {
        (Value::Timedelta(ad), Value::Timedelta(bd), Add) => Value::Timedelta(*ad + *bd),
        (Value::Timedelta(ad), Value::Timedelta(bd), Sub) => Value::Timedelta(*ad - *bd),
        (_, Value::Timedelta(d), Add | Sub) => match coerce_datetime(&a) {
            Some(dt) if op == Add => Value::Datetime(dt + *d),
            Some(dt) => Value::Datetime(dt - *d),
            None => numeric_math(op, &a, &b),
        },
        (Value::Timedelta(d), _, Add) => match coerce_datetime(&b) {
            Some(dt) => Value::Datetime(dt + *d),
            None => numeric_math(op, &a, &b),
        },
        _ => match (coerce_datetime(&a), coerce_datetime(&b)) {
            (Some(ad), Some(bd)) if op == Sub => Value::Timedelta(ad - bd),
            _ => numeric_math(op, &a, &b),
        },
    }
}

/// Parses a record field read as a bare RFC 3339 string the same way the
/// domain-typing compiler would have, had this operand been a literal
/// instead of a variable read.
fn coerce_datetime(v: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    match v {
        Value::Datetime(dt) => Some(*dt),
        Value::Str(s) => parse_datetime(s),
        _ => None,
    }
}

fn numeric_math(op: MathOp, a: &Value, b: &Value) -> Value {
    a.as_numeric()
        .zip(b.as_numeric())
        .and_then(|(x, y)| apply_math(op, x, y))
        .map(Value::Float)
        .unwrap_or(Value::Absent)
}

fn apply_math(op: MathOp, a: f64, b: f64) -> Option<f64> {
    match op {
        MathOp::Add => Some(a + b),
        MathOp::Sub => Some(a - b),
        MathOp::Mul => Some(a * b),
        MathOp::Div => {
            if b == 0.0 {
                None
            } else {
                Some(a / b)
            }
        }
        MathOp::Mod => {
            if b == 0.0 {
                None
            } else {
                Some(a % b)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use recfilter_parser::parse;

    fn record() -> Value {
        let mut source = IndexMap::new();
        source.insert(
            "IP4".to_string(),
            Value::Str("188.14.166.39".to_string()),
        );
        let mut root = IndexMap::new();
        root.insert("Source".to_string(), Value::Map(source));
        Value::Map(root)
    }

    fn eval(src: &str, record: &Value) -> Value {
        let expr = parse(src).unwrap();
        evaluate(&expr, record, &FunctionRegistry::new()).unwrap()
    }

    #[test]
    fn missing_variable_is_absent() {
        assert_eq!(eval("Missing.Field", &record()), Value::Absent);
    }

    #[test]
    fn equality_on_strings() {
        assert_eq!(
            eval(r#"Source.IP4 == "188.14.166.39""#, &record()),
            Value::Bool(true)
        );
    }

    #[test]
    fn math_addition() {
        assert_eq!(eval("2 + 3", &Value::Absent), Value::Float(5.0));
    }

    #[test]
    fn datetime_plus_timedelta_yields_an_instant() {
        let expr = crate::compile::compile(&parse("DetectTime + 3600").unwrap());
        let mut record = IndexMap::new();
        record.insert(
            "DetectTime".to_string(),
            Value::Str("2016-06-21T13:08:27Z".to_string()),
        );
        let result = evaluate(&expr, &Value::Map(record), &FunctionRegistry::new()).unwrap();
        assert_eq!(
            result,
            Value::Datetime(parse_datetime("2016-06-21T14:08:27Z").unwrap())
        );
    }

    #[test]
    fn untyped_ip_field_matches_compiled_ip_list() {
        let expr = crate::compile::compile(
            &parse(r#"Source.IP4 in ["188.14.166.0/24", "10.0.0.0/8", "189.14.166.41"]"#)
                .unwrap(),
        );
        let result = evaluate(&expr, &record(), &FunctionRegistry::new()).unwrap();
        assert_eq!(result, Value::Bool(true));
    }
}
