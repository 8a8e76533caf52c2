//! End-to-end golden tests exercising whole filter strings through the
//! public `compile`/`evaluate` surface.

use recfilter_compiler::{compile, evaluate, FunctionRegistry};
use recfilter_parser::expr::{Expr, IntValue, MathOp};
use recfilter_parser::parser::parse;
use recfilter_parser::value::Value;

fn record_with(field: &str, value: Value) -> Value {
    let mut map = indexmap::IndexMap::new();
    map.insert(field.to_string(), value);
    Value::Map(map)
}

#[test]
fn scenario_4_compiler_ip_lifting() {
    let expr = compile(
        &parse(r#"Source.IP4 in ["188.14.166.0/24", "10.0.0.0/8", "189.14.166.41"]"#).unwrap(),
    );
    let mut source = indexmap::IndexMap::new();
    source.insert(
        "IP4".to_string(),
        Value::Seq(vec![Value::Str("188.14.166.39".to_string())]),
    );
    let record = record_with("Source", Value::Map(source));

    let result = evaluate(&expr, &record, &FunctionRegistry::new()).unwrap();
    assert_eq!(result, Value::Bool(true));
}

#[test]
fn scenario_5_compiler_math_folding() {
    let folded = compile(&parse("5 + 6 - 9").unwrap());
    assert_eq!(folded, Expr::Integer(IntValue(2)));

    let partially_folded = compile(&parse("Test + 10 - 9").unwrap());
    assert_eq!(
        partially_folded,
        Expr::math(
            MathOp::Add,
            Expr::Variable("Test".to_string()),
            Expr::Integer(IntValue(1)),
        )
    );
}

#[test]
fn scenario_6_time_arithmetic() {
    let expr = compile(&parse("DetectTime + 3600").unwrap());
    let record = record_with(
        "DetectTime",
        Value::Str("2016-06-21T13:08:27Z".to_string()),
    );

    let result = evaluate(&expr, &record, &FunctionRegistry::new()).unwrap();
    let expected = recfilter_parser::parse_datetime("2016-06-21T14:08:27Z").unwrap();
    assert_eq!(result, Value::Datetime(expected));
}

#[test]
fn scenario_7_absent_propagation() {
    let expr = compile(&parse("ConnCounts + 10 gt 11").unwrap());
    let record = Value::Map(indexmap::IndexMap::new());

    let result = evaluate(&expr, &record, &FunctionRegistry::new()).unwrap();
    assert_eq!(result, Value::Absent);
}

#[test]
fn compile_is_idempotent() {
    let once = compile(&parse(r#"Source.IP4 == "188.14.166.39""#).unwrap());
    let twice = compile(&once);
    assert_eq!(once, twice);
}
