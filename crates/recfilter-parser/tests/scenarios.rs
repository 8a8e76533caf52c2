//! End-to-end golden tests against this crate's public surface: path
//! reads/writes and parser shape, run as black-box integration tests
//! rather than from inside the modules under test.

use recfilter_parser::expr::{ComparisonOp, Expr, Literal};
use recfilter_parser::parser::parse;
use recfilter_parser::path;
use recfilter_parser::value::Value;

fn record_from(pairs: &[(&str, Value)]) -> Value {
    let mut map = indexmap::IndexMap::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v.clone());
    }
    Value::Map(map)
}

fn strs(values: Vec<Value>) -> Vec<String> {
    values.into_iter().map(|v| v.as_str().unwrap().to_string()).collect()
}

fn ip_seq(addrs: &[&str]) -> Value {
    Value::Seq(addrs.iter().map(|a| Value::Str(a.to_string())).collect())
}

#[test]
fn scenario_1_path_read() {
    let record = record_from(&[(
        "Source",
        Value::Seq(vec![
            record_from(&[("IP4", ip_seq(&["192.168.1.1", "192.168.1.2"]))]),
            record_from(&[("IP4", ip_seq(&["192.168.2.1", "192.168.2.2"]))]),
        ]),
    )]);

    let all_ips = path::values(&record, &path::parse("Source.IP4").unwrap());
    assert_eq!(
        strs(all_ips),
        vec!["192.168.1.1", "192.168.1.2", "192.168.2.1", "192.168.2.2"]
    );

    let last_of_second = path::values(&record, &path::parse("Source[2].IP4[#]").unwrap());
    assert_eq!(strs(last_of_second), vec!["192.168.2.2"]);

    let firsts = path::values(&record, &path::parse("Source[*].IP4[1]").unwrap());
    assert_eq!(strs(firsts), vec!["192.168.1.1", "192.168.2.1"]);
}

#[test]
fn scenario_2_path_set() {
    let mut record = Value::Map(indexmap::IndexMap::new());

    let outcome1 = path::set(
        &mut record,
        &path::parse("A.B[1].C").unwrap(),
        Value::Str("x".into()),
        true,
        false,
    )
    .unwrap();
    let outcome2 = path::set(
        &mut record,
        &path::parse("A.B[#].D").unwrap(),
        Value::Str("y".into()),
        true,
        false,
    )
    .unwrap();

    assert_eq!(outcome1, path::SetOutcome::Set);
    assert_eq!(outcome2, path::SetOutcome::Set);

    let a = record.as_map().unwrap().get("A").unwrap();
    let b = a.as_map().unwrap().get("B").unwrap().as_seq().unwrap();
    assert_eq!(b.len(), 1);
    let elem = b[0].as_map().unwrap();
    assert_eq!(elem.get("C").unwrap(), &Value::Str("x".into()));
    assert_eq!(elem.get("D").unwrap(), &Value::Str("y".into()));
}

#[test]
fn scenario_3_parser_shape() {
    let expr = parse("(Source.IP4 == 127.0.0.1)").unwrap();
    match expr {
        Expr::ComparisonBinOp { op, left, right } => {
            assert_eq!(op, ComparisonOp::Eq);
            assert_eq!(*left, Expr::Variable("Source.IP4".to_string()));
            match *right {
                Expr::Ipv4(Literal::Raw(s)) => assert_eq!(s, "127.0.0.1"),
                other => panic!("expected a raw IPv4 literal, got {other:?}"),
            }
        }
        other => panic!("expected a comparison node, got {other:?}"),
    }
}

#[test]
fn path_idempotence_and_cache_sharing() {
    let a = path::cached_parse("Source[*].IP4[1]").unwrap();
    let b = path::cached_parse("Source[*].IP4[1]").unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert_eq!(path::parse("Source[*].IP4[1]"), path::parse("Source[*].IP4[1]"));
}
