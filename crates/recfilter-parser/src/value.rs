//! The record and evaluation value domain.
//!
//! A single [`Value`] type is shared between the data records the path
//! module walks and the results the evaluator produces: records are trees
//! of `Map`/`Seq`/scalars, and evaluation additionally needs the
//! distinguished [`Value::Absent`] result that is never confused with
//! `Value::Bool(false)`.

use crate::ip::IpLit;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use std::net::IpAddr;

/// A node in a record tree, or the result of evaluating an expression
/// against one.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The distinguished "no value" result. Never equal to any other
    /// variant, including `Bool(false)`.
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ip(IpAddr),
    IpLit(IpLit),
    Datetime(DateTime<Utc>),
    /// A time span, as used by `Timedelta` literals and math-on-datetimes.
    Timedelta(Duration),
    Seq(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// `absent`, empty containers, empty strings and zero are false;
    /// everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Absent => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Seq(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Ip(_)
            | Value::IpLit(_)
            | Value::Datetime(_)
            | Value::Timedelta(_) => true,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_seq_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Coerces the value to a `f64`, datetimes as seconds-since-epoch.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Datetime(dt) => Some(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9),
            Value::Timedelta(d) => Some(d.num_milliseconds() as f64 / 1000.0),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Wraps a scalar into a one-element sequence; leaves `Seq` as-is.
    /// Used by comparison and membership operators.
    pub fn into_seq(self) -> Vec<Value> {
        match self {
            Value::Seq(items) => items,
            Value::Absent => Vec::new(),
            other => vec![other],
        }
    }
}
