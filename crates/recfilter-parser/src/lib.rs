//! Lexing, parsing and tree representation for the record filter
//! expression language, plus the path addressing language records are
//! read and written through.
//!
//! This crate owns the front end only: lexer, parser, `Expr` tree, visitor
//! contract, path language and record [`Value`] domain. Evaluation and
//! domain-typing compilation live downstream in `recfilter-compiler`;
//! rendering lives in `recfilter-printer`. Three crates, one tree, mirroring
//! how a parse tree, a semantic layer and an encoder are usually kept apart.

pub mod datetime;
pub mod error;
pub mod expr;
pub mod ip;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod value;

pub use datetime::{format_timedelta, parse_datetime, parse_timedelta};
pub use error::{LexError, ParseError, PathShapeError, PathSyntaxError};
pub use expr::{
    accept, ComparisonOp, Expr, ExprVisitor, IntValue, Literal, LogicalOp, MathOp, UnaryOp,
};
pub use ip::{parse_ip_lit, IpLit, IpRange};
pub use parser::parse;
pub use value::Value;
