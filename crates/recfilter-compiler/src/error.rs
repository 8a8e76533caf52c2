//! Errors raised while evaluating or compiling an expression tree.
//! Mirrors the per-subsystem `thiserror` enums in `recfilter-parser`: one
//! type per stage rather than a single catch-all.

use thiserror::Error;

/// Evaluation is total over the tree: operand coercion failure returns
/// absent rather than throwing. This error only ever surfaces a genuine
/// programming mistake — an unregistered function name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("failed to parse expression: {0}")]
    Parse(String),
}
