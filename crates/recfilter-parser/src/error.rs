use thiserror::Error;

/// A malformed path chunk or path string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathSyntaxError {
    #[error("empty path chunk in `{0}`")]
    EmptyChunk(String),
    #[error("chunk `{chunk}` in `{path}` does not match `name[index]`")]
    MalformedChunk { path: String, chunk: String },
    #[error("invalid index `{index}` in chunk `{chunk}`")]
    InvalidIndex { chunk: String, index: String },
    #[error("path must not be empty")]
    Empty,
}

/// A write or delete operation crossed a container of the wrong shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathShapeError {
    #[error("expected a map at `{0}` but found a sequence")]
    ExpectedMap(String),
    #[error("expected a sequence at `{0}` but found a map")]
    ExpectedSequence(String),
    #[error("expected a sequence at `{0}` but found a scalar")]
    NotAContainer(String),
}

/// An unrecognised token in filter source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised token `{text}` at byte {pos}")]
pub struct LexError {
    pub text: String,
    pub pos: usize,
}

/// An unexpected token, or a missing delimiter, while parsing a filter expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("unexpected token `{found}` at byte {pos}, expected {expected}")]
    UnexpectedToken {
        found: String,
        pos: usize,
        expected: String,
    },
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),
}
