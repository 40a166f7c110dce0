use protolith_wire::WireError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid character {ch:?} at line {line}")]
    InvalidCharacter { ch: char, line: usize },

    #[error("invalid number {text:?} at line {line}")]
    InvalidNumber { text: String, line: usize },

    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: usize },

    #[error("unterminated block comment starting at line {line}")]
    UnterminatedComment { line: usize },

    #[error("the name {0:?} is defined twice")]
    DuplicateName(String),

    #[error("unknown message {0:?}")]
    UnknownMessage(String),

    #[error("verify error: {0}")]
    Verify(String),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}
