//! Error types for the Ember front end
//!
//! Three independent domains that never mix: lex errors travel in-band as
//! `Error`-kind tokens, parse errors are [`ParseError`] values recovered
//! inside the parser, and semantic errors are accumulated [`SemanticError`]
//! records.

use std::fmt;

use crate::frontend::token::Token;
use thiserror::Error;

/// Result type alias for parser internals
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parse error
///
/// Raised by `consume`-style expectations, caught at the per-declaration
/// boundary, and recovered via synchronization. `found` carries the bad
/// token's lexeme, or "end of file".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expected {expected}, got '{found}' on line {line}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: u32,
    },

    #[error("Expected expression, got '{found}' on line {line}")]
    ExpectedExpression { found: String, line: u32 },

    #[error("Expected pattern, got '{found}' on line {line}")]
    ExpectedPattern { found: String, line: u32 },

    #[error("Invalid assignment target on line {line}")]
    InvalidAssignmentTarget { line: u32 },
}

impl ParseError {
    /// Source line the error was raised on
    pub fn line(&self) -> u32 {
        match self {
            Self::UnexpectedToken { line, .. } => *line,
            Self::ExpectedExpression { line, .. } => *line,
            Self::ExpectedPattern { line, .. } => *line,
            Self::InvalidAssignmentTarget { line } => *line,
        }
    }
}

/// Kind of semantic error; `Display` supplies the message text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticErrorKind {
    #[error("Undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("Undefined function '{0}'")]
    UndefinedFunction(String),

    #[error("Function '{0}' is already defined")]
    DuplicateFunction(String),

    #[error("Arithmetic operands must be int or float")]
    NonNumericOperands,

    #[error("Bitwise operations require integer operands")]
    BitwiseRequiresIntegers,

    #[error("Unary '-' requires a numeric operand")]
    NegationRequiresNumeric,

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("'{0}' is not a function")]
    NotCallable(String),

    #[error("Expected {expected} arguments but got {got}")]
    ArgCountMismatch { expected: usize, got: usize },

    #[error("Argument {index} of '{name}': expected {expected}, got {got}")]
    ArgTypeMismatch {
        name: String,
        index: usize,
        expected: String,
        got: String,
    },

    #[error("Async function '{0}' must be awaited")]
    AsyncNotAwaited(String),

    #[error("Async function must return a Future")]
    AsyncReturnNotFuture,

    #[error("Duplicate pattern '{0}'")]
    DuplicatePattern(String),

    #[error("Non-exhaustive pattern matching: missing {0}")]
    NonExhaustiveMatch(String),

    #[error("Type '{0}' is not iterable")]
    NotIterable(String),

    #[error("Loop filter must be a bool, got {0}")]
    NonBoolFilter(String),

    #[error("Cannot combine @vectorize with @parallel")]
    ConflictingDecorators,

    #[error("Mismatched assignment: {targets} targets but {values} values")]
    MultiAssignMismatch { targets: usize, values: usize },
}

/// A semantic error anchored to the offending token
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    pub token: Token,
    pub kind: SemanticErrorKind,
}

impl SemanticError {
    pub fn new(token: Token, kind: SemanticErrorKind) -> Self {
        Self { token, kind }
    }

    /// Message text of the underlying kind
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.token.line, self.kind)
    }
}
