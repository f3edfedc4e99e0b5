//! Expression error types

use thiserror::Error;

use crate::debugger::memory::MemoryError;

/// Why an expression could not be evaluated.
///
/// Every variant is recoverable: the caller reports it and carries on.
/// `StackOverflow` is the one internal fault, raised when an expression
/// nests deeper than the evaluator's fixed stacks allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("no match at position {offset}: '{remainder}'")]
    Lex { offset: usize, remainder: String },

    #[error("token '{lexeme}' at position {offset} exceeds {max} characters")]
    LexemeTooLong { offset: usize, lexeme: String, max: usize },

    #[error("unknown register '${name}'")]
    UnknownRegister { name: String },

    #[error("unbalanced parentheses")]
    UnbalancedParen,

    #[error("operator '{op}' is missing an operand")]
    MissingOperand { op: &'static str },

    #[error("malformed expression: {0}")]
    Malformed(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("{stack} stack exceeded {capacity} entries")]
    StackOverflow { stack: &'static str, capacity: usize },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl ExprError {
    pub fn unknown_register(name: impl Into<String>) -> Self {
        ExprError::UnknownRegister { name: name.into() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        ExprError::Malformed(reason.into())
    }

    /// True for faults caused by the evaluator's own limits rather than by
    /// what the user typed.
    pub fn is_internal(&self) -> bool {
        matches!(self, ExprError::StackOverflow { .. })
    }

    /// Byte offset in the source text the error points at, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ExprError::Lex { offset, .. } | ExprError::LexemeTooLong { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
