//! Error types for the evaluator.
//!
//! A missing binding is not an error at the environment layer — namespace
//! reads return `None`. These constructors are the vocabulary the tree
//! visitor reaches for when it decides absence (or misuse) is user-visible.

use std::fmt;

use crate::value::Value;

/// Result of evaluating a script expression.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Typed error category for structured diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// Variable lookup failed in every scope of the chain.
    UndefinedVariable { name: String },
    /// Mixin lookup failed in every scope of the chain.
    UndefinedMixin { name: String },
    /// Function lookup failed in every scope of the chain.
    UndefinedFunction { name: String },
    /// `@content` used where no content block was passed in.
    ContentOutsideMixin,
    /// Callable invoked with the wrong number of arguments.
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::UndefinedVariable { name } => {
                write!(f, "Undefined variable: \"${name}\".")
            }
            EvalErrorKind::UndefinedMixin { name } => write!(f, "Undefined mixin '{name}'."),
            EvalErrorKind::UndefinedFunction { name } => write!(f, "Undefined function '{name}'."),
            EvalErrorKind::ContentOutsideMixin => {
                f.write_str("@content may only be used within a mixin passed a content block.")
            }
            EvalErrorKind::WrongArity {
                name,
                expected,
                got,
            } => write!(
                f,
                "'{name}' takes {expected} argument(s) but {got} were passed."
            ),
        }
    }
}

/// An evaluation error: typed category plus rendered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    /// The structured category.
    pub kind: EvalErrorKind,
    /// The rendered, user-facing message.
    pub message: String,
}

impl EvalError {
    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError { kind, message }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

/// Variable lookup failed in every scope of the chain.
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_owned(),
    })
}

/// Mixin lookup failed in every scope of the chain.
pub fn undefined_mixin(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMixin {
        name: name.to_owned(),
    })
}

/// Function lookup failed in every scope of the chain.
pub fn undefined_function(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedFunction {
        name: name.to_owned(),
    })
}

/// `@content` used where no content block was passed in.
pub fn content_outside_mixin() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ContentOutsideMixin)
}

/// Callable invoked with the wrong number of arguments.
pub fn wrong_arity(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::WrongArity {
        name: name.to_owned(),
        expected,
        got,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn undefined_variable_message() {
        let err = undefined_variable("base-color");
        assert_eq!(err.message, "Undefined variable: \"$base-color\".");
        assert_eq!(
            err.kind,
            EvalErrorKind::UndefinedVariable {
                name: "base-color".to_owned()
            }
        );
    }

    #[test]
    fn wrong_arity_message() {
        let err = wrong_arity("rounded", 1, 3);
        assert_eq!(err.message, "'rounded' takes 1 argument(s) but 3 were passed.");
    }

    #[test]
    fn display_matches_message() {
        let err = content_outside_mixin();
        assert_eq!(err.to_string(), err.message);
    }
}
