//! Evaluation errors.
//!
//! `EvalErrorKind` carries the structured category; the factory functions
//! below are the public way to build errors and fill in both `kind` and
//! `message`.

use std::fmt;

use sable_types::{LinearizationFailureReason, TypeError};

use crate::Value;

/// Result of evaluation.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Lookup
    VariableNotFound {
        name: String,
    },

    // Type/Application
    WrongType {
        expected: String,
        got: String,
    },
    NotApplicable {
        name: String,
        args: String,
    },
    AmbiguousDispatch {
        name: String,
        args: String,
        candidates: usize,
    },
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    // Type registry
    LinearizationFailure {
        ty: String,
        reason: LinearizationFailureReason,
    },
    MemberNotFound {
        ty: String,
        member: String,
    },

    // Forms
    MalformedForm {
        form: String,
        reason: String,
    },

    // Arithmetic
    DivisionByZero,
    IntegerOverflow {
        operation: String,
    },

    /// Native function failure without a more specific kind.
    Custom {
        message: String,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VariableNotFound { name } => write!(f, "variable not found: {name}"),
            Self::WrongType { expected, got } => {
                write!(f, "wrong type: expected {expected}, got {got}")
            }
            Self::NotApplicable { name, args } => {
                write!(f, "no method of `{name}` is applicable to ({args})")
            }
            Self::AmbiguousDispatch {
                name,
                args,
                candidates,
            } => write!(
                f,
                "ambiguous dispatch: {candidates} methods of `{name}` are equally specific for ({args})"
            ),
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => write!(f, "{name} expects {expected} arguments, got {got}"),
            Self::LinearizationFailure { ty, reason } => {
                write!(f, "cannot linearize `{ty}`: {reason}")
            }
            Self::MemberNotFound { ty, member } => write!(f, "`{ty}` has no member `{member}`"),
            Self::MalformedForm { form, reason } => write!(f, "malformed `{form}`: {reason}"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::IntegerOverflow { operation } => write!(f, "integer overflow in {operation}"),
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
}

impl EvalError {
    /// Error with only a message (`Custom` kind).
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
        }
    }

    pub(crate) fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self { kind, message }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

impl From<TypeError> for EvalError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::LinearizationFailure { ty, reason } => {
                EvalError::from_kind(EvalErrorKind::LinearizationFailure { ty, reason })
            }
            TypeError::MemberNotFound { ty, member } => {
                EvalError::from_kind(EvalErrorKind::MemberNotFound { ty, member })
            }
            TypeError::TypeMismatch { from, to } => wrong_type(&to, &from),
            other => EvalError::new(other.to_string()),
        }
    }
}

// Lookup

#[cold]
pub fn variable_not_found(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::VariableNotFound {
        name: name.to_string(),
    })
}

// Type/Application

#[cold]
pub fn wrong_type(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::WrongType {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

/// No multimethod candidate accepts the argument types.
#[cold]
pub fn not_applicable(name: &str, args: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotApplicable {
        name: name.to_string(),
        args: args.to_string(),
    })
}

#[cold]
pub fn ambiguous_dispatch(name: &str, args: &str, candidates: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AmbiguousDispatch {
        name: name.to_string(),
        args: args.to_string(),
        candidates,
    })
}

#[cold]
pub fn arity_mismatch(name: &str, expected: &str, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        got,
    })
}

// Type registry

#[cold]
pub fn linearization_failure(ty: &str, reason: LinearizationFailureReason) -> EvalError {
    EvalError::from_kind(EvalErrorKind::LinearizationFailure {
        ty: ty.to_string(),
        reason,
    })
}

#[cold]
pub fn member_not_found(ty: &str, member: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MemberNotFound {
        ty: ty.to_string(),
        member: member.to_string(),
    })
}

// Forms

#[cold]
pub fn malformed_form(form: &str, reason: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedForm {
        form: form.to_string(),
        reason: reason.to_string(),
    })
}

// Arithmetic

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

/// Failure reported by a native function.
#[cold]
pub fn native_failure(message: impl Into<String>) -> EvalError {
    EvalError::new(message)
}
