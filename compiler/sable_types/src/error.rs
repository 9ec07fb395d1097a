//! Errors raised by the type registry.

use std::fmt;

use crate::registry::Phase;

/// Why a linearization could not be computed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LinearizationFailureReason {
    /// No merge head was free of every other tail.
    InconsistentPrecedence,
    /// A type is (transitively) its own base.
    Cycle,
}

impl fmt::Display for LinearizationFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InconsistentPrecedence => f.write_str("inconsistent base precedence"),
            Self::Cycle => f.write_str("cyclic base relation"),
        }
    }
}

/// Type registry error.
///
/// Type names are rendered at construction so errors outlive the registry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeError {
    LinearizationFailure {
        ty: String,
        reason: LinearizationFailureReason,
    },
    MemberNotFound {
        ty: String,
        member: String,
    },
    /// No relation edge connects the two types after normalizing indirection.
    TypeMismatch {
        from: String,
        to: String,
    },
    DuplicateMember {
        ty: String,
        member: String,
    },
    /// A type contains itself by value.
    RecursiveLayout {
        ty: String,
    },
    /// Raw data does not match the descriptor's size.
    SizeMismatch {
        ty: String,
        expected: usize,
        got: usize,
    },
    /// Operation not allowed in the registry's current startup phase.
    Phase {
        operation: &'static str,
        phase: Phase,
    },
    /// The id was not issued by this registry.
    UnknownType {
        id: u32,
    },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinearizationFailure { ty, reason } => {
                write!(f, "cannot linearize `{ty}`: {reason}")
            }
            Self::MemberNotFound { ty, member } => write!(f, "`{ty}` has no member `{member}`"),
            Self::TypeMismatch { from, to } => {
                write!(f, "no conversion from `{from}` to `{to}`")
            }
            Self::DuplicateMember { ty, member } => {
                write!(f, "`{ty}` already declares member `{member}`")
            }
            Self::RecursiveLayout { ty } => write!(f, "`{ty}` contains itself by value"),
            Self::SizeMismatch { ty, expected, got } => {
                write!(f, "`{ty}` is {expected} bytes, got {got}")
            }
            Self::Phase { operation, phase } => {
                write!(f, "cannot {operation} while the registry is {phase}")
            }
            Self::UnknownType { id } => write!(f, "type #{id} is not registered here"),
        }
    }
}

impl std::error::Error for TypeError {}
