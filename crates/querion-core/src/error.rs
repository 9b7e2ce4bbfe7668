//! Error types for query compilation and execution.

use std::fmt;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type for criteria compilation and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Alias resolution failures during compilation
    Resolution(ResolutionError),
    /// Structurally invalid specifications
    Specification(SpecificationError),
    /// Reference-engine execution failures
    Execution(ExecutionError),
}

/// An alias that could not be resolved through any enclosing scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    /// The alias that failed to resolve
    pub alias: String,
}

/// A structural violation in a specification tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificationError {
    /// The kind of violation
    pub kind: SpecificationErrorKind,
    /// Human-readable error message
    pub message: String,
}

/// The kinds of structural specification violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificationErrorKind {
    /// Logical combinator constructed with no operands
    EmptyOperands,
    /// Case expression with no branches
    EmptyCaseBranches,
    /// Two sources bound under the same alias in one scope
    DuplicateAlias,
    /// Query specification with no from clause
    MissingFrom,
    /// Update statement with no assignments
    EmptyAssignments,
    /// Node used in a mutation context that does not support it
    UnsupportedInContext,
}

/// A failure raised by the reference engine while executing criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    /// The kind of failure
    pub kind: ExecutionErrorKind,
    /// Human-readable error message
    pub message: String,
}

/// The kinds of execution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// Referenced table does not exist
    UnknownTable,
    /// Referenced column does not exist
    UnknownColumn,
    /// Alias not bound in any evaluation scope
    UnknownAlias,
    /// Value of the wrong kind reached an operation
    TypeMismatch,
    /// LIKE pattern could not be translated
    InvalidPattern,
    /// Scalar subquery produced more than one row or column
    NonScalarSubquery,
    /// Single-result execution matched no rows
    NoResult,
    /// Single-result execution matched more than one row
    NonUniqueResult,
}

impl Error {
    /// Create a resolution error for an alias.
    pub fn resolution(alias: impl Into<String>) -> Self {
        Error::Resolution(ResolutionError {
            alias: alias.into(),
        })
    }

    /// Create a specification error.
    pub fn specification(kind: SpecificationErrorKind, message: impl Into<String>) -> Self {
        Error::Specification(SpecificationError {
            kind,
            message: message.into(),
        })
    }

    /// Create an execution error.
    pub fn execution(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Error::Execution(ExecutionError {
            kind,
            message: message.into(),
        })
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolvable alias `{}`", self.alias)
    }
}

impl fmt::Display for SpecificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed specification: {}", self.message)
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "execution failed: {}", self.message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Resolution(e) => e.fmt(f),
            Error::Specification(e) => e.fmt(f),
            Error::Execution(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_alias() {
        let err = Error::resolution("missing");
        assert_eq!(err.to_string(), "unresolvable alias `missing`");
    }

    #[test]
    fn test_specification_error_carries_kind() {
        let err = Error::specification(SpecificationErrorKind::EmptyOperands, "and() without operands");
        match err {
            Error::Specification(e) => assert_eq!(e.kind, SpecificationErrorKind::EmptyOperands),
            _ => panic!("expected specification error"),
        }
    }
}
