//! Fatal error types
//!
//! Validation failures are data ([`NamedErrors`]); the types here are
//! programmer errors that abort a walk: malformed annotations, rules that do
//! not build, fields that cannot be assigned.

use fieldtag_expression::ParseError;
use thiserror::Error;

use crate::reflect::SetError;
use crate::validation::{NamedErrors, ValidationError};

/// Error aborting a walk.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TagError {
    /// A handler rejected its annotation value.
    #[error("annotation `{tag}:\"{value}\"`: {source}")]
    Parse {
        tag: String,
        value: String,
        #[source]
        source: Box<TagError>,
    },

    /// A rule expression did not build.
    #[error(transparent)]
    Rule(#[from] BuildError),

    /// A handler tried to modify a value walked through a shared reference.
    #[error("field `{path}` cannot be set: the value was not passed mutably")]
    Unsettable { path: String },

    /// A field path no longer resolves to a value.
    #[error("field `{path}` does not resolve to a value")]
    Unresolved { path: String },

    /// Assigning a literal to a field failed.
    #[error("cannot set field `{path}`: {source}")]
    Set {
        path: String,
        #[source]
        source: SetError,
    },

    /// Handler-specific failure.
    #[error("{0}")]
    Custom(String),
}

impl TagError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Stable code for programmatic handling.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "TAG:PARSE",
            Self::Rule(_) => "TAG:RULE",
            Self::Unsettable { .. } => "TAG:UNSETTABLE",
            Self::Unresolved { .. } => "TAG:UNRESOLVED",
            Self::Set { .. } => "TAG:SET",
            Self::Custom(_) => "TAG:CUSTOM",
        }
    }

    /// Follows `Parse` wrappers to the handler's own error.
    #[must_use]
    pub fn root_cause(&self) -> &TagError {
        match self {
            Self::Parse { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Error building a validator from a rule expression.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("unknown function or symbol `{name}`")]
    Unknown { name: String },

    #[error("symbol `{name}` is not a validator")]
    NotAValidator { name: String },

    #[error("`{function}` expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("`{function}` argument {index} must be {expected}, got {found}")]
    ArgumentType {
        function: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("`{function}`: {message}")]
    InvalidArgument { function: String, message: String },
}

impl BuildError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax(err) => err.code(),
            Self::Unknown { .. } => "RULE:UNKNOWN",
            Self::NotAValidator { .. } => "RULE:NOT_VALIDATOR",
            Self::Arity { .. } => "RULE:ARITY",
            Self::ArgumentType { .. } => "RULE:ARG_TYPE",
            Self::InvalidArgument { .. } => "RULE:ARG_INVALID",
        }
    }
}

/// Outcome of the top-level validation entry points.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// Fatal: bad annotation, bad rule, failed assignment.
    #[error(transparent)]
    Tag(#[from] TagError),

    /// A single value failed its rule.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Fields of a structure failed their rules.
    #[error(transparent)]
    Fields(#[from] NamedErrors),
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Self::Tag(TagError::Rule(err))
    }
}

impl Error {
    /// Whether this is a validation failure rather than a programmer error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Invalid(_) | Self::Fields(_))
    }

    #[must_use]
    pub fn as_fields(&self) -> Option<&NamedErrors> {
        match self {
            Self::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_invalid(&self) -> Option<&ValidationError> {
        match self {
            Self::Invalid(error) => Some(error),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
