use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Errors raised while building or using a schema, or while planning. These fail fast: the
/// first one encountered aborts the operation (unlike composition errors, which accumulate).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SingleFederationError {
    #[error("An internal error has occurred, please report this bug. Details: {message}")]
    Internal { message: String },
    #[error("{message}")]
    InvalidGraphQL { message: String },
    #[error("{message}")]
    UnsupportedFeature { message: String },
    #[error("{message}")]
    TypeDefinitionInvalid { message: String },
    #[error("{message}")]
    DirectiveDefinitionInvalid { message: String },
    #[error("Invalid subgraph: {message}")]
    InvalidSubgraph { message: String },
    #[error("Invalid supergraph: {message}")]
    InvalidSupergraph { message: String },
    #[error("Cannot query field \"{field_name}\" on type \"{type_name}\".")]
    CannotQueryField { field_name: String, type_name: String },
    #[error("Unknown variable \"${name}\"")]
    UnknownVariable { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipleFederationErrors {
    pub errors: Vec<SingleFederationError>,
}

impl Display for MultipleFederationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.errors.iter().map(|e| e.to_string()).join("\n"))
    }
}

impl std::error::Error for MultipleFederationErrors {}

impl MultipleFederationErrors {
    pub fn push(&mut self, error: FederationError) {
        match error {
            FederationError::SingleFederationError(error) => self.errors.push(error),
            FederationError::MultipleFederationErrors(errors) => {
                self.errors.extend(errors.errors);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FederationError {
    #[error(transparent)]
    SingleFederationError(#[from] SingleFederationError),
    #[error(transparent)]
    MultipleFederationErrors(#[from] MultipleFederationErrors),
}

impl FederationError {
    pub fn internal(message: impl Into<String>) -> Self {
        SingleFederationError::Internal {
            message: message.into(),
        }
        .into()
    }
}

impl<T> From<apollo_compiler::validation::WithErrors<T>> for FederationError {
    fn from(value: apollo_compiler::validation::WithErrors<T>) -> Self {
        SingleFederationError::InvalidGraphQL {
            message: value.errors.to_string(),
        }
        .into()
    }
}

/// The stable codes attached to composition errors. The `Display` form is the code string
/// surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
pub enum ErrorCode {
    #[strum(to_string = "INTERNAL")]
    Internal,
    #[strum(to_string = "OVERRIDE_FROM_SELF_ERROR")]
    OverrideFromSelfError,
    #[strum(to_string = "OVERRIDE_SOURCE_HAS_OVERRIDE")]
    OverrideSourceHasOverride,
    #[strum(to_string = "OVERRIDE_COLLISION_WITH_ANOTHER_DIRECTIVE")]
    OverrideCollisionWithAnotherDirective,
    // Reserved for type-level @override; defined in the taxonomy but never emitted today.
    #[strum(to_string = "OVERRIDE_ON_BOTH_FIELD_AND_TYPE")]
    OverrideOnBothFieldAndType,
    #[strum(to_string = "INVALID_FIELD_SHARING")]
    InvalidFieldSharing,
}

/// An error raised during composition. Composition keeps going past recoverable errors so
/// callers get as many of these as possible in one pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    #[error("{message}")]
    OverrideFromSelfError { message: String },
    #[error("{message}")]
    OverrideSourceHasOverride { message: String },
    #[error("{message}")]
    OverrideCollisionWithAnotherDirective { message: String },
    #[error("{message}")]
    OverrideOnBothFieldAndType { message: String },
    #[error("{message}")]
    InvalidFieldSharing { message: String },
    #[error(transparent)]
    InternalError(#[from] FederationError),
}

impl CompositionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::OverrideFromSelfError { .. } => ErrorCode::OverrideFromSelfError,
            Self::OverrideSourceHasOverride { .. } => ErrorCode::OverrideSourceHasOverride,
            Self::OverrideCollisionWithAnotherDirective { .. } => {
                ErrorCode::OverrideCollisionWithAnotherDirective
            }
            Self::OverrideOnBothFieldAndType { .. } => ErrorCode::OverrideOnBothFieldAndType,
            Self::InvalidFieldSharing { .. } => ErrorCode::InvalidFieldSharing,
            Self::InternalError(_) => ErrorCode::Internal,
        }
    }
}

/// A composition hint: non-fatal advice surfaced alongside a successful composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionHint {
    pub code: &'static str,
    pub message: String,
}

impl Display for CompositionHint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.code, self.message)
    }
}
