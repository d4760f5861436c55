use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building resource, entitlement and grant values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Missing identifier for {kind}")]
    MissingIdentifier { kind: String },

    #[error("Resource type {resource_type} does not carry the {required} trait")]
    MissingTrait {
        resource_type: String,
        required: String
    },

    #[error("Expected a {expected} resource, got {actual}")]
    UnexpectedResourceType { expected: String, actual: String }
}
