use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("malformed annotation {annotation_type}: {reason}")]
    MalformedAnnotation {
        annotation_type: String,
        reason: String,
    },
    #[error("expected {expected} value, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("malformed type descriptor: {0}")]
    MalformedDescriptor(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
