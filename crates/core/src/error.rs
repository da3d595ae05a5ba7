use std::path::PathBuf;

use apistub_classfile::ClassFileError;
use apistub_dex::DexError;
use apistub_model::{BoxError, ModelError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Class source error: {0}")]
    Source(String),
    #[error("No class source can read {0}")]
    UnsupportedInput(PathBuf),
    #[error(transparent)]
    Dex(#[from] DexError),
    #[error(transparent)]
    ClassFile(#[from] ClassFileError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Unsupported {kind} value in {context}")]
    UnsupportedValue {
        kind: &'static str,
        context: &'static str,
    },
}

impl From<BoxError> for ExtractError {
    fn from(err: BoxError) -> Self {
        ExtractError::Source(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
