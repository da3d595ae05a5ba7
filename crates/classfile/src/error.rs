use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    Ristretto(#[from] ristretto_classfile::Error),
    #[error("{what} too large: {size}")]
    TooLarge { what: &'static str, size: usize },
}

pub type Result<T> = std::result::Result<T, ClassFileError>;
