use apistub_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("unknown container format: {0}")]
    UnknownFormat(String),

    #[error("bad dex magic")]
    BadMagic,

    #[error("unsupported dex version {0}")]
    UnsupportedVersion(String),

    #[error("truncated data: need {len} bytes at offset {offset:#x}")]
    Truncated { offset: usize, len: usize },

    #[error("{kind} index {index} out of range")]
    IndexOutOfRange { kind: &'static str, index: u32 },

    #[error("invalid LEB128 at offset {0:#x}")]
    InvalidLeb128(usize),

    #[error("invalid MUTF-8 string at offset {0:#x}")]
    InvalidString(usize),

    #[error("unsupported encoded value type: {0}")]
    UnsupportedValueType(&'static str),

    #[error("invalid encoded value type {value_type:#04x} at offset {offset:#x}")]
    InvalidValueType { value_type: u8, offset: usize },

    #[error("encoded value of {size} bytes too wide at offset {offset:#x}")]
    InvalidValueSize { size: usize, offset: usize },

    #[error("invalid annotation visibility {visibility:#04x} at offset {offset:#x}")]
    InvalidVisibility { visibility: u8, offset: usize },

    #[error("malformed instruction stream: {0}")]
    MalformedCode(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, DexError>;
