//! Reader for dex images and the archives that carry them.
//!
//! [`DexFile`] decodes one image into [`apistub_model::SourceClass`] records.
//! [`DexContainer`] finds every image inside a jar/apk, and [`DexLoader`]
//! exposes both as an [`apistub_model::ClassSource`].

mod annotation;
mod class;
mod code;
pub mod container;
pub mod error;
pub mod file;
mod reader;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod value;

pub use code::instruction_width;
pub use container::{DexContainer, DexLoader};
pub use error::{DexError, Result};
pub use file::DexFile;
