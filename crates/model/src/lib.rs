//! Read-only model of the classes decoded from a platform image.
//!
//! Everything the transformation pipeline needs to know about an input class
//! lives here: the class, field and method records, the tagged encoded-value
//! union used by annotations and constant initializers, hidden-API
//! categories, and the reserved platform annotations that carry metadata
//! (generic signatures, checked exceptions, inner-class markers, ...).
//!
//! Readers of concrete binary formats implement [`ClassSource`] to feed the
//! pipeline.

pub mod access;
pub mod annotation;
pub mod class;
pub mod descriptor;
pub mod error;
pub mod hidden_api;
pub mod source;
pub mod value;

pub use annotation::{Annotation, AnnotationElement, InnerClassRecord, Visibility};
pub use class::{
    LocalStart, MethodImplementation, MethodParameter, SourceClass, SourceField, SourceMethod,
};
pub use error::{ModelError, Result};
pub use hidden_api::{HiddenApiRestriction, HiddenApiRestrictions};
pub use source::{BoxError, ClassSource};
pub use value::{EncodedAnnotation, EncodedValue, FieldRef, MethodRef};
