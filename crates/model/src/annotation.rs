//! Annotations and the reserved platform annotations that encode class-file
//! metadata.

use crate::descriptor;
use crate::error::{ModelError, Result};
use crate::value::EncodedValue;

/// Namespace of the platform's own metadata annotations.
pub const PLATFORM_NAMESPACE: &str = "Ldalvik/annotation";

pub const ENCLOSING_CLASS: &str = "Ldalvik/annotation/EnclosingClass;";
pub const ENCLOSING_METHOD: &str = "Ldalvik/annotation/EnclosingMethod;";
pub const INNER_CLASS: &str = "Ldalvik/annotation/InnerClass;";
pub const MEMBER_CLASSES: &str = "Ldalvik/annotation/MemberClasses;";
pub const SIGNATURE: &str = "Ldalvik/annotation/Signature;";
pub const METHOD_PARAMETERS: &str = "Ldalvik/annotation/MethodParameters;";
pub const THROWS: &str = "Ldalvik/annotation/Throws;";
pub const ANNOTATION_DEFAULT: &str = "Ldalvik/annotation/AnnotationDefault;";
pub const PERMITTED_SUBCLASSES: &str = "Ldalvik/annotation/PermittedSubclasses;";
pub const RECORD: &str = "Ldalvik/annotation/Record;";

pub const DEPRECATED: &str = "Ljava/lang/Deprecated;";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Build,
    Runtime,
    System,
}

impl Visibility {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(Visibility::Build),
            0x01 => Some(Visibility::Runtime),
            0x02 => Some(Visibility::System),
            _ => None,
        }
    }

    /// Only runtime-retained annotations stay visible in class files.
    pub fn is_runtime_visible(self) -> bool {
        self == Visibility::Runtime
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationElement {
    pub name: String,
    pub value: EncodedValue,
}

impl AnnotationElement {
    pub fn new(name: impl Into<String>, value: EncodedValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotation {
    pub visibility: Visibility,
    pub annotation_type: String,
    pub elements: Vec<AnnotationElement>,
}

impl Annotation {
    pub fn new(
        visibility: Visibility,
        annotation_type: impl Into<String>,
        elements: Vec<AnnotationElement>,
    ) -> Self {
        Self {
            visibility,
            annotation_type: annotation_type.into(),
            elements,
        }
    }

    pub fn element(&self, name: &str) -> Option<&EncodedValue> {
        self.elements
            .iter()
            .find(|element| element.name == name)
            .map(|element| &element.value)
    }

    /// True for annotations in the platform namespace that carry no type
    /// references worth following.
    pub fn is_opaque_platform_marker(&self) -> bool {
        match self.annotation_type.as_str() {
            SIGNATURE | THROWS | PERMITTED_SUBCLASSES => false,
            other => other.starts_with(PLATFORM_NAMESPACE),
        }
    }

    /// The value of a reserved annotation that must have exactly one element
    /// named `value`.
    pub fn single_value(&self) -> Result<&EncodedValue> {
        match self.elements.as_slice() {
            [element] if element.name == "value" => Ok(&element.value),
            [element] => Err(self.malformed(format!("unexpected element {}", element.name))),
            elements => Err(self.malformed(format!("expected 1 element, found {}", elements.len()))),
        }
    }

    fn malformed(&self, reason: String) -> ModelError {
        ModelError::MalformedAnnotation {
            annotation_type: self.annotation_type.clone(),
            reason,
        }
    }
}

pub fn find<'a>(annotations: &'a [Annotation], annotation_type: &str) -> Option<&'a Annotation> {
    annotations
        .iter()
        .find(|annotation| annotation.annotation_type == annotation_type)
}

pub fn contains(annotations: &[Annotation], annotation_type: &str) -> bool {
    find(annotations, annotation_type).is_some()
}

pub fn is_deprecated(annotations: &[Annotation]) -> bool {
    contains(annotations, DEPRECATED)
}

pub fn is_record(annotations: &[Annotation]) -> bool {
    contains(annotations, RECORD)
}

/// Generic signature stored in the reserved signature annotation, whose value
/// is the signature split into an array of string fragments.
pub fn generic_signature(annotations: &[Annotation]) -> Result<Option<String>> {
    let Some(annotation) = find(annotations, SIGNATURE) else {
        return Ok(None);
    };
    let mut signature = String::new();
    for fragment in annotation.single_value()?.as_array()? {
        signature.push_str(fragment.as_str()?);
    }
    Ok(Some(signature))
}

/// Checked exceptions from the reserved throws annotation, as internal names.
pub fn thrown_exceptions(annotations: &[Annotation]) -> Result<Vec<String>> {
    let Some(annotation) = find(annotations, THROWS) else {
        return Ok(Vec::new());
    };
    annotation
        .single_value()?
        .as_array()?
        .iter()
        .map(|value| Ok(descriptor::internal_name(value.as_type()?).to_string()))
        .collect()
}

/// Inner-class metadata carried by the reserved inner-class marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassRecord {
    pub name: String,
    pub access_flags: u32,
}

impl InnerClassRecord {
    pub fn find_in(annotations: &[Annotation]) -> Result<Option<Self>> {
        match find(annotations, INNER_CLASS) {
            Some(annotation) => Self::from_annotation(annotation),
            None => Ok(None),
        }
    }

    /// Returns `None` for anonymous classes (null name) and for markers that
    /// lack either element.
    pub fn from_annotation(annotation: &Annotation) -> Result<Option<Self>> {
        let mut name = None;
        let mut access_flags = None;
        for element in &annotation.elements {
            match element.name.as_str() {
                "name" => match &element.value {
                    EncodedValue::Null => return Ok(None),
                    value => name = Some(value.as_str()?.to_string()),
                },
                "accessFlags" => access_flags = Some(element.value.as_int()? as u32),
                _ => {}
            }
        }
        Ok(name
            .zip(access_flags)
            .map(|(name, access_flags)| Self { name, access_flags }))
    }
}
