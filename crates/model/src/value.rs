use crate::annotation::AnnotationElement;
use crate::error::{ModelError, Result};

/// Reference to a field, as carried by enum and field values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldRef {
    pub defining_class: String,
    pub name: String,
    pub field_type: String,
}

/// Reference to a method, as carried by method values and the
/// enclosing-method marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodRef {
    pub defining_class: String,
    pub name: String,
    pub parameter_types: Vec<String>,
    pub return_type: String,
}

impl MethodRef {
    pub fn descriptor(&self) -> String {
        crate::descriptor::method_descriptor(&self.parameter_types, &self.return_type)
    }
}

/// An annotation nested inside another value (no visibility of its own).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodedAnnotation {
    pub annotation_type: String,
    pub elements: Vec<AnnotationElement>,
}

/// Literal values found in annotations and static field initializers.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Type(String),
    Null,
    Enum(FieldRef),
    Field(FieldRef),
    Method(MethodRef),
    Annotation(EncodedAnnotation),
    Array(Vec<EncodedValue>),
}

impl EncodedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            EncodedValue::Boolean(_) => "boolean",
            EncodedValue::Byte(_) => "byte",
            EncodedValue::Short(_) => "short",
            EncodedValue::Char(_) => "char",
            EncodedValue::Int(_) => "int",
            EncodedValue::Long(_) => "long",
            EncodedValue::Float(_) => "float",
            EncodedValue::Double(_) => "double",
            EncodedValue::String(_) => "string",
            EncodedValue::Type(_) => "type",
            EncodedValue::Null => "null",
            EncodedValue::Enum(_) => "enum",
            EncodedValue::Field(_) => "field",
            EncodedValue::Method(_) => "method",
            EncodedValue::Annotation(_) => "annotation",
            EncodedValue::Array(_) => "array",
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            EncodedValue::String(s) => Ok(s),
            other => Err(unexpected("string", other)),
        }
    }

    pub fn as_type(&self) -> Result<&str> {
        match self {
            EncodedValue::Type(t) => Ok(t),
            other => Err(unexpected("type", other)),
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match self {
            EncodedValue::Int(v) => Ok(*v),
            other => Err(unexpected("int", other)),
        }
    }

    pub fn as_array(&self) -> Result<&[EncodedValue]> {
        match self {
            EncodedValue::Array(values) => Ok(values),
            other => Err(unexpected("array", other)),
        }
    }

    pub fn as_method(&self) -> Result<&MethodRef> {
        match self {
            EncodedValue::Method(method) => Ok(method),
            other => Err(unexpected("method", other)),
        }
    }

    pub fn as_annotation(&self) -> Result<&EncodedAnnotation> {
        match self {
            EncodedValue::Annotation(annotation) => Ok(annotation),
            other => Err(unexpected("annotation", other)),
        }
    }
}

fn unexpected(expected: &'static str, found: &EncodedValue) -> ModelError {
    ModelError::UnexpectedValue {
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_reject_other_kinds() {
        let value = EncodedValue::Int(7);
        assert_eq!(value.as_int(), Ok(7));
        assert_eq!(
            value.as_str(),
            Err(ModelError::UnexpectedValue {
                expected: "string",
                found: "int"
            })
        );
    }

    #[test]
    fn test_method_ref_descriptor() {
        let method = MethodRef {
            defining_class: "Lpkg/Outer;".into(),
            name: "run".into(),
            parameter_types: vec!["J".into(), "[Ljava/lang/String;".into()],
            return_type: "Z".into(),
        };
        assert_eq!(method.descriptor(), "(J[Ljava/lang/String;)Z");
    }
}
