//! Encoded values to class-file annotation and constant values.

use apistub_classfile::{AnnotationNode, ConstantValue, ElementValue};
use apistub_model::{AnnotationElement, EncodedValue};

use crate::error::{ExtractError, Result};

pub fn element_value(value: &EncodedValue) -> Result<ElementValue> {
    let translated = match value {
        EncodedValue::Boolean(v) => ElementValue::Boolean(*v),
        EncodedValue::Byte(v) => ElementValue::Byte(*v),
        EncodedValue::Short(v) => ElementValue::Short(*v),
        EncodedValue::Char(v) => ElementValue::Char(*v),
        EncodedValue::Int(v) => ElementValue::Int(*v),
        EncodedValue::Long(v) => ElementValue::Long(*v),
        EncodedValue::Float(v) => ElementValue::Float(*v),
        EncodedValue::Double(v) => ElementValue::Double(*v),
        EncodedValue::String(v) => ElementValue::String(v.clone()),
        EncodedValue::Type(descriptor) => ElementValue::Class(descriptor.clone()),
        EncodedValue::Enum(field) | EncodedValue::Field(field) => ElementValue::Enum {
            descriptor: field.defining_class.clone(),
            name: field.name.clone(),
        },
        // only the owner and name fit the enum pair; the signature is dropped
        EncodedValue::Method(method) => ElementValue::Enum {
            descriptor: method.defining_class.clone(),
            name: method.name.clone(),
        },
        EncodedValue::Annotation(annotation) => ElementValue::Annotation(annotation_node(
            &annotation.annotation_type,
            &annotation.elements,
        )?),
        EncodedValue::Array(values) => ElementValue::Array(
            values
                .iter()
                .map(element_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        EncodedValue::Null => {
            return Err(ExtractError::UnsupportedValue {
                kind: value.kind(),
                context: "annotation element",
            });
        }
    };
    Ok(translated)
}

pub fn annotation_node(
    annotation_type: &str,
    elements: &[AnnotationElement],
) -> Result<AnnotationNode> {
    let mut node = AnnotationNode::new(annotation_type);
    for element in elements {
        node.values
            .push((element.name.clone(), element_value(&element.value)?));
    }
    Ok(node)
}

/// Constant for a field's `ConstantValue` attribute. A null initializer means
/// no constant.
pub fn constant_value(value: &EncodedValue) -> Result<Option<ConstantValue>> {
    let constant = match value {
        EncodedValue::Boolean(v) => ConstantValue::Int(i32::from(*v)),
        EncodedValue::Byte(v) => ConstantValue::Int(i32::from(*v)),
        EncodedValue::Short(v) => ConstantValue::Int(i32::from(*v)),
        EncodedValue::Char(v) => ConstantValue::Int(i32::from(*v)),
        EncodedValue::Int(v) => ConstantValue::Int(*v),
        EncodedValue::Long(v) => ConstantValue::Long(*v),
        EncodedValue::Float(v) => ConstantValue::Float(*v),
        EncodedValue::Double(v) => ConstantValue::Double(*v),
        EncodedValue::String(v) => ConstantValue::String(v.clone()),
        EncodedValue::Null => return Ok(None),
        other => {
            return Err(ExtractError::UnsupportedValue {
                kind: other.kind(),
                context: "field initializer",
            });
        }
    };
    Ok(Some(constant))
}
