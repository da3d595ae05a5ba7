use apistub_classfile::ClassNode;
use apistub_model::{SourceClass, annotation, descriptor};

use super::{class_access, class_version, is_hidden_nested};
use crate::error::Result;

/// Type-hierarchy placeholder for a referenced inaccessible class: names,
/// supertypes and generic signature only.
pub fn skeleton(class: &SourceClass) -> Result<Option<ClassNode>> {
    if is_hidden_nested(class)? {
        return Ok(None);
    }
    let access_flags = class_access(class);
    let mut node = ClassNode::new(class_version(access_flags), access_flags, class.internal_name());
    node.signature = annotation::generic_signature(&class.annotations)?;
    node.super_name = class
        .superclass
        .as_deref()
        .map(|superclass| descriptor::internal_name(superclass).to_string());
    node.interfaces = class
        .interfaces
        .iter()
        .map(|interface| descriptor::internal_name(interface).to_string())
        .collect();
    Ok(Some(node))
}
