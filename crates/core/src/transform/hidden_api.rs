use apistub_classfile::{AnnotationNode, ClassNode, ElementValue, MethodNode, V1_8};
use apistub_model::HiddenApiRestrictions;
use apistub_model::access::{ACC_ABSTRACT, ACC_ANNOTATION, ACC_INTERFACE, ACC_PUBLIC};
use apistub_model::descriptor;

pub const RESTRICTION_TYPE: &str = "Landroid/annotation/HiddenApiRestriction;";
pub const RESTRICTION_VALUE: &str = "value";

/// Invisible annotation listing the restriction categories of a member.
pub fn restriction_annotation(restrictions: &HiddenApiRestrictions) -> AnnotationNode {
    let categories = restrictions
        .iter()
        .map(|restriction| ElementValue::String(restriction.name().to_string()))
        .collect();
    AnnotationNode::new(RESTRICTION_TYPE).with_value(RESTRICTION_VALUE, ElementValue::Array(categories))
}

/// Declaration of the restriction annotation type itself.
pub fn restriction_type() -> ClassNode {
    let mut class = ClassNode::new(
        V1_8,
        ACC_ANNOTATION | ACC_ABSTRACT | ACC_INTERFACE,
        descriptor::internal_name(RESTRICTION_TYPE),
    );
    class.super_name = Some("java/lang/Object".to_string());
    class.interfaces = vec!["java/lang/annotation/Annotation".to_string()];
    class.methods.push(MethodNode::new(
        ACC_PUBLIC | ACC_ABSTRACT,
        RESTRICTION_VALUE,
        "()[Ljava/lang/String;",
    ));
    class
}
