use apistub_classfile::{
    AnnotationNode, ClassNode, EnclosingMethod, FieldNode, InnerClassNode, MethodNode,
    ParameterNode,
};
use apistub_model::access::{
    self, ACC_BRIDGE, ACC_DECLARED_SYNCHRONIZED, ACC_FINAL, ACC_STATIC, ACC_SYNCHRONIZED,
};
use apistub_model::annotation::{
    ANNOTATION_DEFAULT, ENCLOSING_CLASS, ENCLOSING_METHOD, INNER_CLASS, MEMBER_CLASSES,
    METHOD_PARAMETERS, PERMITTED_SUBCLASSES, RECORD, SIGNATURE, THROWS,
};
use apistub_model::descriptor::{self, OBJECT, STRING};
use apistub_model::hidden_api;
use apistub_model::{
    Annotation, EncodedAnnotation, HiddenApiRestrictions, InnerClassRecord, SourceClass,
    SourceField, SourceMethod, annotation,
};
use tracing::warn;

use super::hidden_api::restriction_annotation;
use super::{class_access, class_version, is_hidden_nested, member_access};
use crate::body;
use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::merge::ClassMap;
use crate::params;
use crate::reachability::ReferencedSet;
use crate::translate;

/// Builds full stubs for accessible classes.
pub struct ClassTransformer<'a> {
    classes: &'a ClassMap,
    referenced: &'a ReferencedSet<'a>,
    config: &'a ExtractorConfig,
    uses_restrictions: bool,
}

impl<'a> ClassTransformer<'a> {
    pub fn new(
        classes: &'a ClassMap,
        referenced: &'a ReferencedSet<'a>,
        config: &'a ExtractorConfig,
    ) -> Self {
        Self {
            classes,
            referenced,
            config,
            uses_restrictions: false,
        }
    }

    /// Whether any emitted member so far carries a restriction annotation.
    pub fn uses_restrictions(&self) -> bool {
        self.uses_restrictions
    }

    /// Returns `None` for classes that are not part of the public surface.
    pub fn transform(&mut self, class: &SourceClass) -> Result<Option<ClassNode>> {
        if access::is_inaccessible(class.access_flags) || is_hidden_nested(class)? {
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
        node.source_file = class.source_file.clone();

        for annotation in &class.annotations {
            self.class_annotation(&mut node, class, annotation)?;
        }

        for field in &class.fields {
            if let Some(field) = self.field(field)? {
                node.fields.push(field);
            }
        }

        let defaults = annotation_defaults(class)?;
        for method in &class.methods {
            if let Some(method) = self.method(class, method, defaults)? {
                node.methods.push(method);
            }
        }

        if self.config.stub_initializer {
            let mut initializer = MethodNode::new(ACC_STATIC, "<clinit>", "()V");
            initializer.code = Some(body::stub_initializer_body());
            node.methods.push(initializer);
        }

        Ok(Some(node))
    }

    fn class_annotation(
        &self,
        node: &mut ClassNode,
        class: &SourceClass,
        annotation: &Annotation,
    ) -> Result<()> {
        match annotation.annotation_type.as_str() {
            ENCLOSING_METHOD => {
                let method = annotation.single_value()?.as_method()?;
                node.enclosing_method = Some(EnclosingMethod {
                    owner: descriptor::internal_name(&method.defining_class).to_string(),
                    name: Some(method.name.clone()),
                    descriptor: Some(method.descriptor()),
                });
            }
            INNER_CLASS => {
                let Some(record) = InnerClassRecord::from_annotation(annotation)? else {
                    return Ok(());
                };
                if !self.is_emitted_nested(&class.type_name, &record) {
                    return Ok(());
                }
                let name = class.internal_name();
                node.inner_classes.push(InnerClassNode {
                    name: name.to_string(),
                    outer_name: descriptor::outer_name(name).map(str::to_string),
                    inner_name: Some(record.name),
                    access: record.access_flags,
                });
            }
            MEMBER_CLASSES => {
                for member in annotation.single_value()?.as_array()? {
                    let member_type = member.as_type()?;
                    let Some(member_class) = self.classes.get(member_type) else {
                        warn!("Class not found: {}", descriptor::internal_name(member_type));
                        continue;
                    };
                    let Some(record) = member_class.inner_class_record()? else {
                        continue;
                    };
                    if !self.is_emitted_nested(member_type, &record) {
                        continue;
                    }
                    node.inner_classes.push(InnerClassNode {
                        name: member_class.internal_name().to_string(),
                        outer_name: Some(node.name.clone()),
                        inner_name: Some(record.name),
                        access: record.access_flags,
                    });
                }
            }
            PERMITTED_SUBCLASSES => {
                node.permitted_subclasses = annotation
                    .single_value()?
                    .as_array()?
                    .iter()
                    .map(|subclass| Ok(descriptor::internal_name(subclass.as_type()?).to_string()))
                    .collect::<Result<Vec<_>>>()?;
            }
            RECORD => {
                warn!("Record class left untransformed: {}", class.type_name);
            }
            ENCLOSING_CLASS | SIGNATURE | THROWS | ANNOTATION_DEFAULT => {}
            _ => {
                let translated = translate::annotation_node(&annotation.annotation_type, &annotation.elements)?;
                node.add_annotation(translated, annotation.visibility.is_runtime_visible());
            }
        }
        Ok(())
    }

    /// Inner-class entries for inaccessible nested classes are kept only when
    /// the class is emitted as a skeleton.
    fn is_emitted_nested(&self, type_name: &str, record: &InnerClassRecord) -> bool {
        access::is_accessible(record.access_flags) || self.referenced.contains(type_name)
    }

    fn field(&mut self, field: &SourceField) -> Result<Option<FieldNode>> {
        if access::is_inaccessible(field.access_flags) {
            return Ok(None);
        }

        let mut node = FieldNode::new(
            member_access(field.access_flags, &field.annotations),
            &field.name,
            &field.field_type,
        );
        node.signature = annotation::generic_signature(&field.annotations)?;
        if field.access_flags & ACC_FINAL != 0
            && !field.defining_class.starts_with(&self.config.resource_id_namespace)
        {
            if let Some(value) = &field.initial_value {
                node.value = translate::constant_value(value)?;
            }
        }

        for annotation in &field.annotations {
            if annotation.annotation_type == SIGNATURE {
                continue;
            }
            let translated = translate::annotation_node(&annotation.annotation_type, &annotation.elements)?;
            node.add_annotation(translated, annotation.visibility.is_runtime_visible());
        }
        if let Some(restriction) = self.restriction(&field.hidden_api) {
            node.add_annotation(restriction, false);
        }
        Ok(Some(node))
    }

    fn method(
        &mut self,
        class: &SourceClass,
        method: &SourceMethod,
        defaults: Option<&EncodedAnnotation>,
    ) -> Result<Option<MethodNode>> {
        if access::is_inaccessible(method.access_flags)
            || method.access_flags & ACC_BRIDGE != 0
            || method.name == "<clinit>"
            || is_object_override(method)
        {
            return Ok(None);
        }

        let mut access_flags = member_access(method.access_flags, &method.annotations);
        if method.access_flags & ACC_DECLARED_SYNCHRONIZED != 0 {
            if let Some(implementation) = &method.implementation {
                if implementation.has_monitor_enter() {
                    access_flags |= ACC_SYNCHRONIZED;
                } else {
                    access_flags &= !ACC_SYNCHRONIZED;
                }
            }
        }

        let mut node = MethodNode::new(access_flags, &method.name, method.descriptor());
        node.signature = annotation::generic_signature(&method.annotations)?;
        node.exceptions = annotation::thrown_exceptions(&method.annotations)?;

        if let Some(defaults) = defaults {
            node.annotation_default = defaults
                .elements
                .iter()
                .find(|element| element.name == method.name)
                .map(|element| translate::element_value(&element.value))
                .transpose()?;
        }

        for annotation in &method.annotations {
            match annotation.annotation_type.as_str() {
                SIGNATURE | THROWS | METHOD_PARAMETERS => {}
                _ => {
                    let translated = translate::annotation_node(&annotation.annotation_type, &annotation.elements)?;
                    node.add_annotation(translated, annotation.visibility.is_runtime_visible());
                }
            }
        }
        if let Some(restriction) = self.restriction(&method.hidden_api) {
            node.add_annotation(restriction, false);
        }

        let parameters = params::parameter_records(method);
        for (index, parameter) in parameters.iter().enumerate() {
            for annotation in parameter.annotations {
                if annotation.annotation_type == SIGNATURE {
                    continue;
                }
                let translated = translate::annotation_node(&annotation.annotation_type, &annotation.elements)?;
                node.add_parameter_annotation(
                    index,
                    parameters.len(),
                    translated,
                    annotation.visibility.is_runtime_visible(),
                );
            }
        }

        if method.implementation.is_some() {
            node.parameters = parameters
                .iter()
                .map_while(|parameter| {
                    parameter.name.as_ref().map(|name| ParameterNode {
                        name: name.clone(),
                        access: 0,
                    })
                })
                .collect();
            node.code = Some(body::stub_body(class, method, &parameters));
        }

        Ok(Some(node))
    }

    fn restriction(&mut self, restrictions: &HiddenApiRestrictions) -> Option<AnnotationNode> {
        if !self.config.hidden_api_annotations || !hidden_api::is_restricted(restrictions) {
            return None;
        }
        self.uses_restrictions = true;
        Some(restriction_annotation(restrictions))
    }
}

/// The element-name to default-value table of an annotation type.
fn annotation_defaults(class: &SourceClass) -> Result<Option<&EncodedAnnotation>> {
    if !class.is_annotation_type() {
        return Ok(None);
    }
    match annotation::find(&class.annotations, ANNOTATION_DEFAULT) {
        Some(defaults) => Ok(Some(defaults.single_value()?.as_annotation()?)),
        None => Ok(None),
    }
}

/// Instance methods overriding one of the `java.lang.Object` methods that
/// every class inherits anyway.
pub fn is_object_override(method: &SourceMethod) -> bool {
    if method.is_static() || method.defining_class == OBJECT {
        return false;
    }
    let parameters: Vec<&str> = method.parameter_types().collect();
    let return_type = method.return_type.as_str();
    match method.name.as_str() {
        "clone" => parameters.is_empty() && return_type == OBJECT,
        "equals" => parameters == [OBJECT] && return_type == "Z",
        "finalize" => parameters.is_empty() && return_type == "V",
        "hashCode" => parameters.is_empty() && return_type == "I",
        "toString" => parameters.is_empty() && return_type == STRING,
        _ => false,
    }
}
