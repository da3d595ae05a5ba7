//! Closure of inaccessible types leaked by the accessible surface.

use std::collections::BTreeMap;

use apistub_model::descriptor;
use apistub_model::{Annotation, AnnotationElement, EncodedValue, SourceClass, access};

use crate::merge::ClassMap;

/// Inaccessible classes that must still be emitted because the accessible
/// surface mentions them.
#[derive(Debug, Default, Clone)]
pub struct ReferencedSet<'a> {
    classes: BTreeMap<&'a str, &'a SourceClass>,
}

impl<'a> ReferencedSet<'a> {
    pub fn contains(&self, type_name: &str) -> bool {
        self.classes.contains_key(type_name)
    }

    pub fn get(&self, type_name: &str) -> Option<&'a SourceClass> {
        self.classes.get(type_name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in type-name order.
    pub fn classes(&self) -> impl Iterator<Item = &'a SourceClass> + '_ {
        self.classes.values().copied()
    }
}

pub fn find_referenced(classes: &ClassMap) -> ReferencedSet<'_> {
    let mut walker = Walker {
        classes,
        referenced: BTreeMap::new(),
    };

    for class in classes.values() {
        if access::is_inaccessible(class.access_flags) {
            continue;
        }
        walker.visit_hierarchy(class);
        for field in &class.fields {
            if access::is_inaccessible(field.access_flags) {
                continue;
            }
            walker.visit_type(&field.field_type);
            walker.visit_annotations(&field.annotations);
        }
        for method in &class.methods {
            if access::is_inaccessible(method.access_flags) {
                continue;
            }
            walker.visit_type(&method.return_type);
            for parameter in &method.parameters {
                walker.visit_type(&parameter.parameter_type);
                walker.visit_annotations(&parameter.annotations);
            }
            walker.visit_annotations(&method.annotations);
        }
    }

    // Direct supertypes of everything found so far, without recursion.
    let found: Vec<&SourceClass> = walker.referenced.values().copied().collect();
    for class in found {
        for supertype in class.supertypes() {
            walker.insert_if_inaccessible(supertype);
        }
    }

    ReferencedSet {
        classes: walker.referenced,
    }
}

struct Walker<'a> {
    classes: &'a ClassMap,
    referenced: BTreeMap<&'a str, &'a SourceClass>,
}

impl<'a> Walker<'a> {
    fn resolve(&self, type_name: &str) -> Option<&'a SourceClass> {
        let classes = self.classes;
        classes
            .get(descriptor::component_type(type_name))
            .filter(|class| access::is_inaccessible(class.access_flags))
    }

    /// Returns the class if it was newly inserted.
    fn insert_if_inaccessible(&mut self, type_name: &str) -> Option<&'a SourceClass> {
        let class = self.resolve(type_name)?;
        match self.referenced.insert(class.type_name.as_str(), class) {
            None => Some(class),
            Some(_) => None,
        }
    }

    fn visit_type(&mut self, type_name: &str) {
        if let Some(class) = self.insert_if_inaccessible(type_name) {
            self.visit_hierarchy(class);
        }
    }

    /// Superclass, annotations and interfaces; never members.
    fn visit_hierarchy(&mut self, class: &SourceClass) {
        if let Some(superclass) = &class.superclass {
            self.visit_type(superclass);
        }
        self.visit_annotations(&class.annotations);
        for interface in &class.interfaces {
            self.visit_type(interface);
        }
    }

    fn visit_annotations(&mut self, annotations: &[Annotation]) {
        for annotation in annotations {
            if annotation.is_opaque_platform_marker() {
                continue;
            }
            self.visit_type(&annotation.annotation_type);
            self.visit_elements(&annotation.elements);
        }
    }

    fn visit_elements(&mut self, elements: &[AnnotationElement]) {
        for element in elements {
            self.visit_value(&element.value);
        }
    }

    fn visit_value(&mut self, value: &EncodedValue) {
        match value {
            EncodedValue::Annotation(annotation) => {
                self.visit_type(&annotation.annotation_type);
                self.visit_elements(&annotation.elements);
            }
            EncodedValue::Array(values) => {
                for value in values {
                    self.visit_value(value);
                }
            }
            EncodedValue::Type(type_name) => self.visit_type(type_name),
            EncodedValue::Enum(field) | EncodedValue::Field(field) => {
                self.visit_type(&field.defining_class);
                self.visit_type(&field.field_type);
            }
            EncodedValue::Method(method) => {
                self.visit_type(&method.defining_class);
                self.visit_type(&method.return_type);
                for parameter_type in &method.parameter_types {
                    self.visit_type(parameter_type);
                }
            }
            _ => {}
        }
    }
}
