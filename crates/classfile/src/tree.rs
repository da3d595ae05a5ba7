//! Mutable class tree, filled in by callers and serialized by the writer.
//!
//! Names are internal names (`java/lang/Object`) wherever the class-file
//! format stores a class reference, and descriptors everywhere else.

use crate::insn::Insn;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassNode {
    pub version: u16,
    /// Class-file access flags plus the pseudo-flags for records and
    /// deprecation, which the writer turns into attributes.
    pub access: u32,
    pub name: String,
    pub signature: Option<String>,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
    pub enclosing_method: Option<EnclosingMethod>,
    pub inner_classes: Vec<InnerClassNode>,
    pub permitted_subclasses: Vec<String>,
    pub visible_annotations: Vec<AnnotationNode>,
    pub invisible_annotations: Vec<AnnotationNode>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
}

impl ClassNode {
    pub fn new(version: u16, access: u32, name: impl Into<String>) -> Self {
        Self {
            version,
            access,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_annotation(&mut self, annotation: AnnotationNode, visible: bool) {
        if visible {
            self.visible_annotations.push(annotation);
        } else {
            self.invisible_annotations.push(annotation);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnclosingMethod {
    pub owner: String,
    pub name: Option<String>,
    pub descriptor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InnerClassNode {
    pub name: String,
    pub outer_name: Option<String>,
    pub inner_name: Option<String>,
    pub access: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldNode {
    pub access: u32,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub value: Option<ConstantValue>,
    pub visible_annotations: Vec<AnnotationNode>,
    pub invisible_annotations: Vec<AnnotationNode>,
}

impl FieldNode {
    pub fn new(access: u32, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            descriptor: descriptor.into(),
            ..Default::default()
        }
    }

    pub fn add_annotation(&mut self, annotation: AnnotationNode, visible: bool) {
        if visible {
            self.visible_annotations.push(annotation);
        } else {
            self.invisible_annotations.push(annotation);
        }
    }
}

/// Values a `ConstantValue` attribute can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodNode {
    pub access: u32,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    /// Internal names of checked exceptions.
    pub exceptions: Vec<String>,
    pub parameters: Vec<ParameterNode>,
    pub annotation_default: Option<ElementValue>,
    pub visible_annotations: Vec<AnnotationNode>,
    pub invisible_annotations: Vec<AnnotationNode>,
    pub visible_parameter_annotations: Vec<Vec<AnnotationNode>>,
    pub invisible_parameter_annotations: Vec<Vec<AnnotationNode>>,
    pub code: Option<Code>,
}

impl MethodNode {
    pub fn new(access: u32, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            descriptor: descriptor.into(),
            ..Default::default()
        }
    }

    pub fn add_annotation(&mut self, annotation: AnnotationNode, visible: bool) {
        if visible {
            self.visible_annotations.push(annotation);
        } else {
            self.invisible_annotations.push(annotation);
        }
    }

    /// Attaches an annotation to the parameter at `index`, growing the
    /// per-parameter table to `parameter_count` entries.
    pub fn add_parameter_annotation(
        &mut self,
        index: usize,
        parameter_count: usize,
        annotation: AnnotationNode,
        visible: bool,
    ) {
        let table = if visible {
            &mut self.visible_parameter_annotations
        } else {
            &mut self.invisible_parameter_annotations
        };
        let len = parameter_count.max(index + 1);
        if table.len() < len {
            table.resize_with(len, Vec::new);
        }
        table[index].push(annotation);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterNode {
    pub name: String,
    pub access: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub instructions: Vec<Insn>,
    pub local_variables: Vec<LocalVariableNode>,
}

/// A local variable live over the whole method body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalVariableNode {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationNode {
    pub descriptor: String,
    pub values: Vec<(String, ElementValue)>,
}

impl AnnotationNode {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.values.push((name.into(), value));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Class literal, as a descriptor.
    Class(String),
    /// Enum constant: the enum's descriptor and the constant name.
    Enum { descriptor: String, name: String },
    Annotation(AnnotationNode),
    Array(Vec<ElementValue>),
}
