use std::io::Cursor;

use apistub_model::access::{ACC_DEPRECATED, ACC_RECORD};
use ristretto_classfile::attributes::{
    Annotation, AnnotationElement, AnnotationValuePair, Attribute, InnerClass, Instruction,
    LocalVariableTable, LocalVariableTypeTable, MethodParameter, NestedClassAccessFlags,
    ParameterAnnotation,
};
use ristretto_classfile::{
    ClassAccessFlags, ClassFile, Field, FieldAccessFlags, FieldType, Method, MethodAccessFlags,
    Version,
};

use crate::constant_pool::ConstantPoolBuilder;
use crate::error::{ClassFileError, Result};
use crate::insn::Insn;
use crate::tree::{
    AnnotationNode, ClassNode, Code, ConstantValue, ElementValue, FieldNode, MethodNode,
};

/// Flags the class-file format does not have; the writer maps them onto
/// attributes or drops them.
const PSEUDO_FLAGS: u32 = ACC_RECORD | ACC_DEPRECATED;

/// Lowers a [`ClassNode`] into a ristretto [`ClassFile`] and serializes it.
pub struct ClassWriter {
    pool: ConstantPoolBuilder,
}

impl ClassWriter {
    pub fn write(class: &ClassNode) -> Result<Vec<u8>> {
        let class_file = Self::lower(class)?;
        let mut bytes = Vec::new();
        class_file.to_bytes(&mut bytes)?;
        Ok(bytes)
    }

    pub fn lower(class: &ClassNode) -> Result<ClassFile> {
        let mut writer = ClassWriter {
            pool: ConstantPoolBuilder::new(),
        };
        let this_class = writer.pool.class(&class.name)?;
        let super_class = match &class.super_name {
            Some(name) => writer.pool.class(name)?,
            None => 0,
        };
        let interfaces = class
            .interfaces
            .iter()
            .map(|interface| writer.pool.class(interface))
            .collect::<Result<Vec<_>>>()?;
        let fields = class
            .fields
            .iter()
            .map(|field| writer.field(field))
            .collect::<Result<Vec<_>>>()?;
        let methods = class
            .methods
            .iter()
            .map(|method| writer.method(method))
            .collect::<Result<Vec<_>>>()?;
        let attributes = writer.class_attributes(class)?;

        Ok(ClassFile {
            version: Version::from(class.version, 0)?,
            constant_pool: writer.pool.finish(),
            access_flags: ClassAccessFlags::from_bits_retain(access_bits(class.access)),
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn class_attributes(&mut self, class: &ClassNode) -> Result<Vec<Attribute>> {
        let mut attributes = Vec::new();
        if let Some(source_file) = &class.source_file {
            attributes.push(Attribute::SourceFile {
                name_index: self.pool.utf8("SourceFile")?,
                source_file_index: self.pool.utf8(source_file)?,
            });
        }
        if !class.inner_classes.is_empty() {
            let mut classes = Vec::with_capacity(class.inner_classes.len());
            for inner in &class.inner_classes {
                classes.push(InnerClass {
                    class_info_index: self.pool.class(&inner.name)?,
                    outer_class_info_index: self.optional_class(inner.outer_name.as_deref())?,
                    name_index: self.optional_utf8(inner.inner_name.as_deref())?,
                    access_flags: NestedClassAccessFlags::from_bits_retain(access_bits(inner.access)),
                });
            }
            attributes.push(Attribute::InnerClasses {
                name_index: self.pool.utf8("InnerClasses")?,
                classes,
            });
        }
        if let Some(enclosing) = &class.enclosing_method {
            let method_index = match (&enclosing.name, &enclosing.descriptor) {
                (Some(name), Some(descriptor)) => self.pool.name_and_type(name, descriptor)?,
                _ => 0,
            };
            attributes.push(Attribute::EnclosingMethod {
                name_index: self.pool.utf8("EnclosingMethod")?,
                class_index: self.pool.class(&enclosing.owner)?,
                method_index,
            });
        }
        self.common_attributes(
            &mut attributes,
            class.access,
            class.signature.as_deref(),
            &class.visible_annotations,
            &class.invisible_annotations,
        )?;
        if !class.permitted_subclasses.is_empty() {
            let class_indexes = class
                .permitted_subclasses
                .iter()
                .map(|subclass| self.pool.class(subclass))
                .collect::<Result<Vec<_>>>()?;
            attributes.push(Attribute::PermittedSubclasses {
                name_index: self.pool.utf8("PermittedSubclasses")?,
                class_indexes,
            });
        }
        Ok(attributes)
    }

    fn field(&mut self, field: &FieldNode) -> Result<Field> {
        let name_index = self.pool.utf8(&field.name)?;
        let descriptor_index = self.pool.utf8(&field.descriptor)?;

        let mut attributes = Vec::new();
        if let Some(value) = &field.value {
            let constant_value_index = match value {
                ConstantValue::Int(v) => self.pool.integer(*v)?,
                ConstantValue::Long(v) => self.pool.long(*v)?,
                ConstantValue::Float(v) => self.pool.float(*v)?,
                ConstantValue::Double(v) => self.pool.double(*v)?,
                ConstantValue::String(v) => self.pool.string(v)?,
            };
            attributes.push(Attribute::ConstantValue {
                name_index: self.pool.utf8("ConstantValue")?,
                constant_value_index,
            });
        }
        self.common_attributes(
            &mut attributes,
            field.access,
            field.signature.as_deref(),
            &field.visible_annotations,
            &field.invisible_annotations,
        )?;

        Ok(Field {
            access_flags: FieldAccessFlags::from_bits_retain(access_bits(field.access)),
            name_index,
            descriptor_index,
            field_type: FieldType::parse(&field.descriptor)?,
            attributes,
        })
    }

    fn method(&mut self, method: &MethodNode) -> Result<Method> {
        let name_index = self.pool.utf8(&method.name)?;
        let descriptor_index = self.pool.utf8(&method.descriptor)?;

        let mut attributes = Vec::new();
        if let Some(code) = &method.code {
            attributes.push(self.code(code)?);
        }
        if !method.exceptions.is_empty() {
            let exception_indexes = method
                .exceptions
                .iter()
                .map(|exception| self.pool.class(exception))
                .collect::<Result<Vec<_>>>()?;
            attributes.push(Attribute::Exceptions {
                name_index: self.pool.utf8("Exceptions")?,
                exception_indexes,
            });
        }
        self.common_attributes(
            &mut attributes,
            method.access,
            method.signature.as_deref(),
            &method.visible_annotations,
            &method.invisible_annotations,
        )?;
        if !method.parameters.is_empty() {
            let mut parameters = Vec::with_capacity(method.parameters.len());
            for parameter in &method.parameters {
                let name = (!parameter.name.is_empty()).then_some(parameter.name.as_str());
                parameters.push(MethodParameter {
                    name_index: self.optional_utf8(name)?,
                    access_flags: MethodAccessFlags::from_bits_retain(access_bits(parameter.access)),
                });
            }
            attributes.push(Attribute::MethodParameters {
                name_index: self.pool.utf8("MethodParameters")?,
                parameters,
            });
        }
        if let Some(default) = &method.annotation_default {
            attributes.push(Attribute::AnnotationDefault {
                name_index: self.pool.utf8("AnnotationDefault")?,
                element: self.element_value(default)?,
            });
        }
        if let Some(parameter_annotations) =
            self.parameter_annotations(&method.visible_parameter_annotations)?
        {
            attributes.push(Attribute::RuntimeVisibleParameterAnnotations {
                name_index: self.pool.utf8("RuntimeVisibleParameterAnnotations")?,
                parameter_annotations,
            });
        }
        if let Some(parameter_annotations) =
            self.parameter_annotations(&method.invisible_parameter_annotations)?
        {
            attributes.push(Attribute::RuntimeInvisibleParameterAnnotations {
                name_index: self.pool.utf8("RuntimeInvisibleParameterAnnotations")?,
                parameter_annotations,
            });
        }

        Ok(Method {
            access_flags: MethodAccessFlags::from_bits_retain(access_bits(method.access)),
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn code(&mut self, code: &Code) -> Result<Attribute> {
        let instructions = code
            .instructions
            .iter()
            .map(|insn| self.instruction(insn))
            .collect::<Result<Vec<_>>>()?;
        let code_length = code_length(&instructions)?;

        let mut attributes = Vec::new();
        if !code.local_variables.is_empty() {
            let mut variables = Vec::with_capacity(code.local_variables.len());
            for local in &code.local_variables {
                variables.push(LocalVariableTable {
                    start_pc: 0,
                    length: code_length,
                    name_index: self.pool.utf8(&local.name)?,
                    descriptor_index: self.pool.utf8(&local.descriptor)?,
                    index: local.index,
                });
            }
            attributes.push(Attribute::LocalVariableTable {
                name_index: self.pool.utf8("LocalVariableTable")?,
                variables,
            });
        }
        let mut variable_types = Vec::new();
        for local in &code.local_variables {
            if let Some(signature) = &local.signature {
                variable_types.push(LocalVariableTypeTable {
                    start_pc: 0,
                    length: code_length,
                    name_index: self.pool.utf8(&local.name)?,
                    signature_index: self.pool.utf8(signature)?,
                    index: local.index,
                });
            }
        }
        if !variable_types.is_empty() {
            attributes.push(Attribute::LocalVariableTypeTable {
                name_index: self.pool.utf8("LocalVariableTypeTable")?,
                variable_types,
            });
        }

        Ok(Attribute::Code {
            name_index: self.pool.utf8("Code")?,
            max_stack: code.max_stack,
            max_locals: code.max_locals,
            code: instructions,
            exception_table: Vec::new(),
            attributes,
        })
    }

    fn instruction(&mut self, insn: &Insn) -> Result<Instruction> {
        Ok(match insn {
            Insn::Simple(instruction) => instruction.clone(),
            Insn::New(class) => Instruction::New(self.pool.class(class)?),
            Insn::LdcString(value) => {
                let index = self.pool.string(value)?;
                match u8::try_from(index) {
                    Ok(narrow) => Instruction::Ldc(narrow),
                    Err(_) => Instruction::Ldc_w(index),
                }
            }
            Insn::InvokeSpecial {
                owner,
                name,
                descriptor,
            } => Instruction::Invokespecial(self.pool.method_ref(owner, name, descriptor)?),
        })
    }

    /// Signature, Deprecated and the two annotation attributes shared by
    /// classes, fields and methods.
    fn common_attributes(
        &mut self,
        attributes: &mut Vec<Attribute>,
        access: u32,
        signature: Option<&str>,
        visible: &[AnnotationNode],
        invisible: &[AnnotationNode],
    ) -> Result<()> {
        if let Some(signature) = signature {
            attributes.push(Attribute::Signature {
                name_index: self.pool.utf8("Signature")?,
                signature_index: self.pool.utf8(signature)?,
            });
        }
        if access & ACC_DEPRECATED != 0 {
            attributes.push(Attribute::Deprecated {
                name_index: self.pool.utf8("Deprecated")?,
            });
        }
        if !visible.is_empty() {
            attributes.push(Attribute::RuntimeVisibleAnnotations {
                name_index: self.pool.utf8("RuntimeVisibleAnnotations")?,
                annotations: self.annotations(visible)?,
            });
        }
        if !invisible.is_empty() {
            attributes.push(Attribute::RuntimeInvisibleAnnotations {
                name_index: self.pool.utf8("RuntimeInvisibleAnnotations")?,
                annotations: self.annotations(invisible)?,
            });
        }
        Ok(())
    }

    fn parameter_annotations(
        &mut self,
        table: &[Vec<AnnotationNode>],
    ) -> Result<Option<Vec<ParameterAnnotation>>> {
        if table.iter().all(Vec::is_empty) {
            return Ok(None);
        }
        if table.len() > usize::from(u8::MAX) {
            return Err(ClassFileError::TooLarge {
                what: "annotated parameters",
                size: table.len(),
            });
        }
        table
            .iter()
            .map(|annotations| {
                Ok(ParameterAnnotation {
                    annotations: self.annotations(annotations)?,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn annotations(&mut self, annotations: &[AnnotationNode]) -> Result<Vec<Annotation>> {
        annotations
            .iter()
            .map(|annotation| self.annotation(annotation))
            .collect()
    }

    fn annotation(&mut self, annotation: &AnnotationNode) -> Result<Annotation> {
        let type_index = self.pool.utf8(&annotation.descriptor)?;
        let mut elements = Vec::with_capacity(annotation.values.len());
        for (name, value) in &annotation.values {
            elements.push(AnnotationValuePair {
                name_index: self.pool.utf8(name)?,
                value: self.element_value(value)?,
            });
        }
        Ok(Annotation {
            type_index,
            elements,
        })
    }

    fn element_value(&mut self, value: &ElementValue) -> Result<AnnotationElement> {
        Ok(match value {
            ElementValue::Boolean(v) => AnnotationElement::Boolean {
                const_value_index: self.pool.integer(i32::from(*v))?,
            },
            ElementValue::Byte(v) => AnnotationElement::Byte {
                const_value_index: self.pool.integer(i32::from(*v))?,
            },
            ElementValue::Short(v) => AnnotationElement::Short {
                const_value_index: self.pool.integer(i32::from(*v))?,
            },
            ElementValue::Char(v) => AnnotationElement::Char {
                const_value_index: self.pool.integer(i32::from(*v))?,
            },
            ElementValue::Int(v) => AnnotationElement::Int {
                const_value_index: self.pool.integer(*v)?,
            },
            ElementValue::Long(v) => AnnotationElement::Long {
                const_value_index: self.pool.long(*v)?,
            },
            ElementValue::Float(v) => AnnotationElement::Float {
                const_value_index: self.pool.float(*v)?,
            },
            ElementValue::Double(v) => AnnotationElement::Double {
                const_value_index: self.pool.double(*v)?,
            },
            ElementValue::String(v) => AnnotationElement::String {
                const_value_index: self.pool.utf8(v)?,
            },
            // class_info_index holds the descriptor's Utf8, not a Class entry
            ElementValue::Class(descriptor) => AnnotationElement::Class {
                class_info_index: self.pool.utf8(descriptor)?,
            },
            ElementValue::Enum { descriptor, name } => AnnotationElement::Enum {
                type_name_index: self.pool.utf8(descriptor)?,
                const_name_index: self.pool.utf8(name)?,
            },
            ElementValue::Annotation(annotation) => AnnotationElement::Annotation {
                annotation: self.annotation(annotation)?,
            },
            ElementValue::Array(values) => AnnotationElement::Array {
                values: values
                    .iter()
                    .map(|value| self.element_value(value))
                    .collect::<Result<Vec<_>>>()?,
            },
        })
    }

    fn optional_class(&mut self, name: Option<&str>) -> Result<u16> {
        name.map_or(Ok(0), |name| self.pool.class(name))
    }

    fn optional_utf8(&mut self, value: Option<&str>) -> Result<u16> {
        value.map_or(Ok(0), |value| self.pool.utf8(value))
    }
}

fn access_bits(access: u32) -> u16 {
    (access & !PSEUDO_FLAGS & 0xffff) as u16
}

/// Encoded size of `instructions`, for local variables live over the whole
/// body.
fn code_length(instructions: &[Instruction]) -> Result<u16> {
    let mut cursor = Cursor::new(Vec::new());
    for instruction in instructions {
        instruction.to_bytes(&mut cursor)?;
    }
    let size = cursor.get_ref().len();
    u16::try_from(size).map_err(|_| ClassFileError::TooLarge { what: "code", size })
}
