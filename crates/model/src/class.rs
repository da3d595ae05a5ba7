use crate::access::{ACC_ABSTRACT, ACC_ANNOTATION, ACC_INTERFACE, ACC_STATIC};
use crate::annotation::{self, Annotation, InnerClassRecord};
use crate::descriptor;
use crate::error::Result;
use crate::hidden_api::HiddenApiRestrictions;
use crate::value::EncodedValue;

/// Dex opcode of `monitor-enter`.
pub const MONITOR_ENTER: u8 = 0x1d;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceClass {
    /// Type descriptor, e.g. `Landroid/app/Activity;`. Unique per merged map.
    pub type_name: String,
    pub access_flags: u32,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<SourceField>,
    pub methods: Vec<SourceMethod>,
}

impl SourceClass {
    pub fn new(type_name: impl Into<String>, access_flags: u32) -> Self {
        Self {
            type_name: type_name.into(),
            access_flags,
            ..Default::default()
        }
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn is_annotation_type(&self) -> bool {
        self.access_flags & ACC_ANNOTATION != 0
    }

    pub fn internal_name(&self) -> &str {
        descriptor::internal_name(&self.type_name)
    }

    pub fn inner_class_record(&self) -> Result<Option<InnerClassRecord>> {
        InnerClassRecord::find_in(&self.annotations)
    }

    /// Type names this class directly extends or implements.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceField {
    pub defining_class: String,
    pub name: String,
    pub field_type: String,
    pub access_flags: u32,
    pub initial_value: Option<EncodedValue>,
    pub annotations: Vec<Annotation>,
    pub hidden_api: HiddenApiRestrictions,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceMethod {
    pub defining_class: String,
    pub name: String,
    pub access_flags: u32,
    pub parameters: Vec<MethodParameter>,
    pub return_type: String,
    pub annotations: Vec<Annotation>,
    pub hidden_api: HiddenApiRestrictions,
    pub implementation: Option<MethodImplementation>,
}

impl SourceMethod {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    pub fn parameter_types(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.parameter_type.as_str())
    }

    pub fn descriptor(&self) -> String {
        let types: Vec<&str> = self.parameter_types().collect();
        descriptor::method_descriptor(&types, &self.return_type)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodParameter {
    pub parameter_type: String,
    /// Declared name from debug info, if the image kept it.
    pub name: Option<String>,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl MethodParameter {
    pub fn new(parameter_type: impl Into<String>) -> Self {
        Self {
            parameter_type: parameter_type.into(),
            ..Default::default()
        }
    }

    /// Builds a parameter, deriving its generic signature from its reserved
    /// signature annotation.
    pub fn with_annotations(
        parameter_type: impl Into<String>,
        name: Option<String>,
        annotations: Vec<Annotation>,
    ) -> Result<Self> {
        let signature = annotation::generic_signature(&annotations)?;
        Ok(Self {
            parameter_type: parameter_type.into(),
            name,
            signature,
            annotations,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodImplementation {
    pub register_count: u16,
    /// Opcode of every instruction in order; payload pseudo-instructions are
    /// not included.
    pub opcodes: Vec<u8>,
    /// Local-variable start entries from the debug info, in stream order.
    pub locals: Vec<LocalStart>,
}

impl MethodImplementation {
    pub fn has_monitor_enter(&self) -> bool {
        self.opcodes.contains(&MONITOR_ENTER)
    }
}

/// A debug entry introducing a named local in a register.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalStart {
    /// Code address (in 16-bit units) where the local becomes live.
    pub address: u32,
    pub register: u16,
    pub name: Option<String>,
    pub local_type: Option<String>,
    pub signature: Option<String>,
}
