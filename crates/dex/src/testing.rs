//! Assembles small dex images for tests.
//!
//! Ids are interned as they are first mentioned and encoded values are
//! serialized immediately; offsets are only resolved by [`DexBuilder::build`].
//! The output is not canonical (string ids are unsorted, no checksum) but it
//! is laid out the way the reader expects.

use std::collections::HashMap;

use crate::file::NO_INDEX;

pub const VISIBILITY_BUILD: u8 = 0x00;
pub const VISIBILITY_RUNTIME: u8 = 0x01;
pub const VISIBILITY_SYSTEM: u8 = 0x02;

/// Values the builder can encode.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(&'a str),
    Type(&'a str),
    Enum {
        class: &'a str,
        name: &'a str,
        field_type: &'a str,
    },
    Null,
    Array(Vec<Value<'a>>),
    Annotation(&'a str, Vec<(&'a str, Value<'a>)>),
    MethodType,
}

#[derive(Debug, Clone)]
pub enum DebugEvent<'a> {
    AdvancePc(u32),
    StartLocal {
        register: u32,
        name: &'a str,
        local_type: &'a str,
    },
    StartLocalExtended {
        register: u32,
        name: &'a str,
        local_type: &'a str,
        signature: &'a str,
    },
    EndLocal(u32),
}

#[derive(Debug, Clone, Default)]
pub struct CodeSpec {
    pub registers: u16,
    pub insns: Vec<u16>,
    /// Pre-encoded debug info, see [`DexBuilder::debug_info`].
    pub debug_info: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassSpec {
    pub access_flags: u32,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
    /// Pre-encoded annotation items, see [`DexBuilder::annotation`].
    pub annotations: Vec<Vec<u8>>,
    pub static_fields: Vec<FieldSpec>,
    pub instance_fields: Vec<FieldSpec>,
    pub direct_methods: Vec<MethodSpec>,
    pub virtual_methods: Vec<MethodSpec>,
    /// Pre-encoded values, one per leading static field.
    pub static_values: Vec<Vec<u8>>,
    /// Hidden-API flags for every member in class-data order.
    pub hidden_api: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: String,
    pub access_flags: u32,
    pub annotations: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct MethodSpec {
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: String,
    pub access_flags: u32,
    pub annotations: Vec<Vec<u8>>,
    /// Annotation items per parameter position.
    pub parameter_annotations: Vec<Vec<Vec<u8>>>,
    pub code: Option<CodeSpec>,
}

impl FieldSpec {
    pub fn new(name: &str, field_type: &str, access_flags: u32) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            access_flags,
            annotations: Vec::new(),
        }
    }
}

impl MethodSpec {
    pub fn new(name: &str, parameters: &[&str], return_type: &str, access_flags: u32) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            return_type: return_type.into(),
            access_flags,
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: CodeSpec) -> Self {
        self.code = Some(code);
        self
    }
}

struct InternedClass {
    class_index: u32,
    spec: ClassSpec,
    fields: Vec<(u32, u32, Vec<Vec<u8>>)>,
    methods: Vec<InternedMethod>,
    static_field_count: usize,
    direct_method_count: usize,
}

struct InternedMethod {
    index: u32,
    access_flags: u32,
    annotations: Vec<Vec<u8>>,
    parameter_annotations: Vec<Vec<Vec<u8>>>,
    code: Option<CodeSpec>,
}

#[derive(Default)]
pub struct DexBuilder {
    strings: Vec<String>,
    string_index: HashMap<String, u32>,
    types: Vec<u32>,
    type_index: HashMap<String, u32>,
    protos: Vec<(u32, u32, Vec<u32>)>,
    proto_index: HashMap<(u32, Vec<u32>), u32>,
    fields: Vec<(u32, u32, u32)>,
    field_index: HashMap<(u32, u32, u32), u32>,
    methods: Vec<(u32, u32, u32)>,
    method_index: HashMap<(u32, u32, u32), u32>,
    classes: Vec<InternedClass>,
}

impl DexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(&mut self, value: &str) -> u32 {
        if let Some(&index) = self.string_index.get(value) {
            return index;
        }
        let index = self.strings.len() as u32;
        self.strings.push(value.to_string());
        self.string_index.insert(value.to_string(), index);
        index
    }

    pub fn type_id(&mut self, descriptor: &str) -> u32 {
        if let Some(&index) = self.type_index.get(descriptor) {
            return index;
        }
        let string = self.string(descriptor);
        let index = self.types.len() as u32;
        self.types.push(string);
        self.type_index.insert(descriptor.to_string(), index);
        index
    }

    fn proto(&mut self, parameters: &[String], return_type: &str) -> u32 {
        let return_index = self.type_id(return_type);
        let parameter_indices: Vec<u32> = parameters.iter().map(|p| self.type_id(p)).collect();
        let key = (return_index, parameter_indices.clone());
        if let Some(&index) = self.proto_index.get(&key) {
            return index;
        }
        let shorty: String = std::iter::once(return_type)
            .chain(parameters.iter().map(String::as_str))
            .map(|t| match t.as_bytes()[0] {
                b'[' => 'L',
                other => other as char,
            })
            .collect();
        let shorty = self.string(&shorty);
        let index = self.protos.len() as u32;
        self.protos.push((shorty, return_index, parameter_indices));
        self.proto_index.insert(key, index);
        index
    }

    pub fn field(&mut self, class: &str, name: &str, field_type: &str) -> u32 {
        let key = (
            self.type_id(class),
            self.type_id(field_type),
            self.string(name),
        );
        if let Some(&index) = self.field_index.get(&key) {
            return index;
        }
        let index = self.fields.len() as u32;
        self.fields.push(key);
        self.field_index.insert(key, index);
        index
    }

    pub fn method(&mut self, class: &str, name: &str, parameters: &[String], return_type: &str) -> u32 {
        let key = (
            self.type_id(class),
            self.proto(parameters, return_type),
            self.string(name),
        );
        if let Some(&index) = self.method_index.get(&key) {
            return index;
        }
        let index = self.methods.len() as u32;
        self.methods.push(key);
        self.method_index.insert(key, index);
        index
    }

    pub fn value(&mut self, value: &Value<'_>) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_value(&mut out, value);
        out
    }

    fn write_value(&mut self, out: &mut Vec<u8>, value: &Value<'_>) {
        match value {
            Value::Boolean(v) => out.push(((*v as u8) << 5) | 0x1f),
            Value::Byte(v) => out.extend_from_slice(&[0x00, *v as u8]),
            Value::Char(v) => push_sized(out, 0x03, &v.to_le_bytes()),
            Value::Int(v) => push_sized(out, 0x04, &minimal_signed(i64::from(*v), 4)),
            Value::Long(v) => push_sized(out, 0x06, &minimal_signed(*v, 8)),
            Value::Float(v) => push_sized(out, 0x10, &v.to_bits().to_le_bytes()),
            Value::Double(v) => push_sized(out, 0x11, &v.to_bits().to_le_bytes()),
            Value::String(v) => {
                let index = self.string(v);
                push_sized(out, 0x17, &index.to_le_bytes());
            }
            Value::Type(v) => {
                let index = self.type_id(v);
                push_sized(out, 0x18, &index.to_le_bytes());
            }
            Value::Enum {
                class,
                name,
                field_type,
            } => {
                let index = self.field(class, name, field_type);
                push_sized(out, 0x1b, &index.to_le_bytes());
            }
            Value::Null => out.push(0x1e),
            Value::Array(values) => {
                out.push(0x1c);
                write_uleb128(out, values.len() as u32);
                for value in values {
                    self.write_value(out, value);
                }
            }
            Value::Annotation(annotation_type, elements) => {
                out.push(0x1d);
                self.write_encoded_annotation(out, annotation_type, elements);
            }
            Value::MethodType => push_sized(out, 0x15, &[0]),
        }
    }

    fn write_encoded_annotation(
        &mut self,
        out: &mut Vec<u8>,
        annotation_type: &str,
        elements: &[(&str, Value<'_>)],
    ) {
        let type_index = self.type_id(annotation_type);
        write_uleb128(out, type_index);
        write_uleb128(out, elements.len() as u32);
        for (name, value) in elements {
            let name = self.string(name);
            write_uleb128(out, name);
            self.write_value(out, value);
        }
    }

    /// An `annotation_item`: visibility followed by the encoded annotation.
    pub fn annotation(
        &mut self,
        visibility: u8,
        annotation_type: &str,
        elements: &[(&str, Value<'_>)],
    ) -> Vec<u8> {
        let mut out = vec![visibility];
        self.write_encoded_annotation(&mut out, annotation_type, elements);
        out
    }

    pub fn debug_info(&mut self, parameter_names: &[Option<&str>], events: &[DebugEvent<'_>]) -> Vec<u8> {
        let mut out = Vec::new();
        // line_start
        write_uleb128(&mut out, 1);
        write_uleb128(&mut out, parameter_names.len() as u32);
        for name in parameter_names {
            let index = name.map(|name| self.string(name) + 1).unwrap_or(0);
            write_uleb128(&mut out, index);
        }
        for event in events {
            match event {
                DebugEvent::AdvancePc(delta) => {
                    out.push(0x01);
                    write_uleb128(&mut out, *delta);
                }
                DebugEvent::StartLocal {
                    register,
                    name,
                    local_type,
                } => {
                    out.push(0x03);
                    write_uleb128(&mut out, *register);
                    let name = self.string(name) + 1;
                    write_uleb128(&mut out, name);
                    let local_type = self.type_id(local_type) + 1;
                    write_uleb128(&mut out, local_type);
                }
                DebugEvent::StartLocalExtended {
                    register,
                    name,
                    local_type,
                    signature,
                } => {
                    out.push(0x04);
                    write_uleb128(&mut out, *register);
                    let name = self.string(name) + 1;
                    write_uleb128(&mut out, name);
                    let local_type = self.type_id(local_type) + 1;
                    write_uleb128(&mut out, local_type);
                    let signature = self.string(signature) + 1;
                    write_uleb128(&mut out, signature);
                }
                DebugEvent::EndLocal(register) => {
                    out.push(0x05);
                    write_uleb128(&mut out, *register);
                }
            }
        }
        // a special opcode advancing one line, then the end marker
        out.push(0x0a + 1);
        out.push(0x00);
        out
    }

    pub fn class(&mut self, type_name: &str, spec: ClassSpec) {
        let class_index = self.type_id(type_name);
        for parent in spec.superclass.iter().chain(&spec.interfaces) {
            self.type_id(parent);
        }
        if let Some(source_file) = &spec.source_file {
            self.string(source_file);
        }

        let mut fields = Vec::new();
        for field in spec.static_fields.iter().chain(&spec.instance_fields) {
            let index = self.field(type_name, &field.name, &field.field_type);
            fields.push((index, field.access_flags, field.annotations.clone()));
        }
        let mut methods = Vec::new();
        for method in spec.direct_methods.iter().chain(&spec.virtual_methods) {
            let index = self.method(type_name, &method.name, &method.parameters, &method.return_type);
            methods.push(InternedMethod {
                index,
                access_flags: method.access_flags,
                annotations: method.annotations.clone(),
                parameter_annotations: method.parameter_annotations.clone(),
                code: method.code.clone(),
            });
        }
        let static_field_count = spec.static_fields.len();
        let direct_method_count = spec.direct_methods.len();
        self.classes.push(InternedClass {
            class_index,
            spec,
            fields,
            methods,
            static_field_count,
            direct_method_count,
        });
    }

    pub fn build(self) -> Vec<u8> {
        let superclasses: Vec<Option<u32>> = self
            .classes
            .iter()
            .map(|class| {
                class
                    .spec
                    .superclass
                    .as_ref()
                    .map(|name| self.type_index[name])
            })
            .collect();

        let mut out = vec![0u8; 0x70];
        let string_ids_off = out.len();
        out.resize(string_ids_off + self.strings.len() * 4, 0);
        let type_ids_off = out.len();
        for &string in &self.types {
            out.extend_from_slice(&string.to_le_bytes());
        }
        let proto_ids_off = out.len();
        out.resize(proto_ids_off + self.protos.len() * 12, 0);
        let field_ids_off = out.len();
        for &(class, field_type, name) in &self.fields {
            out.extend_from_slice(&(class as u16).to_le_bytes());
            out.extend_from_slice(&(field_type as u16).to_le_bytes());
            out.extend_from_slice(&name.to_le_bytes());
        }
        let method_ids_off = out.len();
        for &(class, proto, name) in &self.methods {
            out.extend_from_slice(&(class as u16).to_le_bytes());
            out.extend_from_slice(&(proto as u16).to_le_bytes());
            out.extend_from_slice(&name.to_le_bytes());
        }
        let class_defs_off = out.len();
        out.resize(class_defs_off + self.classes.len() * 32, 0);
        let data_off = out.len();

        for (i, string) in self.strings.iter().enumerate() {
            let offset = out.len() as u32;
            put_u32_at(&mut out, string_ids_off + i * 4, offset);
            write_uleb128(&mut out, string.encode_utf16().count() as u32);
            out.extend_from_slice(string.as_bytes());
            out.push(0);
        }
        for (i, (shorty, return_type, parameters)) in self.protos.iter().enumerate() {
            let parameters_off = type_list(&mut out, parameters);
            let entry = proto_ids_off + i * 12;
            put_u32_at(&mut out, entry, *shorty);
            put_u32_at(&mut out, entry + 4, *return_type);
            put_u32_at(&mut out, entry + 8, parameters_off);
        }

        let mut hidden_api_offsets = Vec::new();
        let mut hidden_api_data = Vec::new();
        for (i, class) in self.classes.iter().enumerate() {
            let interfaces: Vec<u32> = class
                .spec
                .interfaces
                .iter()
                .map(|name| self.type_index[name])
                .collect();
            let interfaces_off = type_list(&mut out, &interfaces);
            let source_file = class
                .spec
                .source_file
                .as_ref()
                .map(|name| self.string_index[name])
                .unwrap_or(NO_INDEX);
            let annotations_off = annotations_directory(&mut out, class);
            let static_values_off = if class.spec.static_values.is_empty() {
                0
            } else {
                align(&mut out, 4);
                let offset = out.len() as u32;
                write_uleb128(&mut out, class.spec.static_values.len() as u32);
                for value in &class.spec.static_values {
                    out.extend_from_slice(value);
                }
                offset
            };
            let code_offs: Vec<u32> = class
                .methods
                .iter()
                .map(|method| match &method.code {
                    Some(code) => code_item(&mut out, code),
                    None => 0,
                })
                .collect();
            let class_data_off = class_data(&mut out, class, &code_offs);

            let entry = class_defs_off + i * 32;
            put_u32_at(&mut out, entry, class.class_index);
            put_u32_at(&mut out, entry + 4, class.spec.access_flags);
            put_u32_at(&mut out, entry + 8, superclasses[i].unwrap_or(NO_INDEX));
            put_u32_at(&mut out, entry + 12, interfaces_off);
            put_u32_at(&mut out, entry + 16, source_file);
            put_u32_at(&mut out, entry + 20, annotations_off);
            put_u32_at(&mut out, entry + 24, class_data_off);
            put_u32_at(&mut out, entry + 28, static_values_off);

            match &class.spec.hidden_api {
                Some(flags) => {
                    hidden_api_offsets.push(hidden_api_data.len() as u32);
                    for &flag in flags {
                        write_uleb128(&mut hidden_api_data, flag);
                    }
                }
                None => hidden_api_offsets.push(0),
            }
        }

        let mut map_items: Vec<(u16, u32, u32)> = vec![(0x0000, 1, 0)];
        if self.classes.iter().any(|class| class.spec.hidden_api.is_some()) {
            align(&mut out, 4);
            let section = out.len();
            let header_len = 4 + 4 * hidden_api_offsets.len() as u32;
            out.extend_from_slice(&0u32.to_le_bytes());
            for (class, offset) in self.classes.iter().zip(&hidden_api_offsets) {
                let relative = if class.spec.hidden_api.is_some() {
                    header_len + offset
                } else {
                    0
                };
                out.extend_from_slice(&relative.to_le_bytes());
            }
            out.extend_from_slice(&hidden_api_data);
            let size = (out.len() - section) as u32;
            put_u32_at(&mut out, section, size);
            map_items.push((0xf000, 1, section as u32));
        }

        align(&mut out, 4);
        let map_off = out.len() as u32;
        map_items.push((0x1000, 1, map_off));
        out.extend_from_slice(&(map_items.len() as u32).to_le_bytes());
        for (kind, size, offset) in map_items {
            out.extend_from_slice(&kind.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
        }

        let file_size = out.len() as u32;
        out[0..8].copy_from_slice(b"dex\n039\0");
        put_u32_at(&mut out, 32, file_size);
        put_u32_at(&mut out, 36, 0x70);
        put_u32_at(&mut out, 40, 0x1234_5678);
        put_u32_at(&mut out, 52, map_off);
        let tables = [
            (self.strings.len(), string_ids_off),
            (self.types.len(), type_ids_off),
            (self.protos.len(), proto_ids_off),
            (self.fields.len(), field_ids_off),
            (self.methods.len(), method_ids_off),
            (self.classes.len(), class_defs_off),
        ];
        for (i, (size, offset)) in tables.into_iter().enumerate() {
            put_u32_at(&mut out, 56 + i * 8, size as u32);
            put_u32_at(&mut out, 60 + i * 8, offset as u32);
        }
        put_u32_at(&mut out, 104, file_size - data_off as u32);
        put_u32_at(&mut out, 108, data_off as u32);
        out
    }
}

fn annotations_directory(out: &mut Vec<u8>, class: &InternedClass) -> u32 {
    let fields: Vec<_> = class
        .fields
        .iter()
        .filter(|(_, _, annotations)| !annotations.is_empty())
        .collect();
    let methods: Vec<_> = class
        .methods
        .iter()
        .filter(|method| !method.annotations.is_empty())
        .collect();
    let parameters: Vec<_> = class
        .methods
        .iter()
        .filter(|method| !method.parameter_annotations.is_empty())
        .collect();
    if class.spec.annotations.is_empty() && fields.is_empty() && methods.is_empty() && parameters.is_empty() {
        return 0;
    }

    let class_set = annotation_set(out, &class.spec.annotations);
    let field_sets: Vec<(u32, u32)> = fields
        .iter()
        .map(|(index, _, annotations)| (*index, annotation_set(out, annotations)))
        .collect();
    let method_sets: Vec<(u32, u32)> = methods
        .iter()
        .map(|method| (method.index, annotation_set(out, &method.annotations)))
        .collect();
    let parameter_lists: Vec<(u32, u32)> = parameters
        .iter()
        .map(|method| {
            let sets: Vec<u32> = method
                .parameter_annotations
                .iter()
                .map(|annotations| annotation_set(out, annotations))
                .collect();
            align(out, 4);
            let offset = out.len() as u32;
            out.extend_from_slice(&(sets.len() as u32).to_le_bytes());
            for set in sets {
                out.extend_from_slice(&set.to_le_bytes());
            }
            (method.index, offset)
        })
        .collect();

    align(out, 4);
    let offset = out.len() as u32;
    for value in [
        class_set,
        field_sets.len() as u32,
        method_sets.len() as u32,
        parameter_lists.len() as u32,
    ] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    for (index, set) in field_sets.into_iter().chain(method_sets).chain(parameter_lists) {
        out.extend_from_slice(&index.to_le_bytes());
        out.extend_from_slice(&set.to_le_bytes());
    }
    offset
}

/// Writes the items then the set; an empty set is offset zero.
fn annotation_set(out: &mut Vec<u8>, annotations: &[Vec<u8>]) -> u32 {
    if annotations.is_empty() {
        return 0;
    }
    let items: Vec<u32> = annotations
        .iter()
        .map(|item| {
            let offset = out.len() as u32;
            out.extend_from_slice(item);
            offset
        })
        .collect();
    align(out, 4);
    let offset = out.len() as u32;
    out.extend_from_slice(&(items.len() as u32).to_le_bytes());
    for item in items {
        out.extend_from_slice(&item.to_le_bytes());
    }
    offset
}

fn code_item(out: &mut Vec<u8>, code: &CodeSpec) -> u32 {
    let debug_off = match &code.debug_info {
        Some(debug) => {
            let offset = out.len() as u32;
            out.extend_from_slice(debug);
            offset
        }
        None => 0,
    };
    align(out, 4);
    let offset = out.len() as u32;
    out.extend_from_slice(&code.registers.to_le_bytes());
    // ins, outs, tries
    out.extend_from_slice(&[0; 6]);
    out.extend_from_slice(&debug_off.to_le_bytes());
    out.extend_from_slice(&(code.insns.len() as u32).to_le_bytes());
    for unit in &code.insns {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    offset
}

/// Members are written in ascending index order, which is also the order
/// hidden-API flags are read in.
fn class_data(out: &mut Vec<u8>, class: &InternedClass, code_offs: &[u32]) -> u32 {
    if class.fields.is_empty() && class.methods.is_empty() {
        return 0;
    }
    let offset = out.len() as u32;
    let mut static_fields: Vec<(u32, u32)> = class.fields[..class.static_field_count]
        .iter()
        .map(|(index, access_flags, _)| (*index, *access_flags))
        .collect();
    let mut instance_fields: Vec<(u32, u32)> = class.fields[class.static_field_count..]
        .iter()
        .map(|(index, access_flags, _)| (*index, *access_flags))
        .collect();
    let methods: Vec<(u32, u32, u32)> = class
        .methods
        .iter()
        .zip(code_offs)
        .map(|(method, code_off)| (method.index, method.access_flags, *code_off))
        .collect();
    let (direct, virtual_) = methods.split_at(class.direct_method_count);
    let mut direct = direct.to_vec();
    let mut virtual_ = virtual_.to_vec();
    static_fields.sort_unstable();
    instance_fields.sort_unstable();
    direct.sort_unstable();
    virtual_.sort_unstable();

    for size in [
        static_fields.len(),
        instance_fields.len(),
        direct.len(),
        virtual_.len(),
    ] {
        write_uleb128(out, size as u32);
    }
    for list in [static_fields, instance_fields] {
        let mut previous = 0;
        for (index, access_flags) in list {
            write_uleb128(out, index - previous);
            write_uleb128(out, access_flags);
            previous = index;
        }
    }
    for list in [direct, virtual_] {
        let mut previous = 0;
        for (index, access_flags, code_off) in list {
            write_uleb128(out, index - previous);
            write_uleb128(out, access_flags);
            write_uleb128(out, code_off);
            previous = index;
        }
    }
    offset
}

fn type_list(out: &mut Vec<u8>, types: &[u32]) -> u32 {
    if types.is_empty() {
        return 0;
    }
    align(out, 4);
    let offset = out.len() as u32;
    out.extend_from_slice(&(types.len() as u32).to_le_bytes());
    for &index in types {
        out.extend_from_slice(&(index as u16).to_le_bytes());
    }
    offset
}

fn push_sized(out: &mut Vec<u8>, value_type: u8, bytes: &[u8]) {
    out.push((((bytes.len() - 1) as u8) << 5) | value_type);
    out.extend_from_slice(bytes);
}

/// Shortest little-endian two's-complement encoding of `value`.
fn minimal_signed(value: i64, width: usize) -> Vec<u8> {
    let bytes = value.to_le_bytes();
    let mut len = width;
    while len > 1 {
        let top = bytes[len - 1];
        let next_sign = bytes[len - 2] & 0x80;
        if (top == 0x00 && next_sign == 0) || (top == 0xff && next_sign != 0) {
            len -= 1;
        } else {
            break;
        }
    }
    bytes[..len].to_vec()
}

pub fn write_uleb128(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn put_u32_at(out: &mut [u8], position: usize, value: u32) {
    out[position..position + 4].copy_from_slice(&value.to_le_bytes());
}

fn align(out: &mut Vec<u8>, alignment: usize) {
    while out.len() % alignment != 0 {
        out.push(0);
    }
}
