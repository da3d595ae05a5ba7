//! Decoding of `class_def` items into source-model classes.

use apistub_model::{
    EncodedValue, HiddenApiRestriction, HiddenApiRestrictions, MethodParameter, MethodRef,
    SourceClass, SourceField, SourceMethod,
};

use crate::annotation::AnnotationsDirectory;
use crate::error::Result;
use crate::file::{DexFile, optional_index};
use crate::reader::Reader;

/// Cursor over the hidden-API flags of one class. Classes without an entry
/// yield empty category sets.
#[derive(Default)]
struct HiddenApiFlags<'a> {
    reader: Option<Reader<'a>>,
}

impl HiddenApiFlags<'_> {
    fn next(&mut self) -> Result<HiddenApiRestrictions> {
        match &mut self.reader {
            Some(reader) => Ok(HiddenApiRestriction::from_flags(reader.uleb128()?)),
            None => Ok(HiddenApiRestrictions::new()),
        }
    }
}

impl DexFile {
    /// Decodes every class definition, in table order.
    pub fn classes(&self) -> Result<Vec<SourceClass>> {
        (0..self.class_count()).map(|index| self.class(index)).collect()
    }

    pub fn for_each_class(&self, visit: &mut dyn FnMut(SourceClass)) -> Result<()> {
        for index in 0..self.class_count() {
            visit(self.class(index)?);
        }
        Ok(())
    }

    pub fn class(&self, index: u32) -> Result<SourceClass> {
        let mut reader = self.reader(self.class_def_offset(index)?)?;
        let type_name = self.type_name(reader.u32()?)?;
        let access_flags = reader.u32()?;
        let superclass = self.optional_type_name(optional_index(reader.u32()?))?;
        let interfaces = self.type_list(reader.u32()?)?;
        let source_file = self.optional_string(optional_index(reader.u32()?))?;
        let annotations_offset = reader.u32()?;
        let class_data_offset = reader.u32()?;
        let static_values_offset = reader.u32()?;

        let mut directory = self.annotations_directory(annotations_offset)?;
        let mut class = SourceClass {
            type_name,
            access_flags,
            superclass,
            interfaces,
            source_file,
            annotations: std::mem::take(&mut directory.class),
            ..Default::default()
        };
        if class_data_offset == 0 {
            return Ok(class);
        }

        let static_values = if static_values_offset == 0 {
            Vec::new()
        } else {
            self.encoded_array(&mut self.reader(static_values_offset as usize)?)?
        };
        let mut hidden_api = self.hidden_api_flags(index)?;

        let mut data = self.reader(class_data_offset as usize)?;
        let static_fields = data.uleb128()?;
        let instance_fields = data.uleb128()?;
        let direct_methods = data.uleb128()?;
        let virtual_methods = data.uleb128()?;

        let mut field_index = 0;
        for position in 0..static_fields as usize {
            field_index += data.uleb128()?;
            let access_flags = data.uleb128()?;
            let initial_value = static_values.get(position).cloned();
            let restrictions = hidden_api.next()?;
            class.fields.push(self.field(
                field_index,
                access_flags,
                initial_value,
                restrictions,
                &mut directory,
            )?);
        }
        field_index = 0;
        for _ in 0..instance_fields {
            field_index += data.uleb128()?;
            let access_flags = data.uleb128()?;
            let restrictions = hidden_api.next()?;
            class.fields.push(self.field(
                field_index,
                access_flags,
                None,
                restrictions,
                &mut directory,
            )?);
        }

        for count in [direct_methods, virtual_methods] {
            let mut method_index = 0;
            for _ in 0..count {
                method_index += data.uleb128()?;
                let access_flags = data.uleb128()?;
                let code_offset = data.uleb128()?;
                let restrictions = hidden_api.next()?;
                class.methods.push(self.method(
                    method_index,
                    access_flags,
                    code_offset,
                    restrictions,
                    &mut directory,
                )?);
            }
        }
        Ok(class)
    }

    fn field(
        &self,
        index: u32,
        access_flags: u32,
        initial_value: Option<EncodedValue>,
        hidden_api: HiddenApiRestrictions,
        directory: &mut AnnotationsDirectory,
    ) -> Result<SourceField> {
        let field = self.field_ref(index)?;
        Ok(SourceField {
            defining_class: field.defining_class,
            name: field.name,
            field_type: field.field_type,
            access_flags,
            initial_value,
            annotations: directory.fields.remove(&index).unwrap_or_default(),
            hidden_api,
        })
    }

    fn method(
        &self,
        index: u32,
        access_flags: u32,
        code_offset: u32,
        hidden_api: HiddenApiRestrictions,
        directory: &mut AnnotationsDirectory,
    ) -> Result<SourceMethod> {
        let MethodRef {
            defining_class,
            name,
            parameter_types,
            return_type,
        } = self.method_ref(index)?;
        let (implementation, parameter_names) = if code_offset == 0 {
            (None, Vec::new())
        } else {
            let (implementation, names) = self.code_item(code_offset)?;
            (Some(implementation), names)
        };

        let mut parameter_annotations = directory.parameters.remove(&index).unwrap_or_default();
        let parameters = parameter_types
            .into_iter()
            .enumerate()
            .map(|(position, parameter_type)| {
                let name = parameter_names.get(position).cloned().flatten();
                let annotations = parameter_annotations
                    .get_mut(position)
                    .map(std::mem::take)
                    .unwrap_or_default();
                Ok(MethodParameter::with_annotations(
                    parameter_type,
                    name,
                    annotations,
                )?)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SourceMethod {
            defining_class,
            name,
            access_flags,
            parameters,
            return_type,
            annotations: directory.methods.remove(&index).unwrap_or_default(),
            hidden_api,
            implementation,
        })
    }

    fn hidden_api_flags(&self, class_index: u32) -> Result<HiddenApiFlags<'_>> {
        let Some(section) = self.hiddenapi_offset else {
            return Ok(HiddenApiFlags::default());
        };
        // section size, then one offset per class def relative to the section
        let entry = section as usize + 4 + class_index as usize * 4;
        let offset = self.reader(entry)?.u32()?;
        if offset == 0 {
            return Ok(HiddenApiFlags::default());
        }
        Ok(HiddenApiFlags {
            reader: Some(self.reader(section as usize + offset as usize)?),
        })
    }
}
