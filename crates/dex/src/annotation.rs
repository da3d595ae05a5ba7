use std::collections::HashMap;

use apistub_model::{Annotation, Visibility};

use crate::error::{DexError, Result};
use crate::file::DexFile;

/// Decoded `annotations_directory_item`, keyed by field and method index.
#[derive(Debug, Default)]
pub(crate) struct AnnotationsDirectory {
    pub class: Vec<Annotation>,
    pub fields: HashMap<u32, Vec<Annotation>>,
    pub methods: HashMap<u32, Vec<Annotation>>,
    pub parameters: HashMap<u32, Vec<Vec<Annotation>>>,
}

impl DexFile {
    pub(crate) fn annotations_directory(&self, offset: u32) -> Result<AnnotationsDirectory> {
        let mut directory = AnnotationsDirectory::default();
        if offset == 0 {
            return Ok(directory);
        }
        let mut reader = self.reader(offset as usize)?;
        let class_offset = reader.u32()?;
        let fields_size = reader.u32()?;
        let methods_size = reader.u32()?;
        let parameters_size = reader.u32()?;

        directory.class = self.annotation_set(class_offset)?;
        for _ in 0..fields_size {
            let field_index = reader.u32()?;
            let set_offset = reader.u32()?;
            directory
                .fields
                .insert(field_index, self.annotation_set(set_offset)?);
        }
        for _ in 0..methods_size {
            let method_index = reader.u32()?;
            let set_offset = reader.u32()?;
            directory
                .methods
                .insert(method_index, self.annotation_set(set_offset)?);
        }
        for _ in 0..parameters_size {
            let method_index = reader.u32()?;
            let list_offset = reader.u32()?;
            directory
                .parameters
                .insert(method_index, self.annotation_set_ref_list(list_offset)?);
        }
        Ok(directory)
    }

    fn annotation_set(&self, offset: u32) -> Result<Vec<Annotation>> {
        if offset == 0 {
            return Ok(Vec::new());
        }
        let mut reader = self.reader(offset as usize)?;
        let size = reader.u32()?;
        (0..size)
            .map(|_| self.annotation_item(reader.u32()?))
            .collect()
    }

    /// One annotation set per parameter; a zero entry is an empty set.
    fn annotation_set_ref_list(&self, offset: u32) -> Result<Vec<Vec<Annotation>>> {
        let mut reader = self.reader(offset as usize)?;
        let size = reader.u32()?;
        (0..size)
            .map(|_| self.annotation_set(reader.u32()?))
            .collect()
    }

    fn annotation_item(&self, offset: u32) -> Result<Annotation> {
        let mut reader = self.reader(offset as usize)?;
        let raw = reader.u8()?;
        let visibility = Visibility::from_raw(raw).ok_or(DexError::InvalidVisibility {
            visibility: raw,
            offset: offset as usize,
        })?;
        let encoded = self.encoded_annotation(&mut reader)?;
        Ok(Annotation::new(
            visibility,
            encoded.annotation_type,
            encoded.elements,
        ))
    }
}
