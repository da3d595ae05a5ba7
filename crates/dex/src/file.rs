//! Header and index tables of a single dex image.

use apistub_model::{FieldRef, MethodRef};

use crate::error::{DexError, Result};
use crate::reader::Reader;

pub const HEADER_SIZE: usize = 0x70;
pub const DEX_MAGIC: &[u8; 4] = b"dex\n";
pub const NO_INDEX: u32 = 0xffff_ffff;

const MIN_VERSION: u32 = 35;
const MAX_VERSION: u32 = 41;
const ENDIAN_CONSTANT: u32 = 0x1234_5678;

const TYPE_HIDDENAPI_CLASS_DATA: u16 = 0xf000;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Table {
    pub size: u32,
    pub offset: u32,
}

impl Table {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            size: reader.u32()?,
            offset: reader.u32()?,
        })
    }

    /// Offset of entry `index` of `entry_size` bytes.
    fn entry(&self, kind: &'static str, index: u32, entry_size: usize) -> Result<usize> {
        if index >= self.size {
            return Err(DexError::IndexOutOfRange { kind, index });
        }
        Ok(self.offset as usize + index as usize * entry_size)
    }
}

/// A parsed dex image. Owns the bytes; tables are decoded lazily.
pub struct DexFile {
    data: Vec<u8>,
    version: u32,
    string_ids: Table,
    type_ids: Table,
    proto_ids: Table,
    field_ids: Table,
    method_ids: Table,
    pub(crate) class_defs: Table,
    pub(crate) hiddenapi_offset: Option<u32>,
}

impl DexFile {
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(DexError::Truncated {
                offset: 0,
                len: HEADER_SIZE,
            });
        }
        if &data[0..4] != DEX_MAGIC || data[7] != 0 {
            return Err(DexError::BadMagic);
        }
        let version_text = String::from_utf8_lossy(&data[4..7]).into_owned();
        let version = version_text
            .parse::<u32>()
            .ok()
            .filter(|version| (MIN_VERSION..=MAX_VERSION).contains(version))
            .ok_or_else(|| DexError::UnsupportedVersion(version_text.clone()))?;

        let mut reader = Reader::at(&data, 40)?;
        if reader.u32()? != ENDIAN_CONSTANT {
            return Err(DexError::UnsupportedVersion(format!(
                "{version_text} (byte-swapped)"
            )));
        }
        // link_size, link_off
        reader.u32()?;
        reader.u32()?;
        let map_offset = reader.u32()?;
        let string_ids = Table::read(&mut reader)?;
        let type_ids = Table::read(&mut reader)?;
        let proto_ids = Table::read(&mut reader)?;
        let field_ids = Table::read(&mut reader)?;
        let method_ids = Table::read(&mut reader)?;
        let class_defs = Table::read(&mut reader)?;

        let hiddenapi_offset = find_map_item(&data, map_offset, TYPE_HIDDENAPI_CLASS_DATA)?;

        Ok(Self {
            data,
            version,
            string_ids,
            type_ids,
            proto_ids,
            field_ids,
            method_ids,
            class_defs,
            hiddenapi_offset,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn class_count(&self) -> u32 {
        self.class_defs.size
    }

    pub(crate) fn reader(&self, offset: usize) -> Result<Reader<'_>> {
        Reader::at(&self.data, offset)
    }

    pub fn string(&self, index: u32) -> Result<String> {
        let entry = self.string_ids.entry("string", index, 4)?;
        let data_offset = self.reader(entry)?.u32()?;
        let mut reader = self.reader(data_offset as usize)?;
        // utf16_size, unused
        reader.uleb128()?;
        reader.mutf8()
    }

    pub fn optional_string(&self, index: Option<u32>) -> Result<Option<String>> {
        index.map(|index| self.string(index)).transpose()
    }

    pub fn type_name(&self, index: u32) -> Result<String> {
        let entry = self.type_ids.entry("type", index, 4)?;
        let descriptor = self.reader(entry)?.u32()?;
        self.string(descriptor)
    }

    pub fn optional_type_name(&self, index: Option<u32>) -> Result<Option<String>> {
        index.map(|index| self.type_name(index)).transpose()
    }

    /// Type descriptors of a `type_list`; offset zero is the empty list.
    pub fn type_list(&self, offset: u32) -> Result<Vec<String>> {
        if offset == 0 {
            return Ok(Vec::new());
        }
        let mut reader = self.reader(offset as usize)?;
        let size = reader.u32()?;
        (0..size)
            .map(|_| self.type_name(u32::from(reader.u16()?)))
            .collect()
    }

    /// Parameter types and return type of a prototype.
    pub fn proto(&self, index: u32) -> Result<(Vec<String>, String)> {
        let entry = self.proto_ids.entry("proto", index, 12)?;
        let mut reader = self.reader(entry)?;
        // shorty
        reader.u32()?;
        let return_type = self.type_name(reader.u32()?)?;
        let parameters = self.type_list(reader.u32()?)?;
        Ok((parameters, return_type))
    }

    pub fn field_ref(&self, index: u32) -> Result<FieldRef> {
        let entry = self.field_ids.entry("field", index, 8)?;
        let mut reader = self.reader(entry)?;
        let defining_class = self.type_name(u32::from(reader.u16()?))?;
        let field_type = self.type_name(u32::from(reader.u16()?))?;
        let name = self.string(reader.u32()?)?;
        Ok(FieldRef {
            defining_class,
            name,
            field_type,
        })
    }

    pub fn method_ref(&self, index: u32) -> Result<MethodRef> {
        let entry = self.method_ids.entry("method", index, 8)?;
        let mut reader = self.reader(entry)?;
        let defining_class = self.type_name(u32::from(reader.u16()?))?;
        let (parameter_types, return_type) = self.proto(u32::from(reader.u16()?))?;
        let name = self.string(reader.u32()?)?;
        Ok(MethodRef {
            defining_class,
            name,
            parameter_types,
            return_type,
        })
    }

    pub(crate) fn class_def_offset(&self, index: u32) -> Result<usize> {
        self.class_defs.entry("class_def", index, 32)
    }
}

fn find_map_item(data: &[u8], map_offset: u32, item_type: u16) -> Result<Option<u32>> {
    if map_offset == 0 {
        return Ok(None);
    }
    let mut reader = Reader::at(data, map_offset as usize)?;
    let size = reader.u32()?;
    for _ in 0..size {
        let kind = reader.u16()?;
        // unused, size
        reader.u16()?;
        reader.u32()?;
        let offset = reader.u32()?;
        if kind == item_type {
            return Ok(Some(offset));
        }
    }
    Ok(None)
}

/// Maps the `NO_INDEX` sentinel to `None`.
pub(crate) fn optional_index(index: u32) -> Option<u32> {
    (index != NO_INDEX).then_some(index)
}
