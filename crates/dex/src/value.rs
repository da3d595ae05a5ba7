use apistub_model::{AnnotationElement, EncodedAnnotation, EncodedValue};

use crate::error::{DexError, Result};
use crate::file::DexFile;
use crate::reader::Reader;

const VALUE_BYTE: u8 = 0x00;
const VALUE_SHORT: u8 = 0x02;
const VALUE_CHAR: u8 = 0x03;
const VALUE_INT: u8 = 0x04;
const VALUE_LONG: u8 = 0x06;
const VALUE_FLOAT: u8 = 0x10;
const VALUE_DOUBLE: u8 = 0x11;
const VALUE_METHOD_TYPE: u8 = 0x15;
const VALUE_METHOD_HANDLE: u8 = 0x16;
const VALUE_STRING: u8 = 0x17;
const VALUE_TYPE: u8 = 0x18;
const VALUE_FIELD: u8 = 0x19;
const VALUE_METHOD: u8 = 0x1a;
const VALUE_ENUM: u8 = 0x1b;
const VALUE_ARRAY: u8 = 0x1c;
const VALUE_ANNOTATION: u8 = 0x1d;
const VALUE_NULL: u8 = 0x1e;
const VALUE_BOOLEAN: u8 = 0x1f;

impl DexFile {
    pub(crate) fn encoded_value(&self, reader: &mut Reader<'_>) -> Result<EncodedValue> {
        let offset = reader.position();
        let header = reader.u8()?;
        let value_type = header & 0x1f;
        let arg = header >> 5;
        let size = usize::from(arg) + 1;

        let value = match value_type {
            VALUE_BYTE => EncodedValue::Byte(signed(reader, size, 1, offset)? as i8),
            VALUE_SHORT => EncodedValue::Short(signed(reader, size, 2, offset)? as i16),
            VALUE_CHAR => EncodedValue::Char(unsigned(reader, size, 2, offset)? as u16),
            VALUE_INT => EncodedValue::Int(signed(reader, size, 4, offset)? as i32),
            VALUE_LONG => EncodedValue::Long(signed(reader, size, 8, offset)?),
            VALUE_FLOAT => {
                let bits = right_extended(reader, size, 4, offset)?;
                EncodedValue::Float(f32::from_bits(bits as u32))
            }
            VALUE_DOUBLE => {
                let bits = right_extended(reader, size, 8, offset)?;
                EncodedValue::Double(f64::from_bits(bits))
            }
            VALUE_METHOD_TYPE => return Err(DexError::UnsupportedValueType("method type")),
            VALUE_METHOD_HANDLE => return Err(DexError::UnsupportedValueType("method handle")),
            VALUE_STRING => EncodedValue::String(self.string(index(reader, size, offset)?)?),
            VALUE_TYPE => EncodedValue::Type(self.type_name(index(reader, size, offset)?)?),
            VALUE_FIELD => EncodedValue::Field(self.field_ref(index(reader, size, offset)?)?),
            VALUE_METHOD => EncodedValue::Method(self.method_ref(index(reader, size, offset)?)?),
            VALUE_ENUM => EncodedValue::Enum(self.field_ref(index(reader, size, offset)?)?),
            VALUE_ARRAY => EncodedValue::Array(self.encoded_array(reader)?),
            VALUE_ANNOTATION => EncodedValue::Annotation(self.encoded_annotation(reader)?),
            VALUE_NULL => EncodedValue::Null,
            VALUE_BOOLEAN => EncodedValue::Boolean(arg != 0),
            value_type => return Err(DexError::InvalidValueType { value_type, offset }),
        };
        Ok(value)
    }

    pub(crate) fn encoded_array(&self, reader: &mut Reader<'_>) -> Result<Vec<EncodedValue>> {
        let size = reader.uleb128()?;
        (0..size).map(|_| self.encoded_value(reader)).collect()
    }

    pub(crate) fn encoded_annotation(&self, reader: &mut Reader<'_>) -> Result<EncodedAnnotation> {
        let annotation_type = self.type_name(reader.uleb128()?)?;
        let size = reader.uleb128()?;
        let elements = (0..size)
            .map(|_| {
                let name = self.string(reader.uleb128()?)?;
                let value = self.encoded_value(reader)?;
                Ok(AnnotationElement::new(name, value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EncodedAnnotation {
            annotation_type,
            elements,
        })
    }
}

fn check_size(size: usize, width: usize, offset: usize) -> Result<()> {
    if size > width {
        return Err(DexError::InvalidValueSize { size, offset });
    }
    Ok(())
}

/// Sign-extends a `size`-byte value.
fn signed(reader: &mut Reader<'_>, size: usize, width: usize, offset: usize) -> Result<i64> {
    check_size(size, width, offset)?;
    let shift = 64 - 8 * size as u32;
    Ok(((reader.sized(size)? << shift) as i64) >> shift)
}

fn unsigned(reader: &mut Reader<'_>, size: usize, width: usize, offset: usize) -> Result<u64> {
    check_size(size, width, offset)?;
    reader.sized(size)
}

/// Float and double payloads drop trailing zero bytes, so the stored bytes
/// are the high-order ones.
fn right_extended(reader: &mut Reader<'_>, size: usize, width: usize, offset: usize) -> Result<u64> {
    check_size(size, width, offset)?;
    Ok(reader.sized(size)? << (8 * (width - size)))
}

fn index(reader: &mut Reader<'_>, size: usize, offset: usize) -> Result<u32> {
    Ok(unsigned(reader, size, 4, offset)? as u32)
}
