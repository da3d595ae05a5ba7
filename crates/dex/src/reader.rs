use crate::error::{DexError, Result};

/// Little-endian cursor over a dex image.
#[derive(Clone)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        if offset > data.len() {
            return Err(DexError::Truncated { offset, len: 0 });
        }
        Ok(Self { data, pos: offset })
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(DexError::Truncated {
                offset: self.pos,
                len,
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        let bytes = self.bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let bytes = self.bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Little-endian unsigned value of `size` bytes, as used by encoded values.
    pub fn sized(&mut self, size: usize) -> Result<u64> {
        let bytes = self.bytes(size)?;
        Ok(bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte)))
    }

    pub fn uleb128(&mut self) -> Result<u32> {
        let start = self.pos;
        let mut result = 0u32;
        for i in 0..5 {
            let byte = self.u8()?;
            result |= u32::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DexError::InvalidLeb128(start))
    }

    pub fn sleb128(&mut self) -> Result<i32> {
        let start = self.pos;
        let mut result = 0i32;
        let mut shift = 0;
        for _ in 0..5 {
            let byte = self.u8()?;
            result |= i32::from(byte & 0x7f) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                if shift < 32 && byte & 0x40 != 0 {
                    result |= -1i32 << shift;
                }
                return Ok(result);
            }
        }
        Err(DexError::InvalidLeb128(start))
    }

    /// `uleb128p1`: the value plus one, so that zero encodes "no index".
    pub fn uleb128p1(&mut self) -> Result<Option<u32>> {
        Ok(self.uleb128()?.checked_sub(1))
    }

    /// A NUL-terminated MUTF-8 string.
    pub fn mutf8(&mut self) -> Result<String> {
        let start = self.pos;
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&byte| byte == 0)
            .ok_or(DexError::InvalidString(start))?;
        let string = decode_mutf8(&rest[..len]).ok_or(DexError::InvalidString(start))?;
        self.pos += len + 1;
        Ok(string)
    }
}

/// Decodes modified UTF-8: surrogate pairs arrive as two three-byte
/// sequences and NUL as `C0 80`.
fn decode_mutf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let a = u16::from(bytes[i]);
        if a & 0x80 == 0 {
            units.push(a);
            i += 1;
        } else if a & 0xe0 == 0xc0 {
            let b = u16::from(*bytes.get(i + 1)?);
            units.push(((a & 0x1f) << 6) | (b & 0x3f));
            i += 2;
        } else if a & 0xf0 == 0xe0 {
            let b = u16::from(*bytes.get(i + 1)?);
            let c = u16::from(*bytes.get(i + 2)?);
            units.push(((a & 0x0f) << 12) | ((b & 0x3f) << 6) | (c & 0x3f));
            i += 3;
        } else {
            return None;
        }
    }
    Some(String::from_utf16_lossy(&units))
}
