use std::collections::HashMap;

use ristretto_classfile::{Constant, ConstantPool};

use crate::error::Result;

/// Identity of a pool entry. Floating-point values are keyed by their bits so
/// that `0.0`, `-0.0` and NaN payloads stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(String),
    String(String),
    NameAndType(String, String),
    MethodRef(String, String, String),
}

/// Deduplicating front over [`ConstantPool`]: every distinct constant is
/// added once and later requests return the first index.
#[derive(Debug)]
pub struct ConstantPoolBuilder {
    pool: ConstantPool,
    indexes: HashMap<Key, u16>,
}

impl Default for ConstantPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPoolBuilder {
    pub fn new() -> Self {
        Self {
            pool: ConstantPool::new(),
            indexes: HashMap::new(),
        }
    }

    fn intern(&mut self, key: Key, constant: impl FnOnce(&mut Self) -> Result<Constant>) -> Result<u16> {
        if let Some(&index) = self.indexes.get(&key) {
            return Ok(index);
        }
        let constant = constant(self)?;
        let index = self.pool.add(constant)?;
        self.indexes.insert(key, index);
        Ok(index)
    }

    pub fn utf8(&mut self, value: &str) -> Result<u16> {
        self.intern(Key::Utf8(value.to_string()), |_| Ok(Constant::Utf8(value.to_string())))
    }

    pub fn integer(&mut self, value: i32) -> Result<u16> {
        self.intern(Key::Integer(value), |_| Ok(Constant::Integer(value)))
    }

    pub fn float(&mut self, value: f32) -> Result<u16> {
        self.intern(Key::Float(value.to_bits()), |_| Ok(Constant::Float(value)))
    }

    pub fn long(&mut self, value: i64) -> Result<u16> {
        self.intern(Key::Long(value), |_| Ok(Constant::Long(value)))
    }

    pub fn double(&mut self, value: f64) -> Result<u16> {
        self.intern(Key::Double(value.to_bits()), |_| Ok(Constant::Double(value)))
    }

    pub fn class(&mut self, name: &str) -> Result<u16> {
        self.intern(Key::Class(name.to_string()), |pool| {
            Ok(Constant::Class(pool.utf8(name)?))
        })
    }

    pub fn string(&mut self, value: &str) -> Result<u16> {
        self.intern(Key::String(value.to_string()), |pool| {
            Ok(Constant::String(pool.utf8(value)?))
        })
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let key = Key::NameAndType(name.to_string(), descriptor.to_string());
        self.intern(key, |pool| {
            Ok(Constant::NameAndType {
                name_index: pool.utf8(name)?,
                descriptor_index: pool.utf8(descriptor)?,
            })
        })
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let key = Key::MethodRef(owner.to_string(), name.to_string(), descriptor.to_string());
        self.intern(key, |pool| {
            Ok(Constant::MethodRef {
                class_index: pool.class(owner)?,
                name_and_type_index: pool.name_and_type(name, descriptor)?,
            })
        })
    }

    pub fn finish(self) -> ConstantPool {
        self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_shared() {
        let mut pool = ConstantPoolBuilder::new();
        let object = pool.class("java/lang/Object").unwrap();
        assert_eq!(pool.class("java/lang/Object").unwrap(), object);
        assert_eq!(pool.utf8("java/lang/Object").unwrap(), object - 1);

        let init = pool.method_ref("java/lang/Object", "<init>", "()V").unwrap();
        assert_eq!(pool.method_ref("java/lang/Object", "<init>", "()V").unwrap(), init);

        let pool = pool.finish();
        assert_eq!(pool.try_get_class(object).unwrap(), "java/lang/Object");
        // Utf8 + Class, then Utf8 x2 + NameAndType + MethodRef
        assert_eq!(pool.len(), 6);
    }

    #[test]
    fn test_wide_constants_take_two_slots() {
        let mut pool = ConstantPoolBuilder::new();
        let long = pool.long(1 << 40).unwrap();
        let next = pool.integer(7).unwrap();
        assert_eq!(next, long + 2);
        assert_eq!(pool.long(1 << 40).unwrap(), long);
    }

    #[test]
    fn test_signed_zeroes_are_distinct() {
        let mut pool = ConstantPoolBuilder::new();
        let positive = pool.double(0.0).unwrap();
        let negative = pool.double(-0.0).unwrap();
        assert_ne!(positive, negative);
        assert_eq!(pool.float(1.5).unwrap(), pool.float(1.5).unwrap());
    }
}
