//! Access flag bits shared by the dex and class-file formats.
//!
//! The low 16 bits have the same meaning in both formats. Bits above that are
//! format specific: dex uses them for constructor and declared-synchronized
//! markers, the class-file tree uses them as pseudo flags that select
//! attributes instead of being written into `access_flags`.

pub const ACC_PUBLIC: u32 = 0x0001;
pub const ACC_PRIVATE: u32 = 0x0002;
pub const ACC_PROTECTED: u32 = 0x0004;
pub const ACC_STATIC: u32 = 0x0008;
pub const ACC_FINAL: u32 = 0x0010;
pub const ACC_SUPER: u32 = 0x0020;
pub const ACC_SYNCHRONIZED: u32 = 0x0020;
pub const ACC_VOLATILE: u32 = 0x0040;
pub const ACC_BRIDGE: u32 = 0x0040;
pub const ACC_TRANSIENT: u32 = 0x0080;
pub const ACC_VARARGS: u32 = 0x0080;
pub const ACC_NATIVE: u32 = 0x0100;
pub const ACC_INTERFACE: u32 = 0x0200;
pub const ACC_ABSTRACT: u32 = 0x0400;
pub const ACC_STRICT: u32 = 0x0800;
pub const ACC_SYNTHETIC: u32 = 0x1000;
pub const ACC_ANNOTATION: u32 = 0x2000;
pub const ACC_ENUM: u32 = 0x4000;

/// Dex only: method is a constructor or class initializer.
pub const ACC_CONSTRUCTOR: u32 = 0x1_0000;
/// Dex only: method was declared `synchronized` in source.
pub const ACC_DECLARED_SYNCHRONIZED: u32 = 0x2_0000;

/// Class-file tree only: class is a record.
pub const ACC_RECORD: u32 = 0x1_0000;
/// Class-file tree only: element carries a `Deprecated` attribute.
pub const ACC_DEPRECATED: u32 = 0x2_0000;

/// An element is inaccessible when it is synthetic or neither public nor
/// protected.
pub fn is_inaccessible(access_flags: u32) -> bool {
    if access_flags & ACC_SYNTHETIC != 0 {
        return true;
    }
    access_flags & (ACC_PUBLIC | ACC_PROTECTED) == 0
}

pub fn is_accessible(access_flags: u32) -> bool {
    !is_inaccessible(access_flags)
}

pub fn is_synthetic(access_flags: u32) -> bool {
    access_flags & ACC_SYNTHETIC != 0
}
