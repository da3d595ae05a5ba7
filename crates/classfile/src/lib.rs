//! In-memory JVM class tree and its lowering onto `ristretto_classfile`.
//!
//! Callers populate a [`ClassNode`] and hand it to [`ClassWriter::write`],
//! which interns every name into a shared constant pool, builds the
//! ristretto attributes and serializes the result. Only the attribute set
//! needed for API stubs is modelled.

pub mod constant_pool;
pub mod error;
pub mod insn;
pub mod tree;
pub mod writer;

pub use constant_pool::ConstantPoolBuilder;
pub use error::{ClassFileError, Result};
pub use insn::{Insn, Instruction};
pub use tree::{
    AnnotationNode, ClassNode, Code, ConstantValue, ElementValue, EnclosingMethod, FieldNode,
    InnerClassNode, LocalVariableNode, MethodNode, ParameterNode,
};
pub use writer::ClassWriter;

pub const V1_8: u16 = 52;
pub const V17: u16 = 61;
