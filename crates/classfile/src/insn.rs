pub use ristretto_classfile::attributes::Instruction;

/// The instructions stub bodies are made of. Instructions that reference the
/// constant pool are kept symbolic until the class is lowered.
#[derive(Debug, Clone, PartialEq)]
pub enum Insn {
    /// An instruction without constant-pool operands.
    Simple(Instruction),
    /// `new` of an internal class name.
    New(String),
    /// `ldc`/`ldc_w` of a string constant.
    LdcString(String),
    InvokeSpecial {
        owner: String,
        name: String,
        descriptor: String,
    },
}
