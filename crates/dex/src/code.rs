//! `code_item` decoding: instruction boundaries and the debug-info stream.

use apistub_model::{LocalStart, MethodImplementation};

use crate::error::{DexError, Result};
use crate::file::DexFile;

const PACKED_SWITCH_PAYLOAD: u16 = 0x0100;
const SPARSE_SWITCH_PAYLOAD: u16 = 0x0200;
const FILL_ARRAY_DATA_PAYLOAD: u16 = 0x0300;

const DBG_END_SEQUENCE: u8 = 0x00;
const DBG_ADVANCE_PC: u8 = 0x01;
const DBG_ADVANCE_LINE: u8 = 0x02;
const DBG_START_LOCAL: u8 = 0x03;
const DBG_START_LOCAL_EXTENDED: u8 = 0x04;
const DBG_END_LOCAL: u8 = 0x05;
const DBG_RESTART_LOCAL: u8 = 0x06;
const DBG_SET_PROLOGUE_END: u8 = 0x07;
const DBG_SET_EPILOGUE_BEGIN: u8 = 0x08;
const DBG_SET_FILE: u8 = 0x09;
const DBG_FIRST_SPECIAL: u8 = 0x0a;
const DBG_LINE_RANGE: u8 = 15;

/// Width in 16-bit code units of the instruction starting with `opcode`.
pub fn instruction_width(opcode: u8) -> usize {
    match opcode {
        0x00 | 0x01 | 0x04 | 0x07 | 0x0a..=0x12 | 0x1d | 0x1e | 0x21 | 0x27 | 0x28 => 1,
        0x3e..=0x43 | 0x73 | 0x79..=0x8f | 0xb0..=0xcf | 0xe3..=0xf9 => 1,
        0x02 | 0x05 | 0x08 | 0x13 | 0x15 | 0x16 | 0x19 | 0x1a | 0x1c | 0x1f | 0x20 => 2,
        0x22 | 0x23 | 0x29 | 0x2d..=0x3d | 0x44..=0x6d | 0x90..=0xaf | 0xd0..=0xe2 => 2,
        0xfe | 0xff => 2,
        0x03 | 0x06 | 0x09 | 0x14 | 0x17 | 0x1b | 0x24..=0x26 | 0x2a..=0x2c => 3,
        0x6e..=0x72 | 0x74..=0x78 | 0xfc | 0xfd => 3,
        0xfa | 0xfb => 4,
        0x18 => 5,
    }
}

/// Opcodes of every real instruction in `insns`. Payload pseudo-instructions
/// are stepped over using their encoded sizes.
pub(crate) fn scan_opcodes(insns: &[u16]) -> Result<Vec<u8>> {
    let mut opcodes = Vec::new();
    let mut pc = 0;
    while pc < insns.len() {
        let unit = insns[pc];
        let opcode = (unit & 0xff) as u8;
        let width = if opcode == 0x00 && unit != 0 {
            payload_width(insns, pc)?
        } else {
            opcodes.push(opcode);
            instruction_width(opcode)
        };
        pc += width;
    }
    if pc != insns.len() {
        return Err(DexError::MalformedCode(format!(
            "last instruction overruns code by {} units",
            pc - insns.len()
        )));
    }
    Ok(opcodes)
}

fn payload_width(insns: &[u16], pc: usize) -> Result<usize> {
    let unit = |offset: usize| {
        insns.get(pc + offset).copied().ok_or_else(|| {
            DexError::MalformedCode(format!("truncated payload at {pc:#x}"))
        })
    };
    let width = match insns[pc] {
        PACKED_SWITCH_PAYLOAD => 4 + usize::from(unit(1)?) * 2,
        SPARSE_SWITCH_PAYLOAD => 2 + usize::from(unit(1)?) * 4,
        FILL_ARRAY_DATA_PAYLOAD => {
            let element_width = usize::from(unit(1)?);
            let size = usize::from(unit(2)?) | (usize::from(unit(3)?) << 16);
            4 + (size * element_width).div_ceil(2)
        }
        other => {
            return Err(DexError::MalformedCode(format!(
                "unknown payload {other:#06x} at {pc:#x}"
            )));
        }
    };
    Ok(width)
}

/// Debug info relevant to parameter names.
#[derive(Debug, Default)]
struct DebugInfo {
    /// Declared names of the non-`this` parameters.
    parameter_names: Vec<Option<String>>,
    locals: Vec<LocalStart>,
}

impl DexFile {
    /// Decodes a `code_item`, returning the implementation and the declared
    /// parameter names from its debug info.
    pub(crate) fn code_item(
        &self,
        offset: u32,
    ) -> Result<(MethodImplementation, Vec<Option<String>>)> {
        let mut reader = self.reader(offset as usize)?;
        let register_count = reader.u16()?;
        // ins_size, outs_size, tries_size
        reader.u16()?;
        reader.u16()?;
        reader.u16()?;
        let debug_offset = reader.u32()?;
        let insns_size = reader.u32()?;
        let insns = (0..insns_size)
            .map(|_| reader.u16())
            .collect::<Result<Vec<_>>>()?;

        let opcodes = scan_opcodes(&insns)?;
        let DebugInfo {
            parameter_names,
            locals,
        } = if debug_offset == 0 {
            DebugInfo::default()
        } else {
            self.debug_info(debug_offset)?
        };
        let implementation = MethodImplementation {
            register_count,
            opcodes,
            locals,
        };
        Ok((implementation, parameter_names))
    }

    /// Runs the debug-info state machine, keeping only what local-variable
    /// recovery needs: the address and signature of each local start.
    fn debug_info(&self, offset: u32) -> Result<DebugInfo> {
        let mut reader = self.reader(offset as usize)?;
        // line_start
        reader.uleb128()?;
        let parameters_size = reader.uleb128()?;
        let parameter_names = (0..parameters_size)
            .map(|_| {
                let index = reader.uleb128p1()?;
                self.optional_string(index)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut locals = Vec::new();
        let mut address = 0u32;
        loop {
            let opcode = reader.u8()?;
            match opcode {
                DBG_END_SEQUENCE => break,
                DBG_ADVANCE_PC => address += reader.uleb128()?,
                DBG_ADVANCE_LINE => {
                    reader.sleb128()?;
                }
                DBG_START_LOCAL | DBG_START_LOCAL_EXTENDED => {
                    let register = reader.uleb128()?;
                    let register = u16::try_from(register).map_err(|_| {
                        DexError::MalformedCode(format!("register v{register} out of range"))
                    })?;
                    let name = self.optional_string(reader.uleb128p1()?)?;
                    let local_type = self.optional_type_name(reader.uleb128p1()?)?;
                    let signature = if opcode == DBG_START_LOCAL_EXTENDED {
                        self.optional_string(reader.uleb128p1()?)?
                    } else {
                        None
                    };
                    locals.push(LocalStart {
                        address,
                        register,
                        name,
                        local_type,
                        signature,
                    });
                }
                DBG_END_LOCAL | DBG_RESTART_LOCAL => {
                    reader.uleb128()?;
                }
                DBG_SET_PROLOGUE_END | DBG_SET_EPILOGUE_BEGIN => {}
                DBG_SET_FILE => {
                    reader.uleb128p1()?;
                }
                special => {
                    let adjusted = special - DBG_FIRST_SPECIAL;
                    address += u32::from(adjusted / DBG_LINE_RANGE);
                }
            }
        }
        Ok(DebugInfo {
            parameter_names,
            locals,
        })
    }
}
