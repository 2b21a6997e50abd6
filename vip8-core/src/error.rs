use std::io;

use thiserror::Error;

/// Raised while placing a program image into memory.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    #[error("program is {size} bytes but only {max} bytes fit above 0x200")]
    ProgramTooLarge { size: usize, max: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("address 0x{address:04x} is outside of memory")]
    AddressOutOfRange { address: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    #[error("call stack overflow (depth {depth})")]
    Overflow { depth: usize },
    #[error("return with an empty call stack")]
    Underflow,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("illegal opcode 0x{opcode:04x} at 0x{address:04x}")]
    IllegalOpcode { address: u16, opcode: u16 },
}

/// Everything that stops a running program for good.
///
/// `pc` is always the address of the instruction that was executing.
#[derive(Debug, Error)]
pub enum Fault {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("memory fault at 0x{pc:04x}: {source}")]
    Memory {
        pc: u16,
        #[source]
        source: MemoryError,
    },
    #[error("stack fault at 0x{pc:04x}: {source}")]
    Stack {
        pc: u16,
        #[source]
        source: StackError,
    },
    #[error("display or input backend failed: {0}")]
    Io(#[from] io::Error),
}
