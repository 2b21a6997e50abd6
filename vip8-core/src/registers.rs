use std::fmt;

use crate::memory::PROGRAM_START;

/// VF, overloaded as carry/borrow/collision flag.
pub const FLAG_REGISTER: u8 = 0xF;

pub const USER_FLAG_COUNT: usize = 8;

/// CPU-visible registers. The stack pointer lives with the stack itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub data_registers: [u8; 16],
    pub index_register: u16,
    pub user_flags: [u8; USER_FLAG_COUNT],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub program_counter: u16,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            data_registers: [0; 16],
            index_register: 0,
            user_flags: [0; USER_FLAG_COUNT],
            delay_timer: 0,
            sound_timer: 0,
            program_counter: PROGRAM_START,
        }
    }
}

impl Registers {
    pub fn register(&self, register_index: u8) -> u8 {
        self.data_registers[register_index as usize]
    }

    pub fn register_mut(&mut self, register_index: u8) -> &mut u8 {
        &mut self.data_registers[register_index as usize]
    }

    pub fn set_flag(&mut self, flag: bool) {
        *self.register_mut(FLAG_REGISTER) = flag as u8;
    }

    pub fn flag(&self) -> u8 {
        self.register(FLAG_REGISTER)
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "pc=0x{:04x} i=0x{:04x} dt={} st={}",
            self.program_counter, self.index_register, self.delay_timer, self.sound_timer
        )?;
        for (row, chunk) in self.data_registers.chunks(8).enumerate() {
            for (col, value) in chunk.iter().enumerate() {
                if col > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "v{:x}={:02x}", row * 8 + col, value)?;
            }
            writeln!(f)?;
        }
        write!(f, "r0-r7={:02x?}", self.user_flags)
    }
}
