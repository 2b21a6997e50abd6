use log::debug;

use crate::error::{LoadError, MemoryError};

/// Addressable bytes, 0x000..=0xFFE.
pub const MEMORY_SIZE: usize = 0xFFF;

pub const PROGRAM_START: u16 = 0x200;

pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Where the hex-digit glyphs live. `FX29` computes addresses from it.
pub const FONT_OFFSET: u16 = 0x50;

pub const GLYPH_LEN: u16 = 5;

const FONT: [u8; 16 * GLYPH_LEN as usize] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Linear byte store. Every access is bounds-checked; nothing wraps.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            bytes: Box::new([0; MEMORY_SIZE]),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory").field("size", &MEMORY_SIZE).finish()
    }
}

impl Memory {
    /// Zeroed memory with the font table already resident.
    pub fn new() -> Self {
        let mut memory = Self::default();
        memory.init_fonts();
        memory
    }

    pub fn init_fonts(&mut self) {
        let start = FONT_OFFSET as usize;
        self.bytes[start..start + FONT.len()].copy_from_slice(&FONT);
    }

    /// Copies `rom` to `PROGRAM_START`. The rest of memory is left alone.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        if rom.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::ProgramTooLarge {
                size: rom.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.bytes[start..start + rom.len()].copy_from_slice(rom);
        debug!("loaded {} byte program at 0x{:03x}", rom.len(), start);
        Ok(())
    }

    pub fn read(&self, address: usize) -> Result<u8, MemoryError> {
        self.bytes
            .get(address)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange { address })
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), MemoryError> {
        let byte = self
            .bytes
            .get_mut(address)
            .ok_or(MemoryError::AddressOutOfRange { address })?;
        *byte = value;
        Ok(())
    }

    pub fn write_slice(&mut self, address: usize, data: &[u8]) -> Result<(), MemoryError> {
        if data.is_empty() {
            return Ok(());
        }
        self.slice(address, data.len())?;
        self.bytes[address..address + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn read_word(&self, address: usize) -> Result<u16, MemoryError> {
        let high = self.read(address)?;
        let low = self.read(address + 1)?;
        Ok(u16::from_be_bytes([high, low]))
    }

    /// `len` bytes starting at `address`. Fails on the first byte past the end.
    pub fn slice(&self, address: usize, len: usize) -> Result<&[u8], MemoryError> {
        if len == 0 {
            return Ok(&[]);
        }
        let last = address + len - 1;
        if last >= MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange {
                address: address.max(MEMORY_SIZE),
            });
        }
        Ok(&self.bytes[address..=last])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed_from_program_start() {
        let m = Memory::new();
        assert!(m.bytes[PROGRAM_START as usize..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fonts_resident_at_offset() -> Result<(), MemoryError> {
        let m = Memory::new();
        // glyph for 0 starts the table, glyph for F ends it
        assert_eq!(m.slice(0x50, 5)?, &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(m.slice(0x50 + 0xF * 5, 5)?, &[0xF0, 0x80, 0xF0, 0x80, 0x80]);
        assert_eq!(m.read(0x4F)?, 0);
        assert_eq!(m.read(0xA0)?, 0);
        Ok(())
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Box<dyn std::error::Error>> {
        let mut m = Memory::new();
        m.load(&[0x00, 0xe0])?;
        assert_eq!(m.slice(0x200, 2)?, &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_largest_program_fits() -> Result<(), LoadError> {
        let mut m = Memory::new();
        m.load(&[0xAA; MAX_PROGRAM_SIZE])?;
        assert_eq!(m.read(0xFFE), Ok(0xAA));
        Ok(())
    }

    #[test]
    fn test_program_too_large() {
        let mut m = Memory::new();
        assert_eq!(
            m.load(&[0; MAX_PROGRAM_SIZE + 1]),
            Err(LoadError::ProgramTooLarge {
                size: 0xE00,
                max: 0xDFF
            })
        );
    }

    #[test]
    fn test_read_write_bounds() {
        let mut m = Memory::new();
        assert_eq!(m.write(0xFFE, 7), Ok(()));
        assert_eq!(m.read(0xFFE), Ok(7));
        assert_eq!(
            m.read(0xFFF),
            Err(MemoryError::AddressOutOfRange { address: 0xFFF })
        );
        assert_eq!(
            m.write(0x1000, 1),
            Err(MemoryError::AddressOutOfRange { address: 0x1000 })
        );
    }

    #[test]
    fn test_read_word() -> Result<(), Box<dyn std::error::Error>> {
        let mut m = Memory::new();
        m.load(&[0, 1, 2, 3, 4, 5, 6, 7])?;
        assert_eq!(m.read_word(0x204)?, 0x0405);
        assert_eq!(
            m.read_word(0xFFE),
            Err(MemoryError::AddressOutOfRange { address: 0xFFF })
        );
        Ok(())
    }

    #[test]
    fn test_write_slice_is_all_or_nothing() {
        let mut m = Memory::new();
        assert_eq!(m.write_slice(0x300, &[1, 2, 3]), Ok(()));
        assert_eq!(m.slice(0x300, 3), Ok(&[1, 2, 3][..]));
        assert!(m.write_slice(0xFFD, &[9, 9, 9]).is_err());
        assert_eq!(m.read(0xFFD), Ok(0));
        assert_eq!(m.read(0xFFE), Ok(0));
    }

    #[test]
    fn test_slice_past_end() {
        let m = Memory::new();
        assert!(m.slice(0xFFA, 5).is_ok());
        assert_eq!(
            m.slice(0xFFB, 5),
            Err(MemoryError::AddressOutOfRange { address: 0xFFF })
        );
        assert_eq!(m.slice(0x2000, 0), Ok(&[][..]));
    }
}
