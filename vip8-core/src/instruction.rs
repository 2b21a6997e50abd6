use std::fmt;

/// One decoded instruction word. `x`/`y` are register indices, `kk` an
/// immediate byte, `n` a sprite height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen,
    Return,
    Jump(u16),
    Call(u16),
    SkipEqImmediate { x: u8, kk: u8 },
    SkipNeImmediate { x: u8, kk: u8 },
    SkipEqRegister { x: u8, y: u8 },
    SkipNeRegister { x: u8, y: u8 },
    LoadImmediate { x: u8, kk: u8 },
    AddImmediate { x: u8, kk: u8 },
    Move { x: u8, y: u8 },
    Or { x: u8, y: u8 },
    And { x: u8, y: u8 },
    Xor { x: u8, y: u8 },
    Add { x: u8, y: u8 },
    Sub { x: u8, y: u8 },
    ShiftRight { x: u8 },
    SubN { x: u8, y: u8 },
    ShiftLeft { x: u8 },
    LoadIndex(u16),
    JumpOffset(u16),
    Random { x: u8, kk: u8 },
    Draw { x: u8, y: u8, n: u8 },
    SkipKeyDown { x: u8 },
    SkipKeyUp { x: u8 },
    LoadDelay { x: u8 },
    WaitKey { x: u8 },
    SetDelay { x: u8 },
    SetSound { x: u8 },
    AddIndex { x: u8 },
    LoadGlyph { x: u8 },
    StoreBcd { x: u8 },
    StoreRegisters { x: u8 },
    LoadRegisters { x: u8 },
    SaveFlags { x: u8 },
    RestoreFlags { x: u8 },
}

impl Instruction {
    /// Returns `None` for words that are not part of the instruction set.
    pub fn decode(opcode: u16) -> Option<Self> {
        let nibbles = [
            (opcode >> 12) as u8 & 0xF,
            (opcode >> 8) as u8 & 0xF,
            (opcode >> 4) as u8 & 0xF,
            opcode as u8 & 0xF,
        ];
        let address = opcode & 0x0FFF;
        let kk = opcode as u8;

        let instruction = match nibbles {
            [0x0, 0x0, 0xE, 0x0] => Self::ClearScreen,
            [0x0, 0x0, 0xE, 0xE] => Self::Return,
            // machine-code calls are treated as plain jumps
            [0x0, _, _, _] | [0x1, _, _, _] => Self::Jump(address),
            [0x2, _, _, _] => Self::Call(address),
            [0x3, x, _, _] => Self::SkipEqImmediate { x, kk },
            [0x4, x, _, _] => Self::SkipNeImmediate { x, kk },
            [0x5, x, y, 0x0] => Self::SkipEqRegister { x, y },
            [0x6, x, _, _] => Self::LoadImmediate { x, kk },
            [0x7, x, _, _] => Self::AddImmediate { x, kk },
            [0x8, x, y, 0x0] => Self::Move { x, y },
            [0x8, x, y, 0x1] => Self::Or { x, y },
            [0x8, x, y, 0x2] => Self::And { x, y },
            [0x8, x, y, 0x3] => Self::Xor { x, y },
            [0x8, x, y, 0x4] => Self::Add { x, y },
            [0x8, x, y, 0x5] => Self::Sub { x, y },
            [0x8, x, _, 0x6] => Self::ShiftRight { x },
            [0x8, x, y, 0x7] => Self::SubN { x, y },
            [0x8, x, _, 0xE] => Self::ShiftLeft { x },
            [0x9, x, y, 0x0] => Self::SkipNeRegister { x, y },
            [0xA, _, _, _] => Self::LoadIndex(address),
            [0xB, _, _, _] => Self::JumpOffset(address),
            [0xC, x, _, _] => Self::Random { x, kk },
            [0xD, x, y, n] => Self::Draw { x, y, n },
            [0xE, x, 0x9, 0xE] => Self::SkipKeyDown { x },
            [0xE, x, 0xA, 0x1] => Self::SkipKeyUp { x },
            [0xF, x, 0x0, 0x7] => Self::LoadDelay { x },
            [0xF, x, 0x0, 0xA] => Self::WaitKey { x },
            [0xF, x, 0x1, 0x5] => Self::SetDelay { x },
            [0xF, x, 0x1, 0x8] => Self::SetSound { x },
            [0xF, x, 0x1, 0xE] => Self::AddIndex { x },
            [0xF, x, 0x2, 0x9] => Self::LoadGlyph { x },
            [0xF, x, 0x3, 0x3] => Self::StoreBcd { x },
            [0xF, x, 0x5, 0x5] => Self::StoreRegisters { x },
            [0xF, x, 0x6, 0x5] => Self::LoadRegisters { x },
            [0xF, x, 0x7, 0x5] => Self::SaveFlags { x },
            [0xF, x, 0x8, 0x5] => Self::RestoreFlags { x },
            _ => return None,
        };
        Some(instruction)
    }
}

/// Assembly-style mnemonic, as printed by the execution trace.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ClearScreen => write!(f, "cls"),
            Self::Return => write!(f, "ret"),
            Self::Jump(address) => write!(f, "jp 0x{address:03x}"),
            Self::Call(address) => write!(f, "call 0x{address:03x}"),
            Self::SkipEqImmediate { x, kk } => write!(f, "se v{x:x}, 0x{kk:02x}"),
            Self::SkipNeImmediate { x, kk } => write!(f, "sne v{x:x}, 0x{kk:02x}"),
            Self::SkipEqRegister { x, y } => write!(f, "se v{x:x}, v{y:x}"),
            Self::SkipNeRegister { x, y } => write!(f, "sne v{x:x}, v{y:x}"),
            Self::LoadImmediate { x, kk } => write!(f, "ld v{x:x}, 0x{kk:02x}"),
            Self::AddImmediate { x, kk } => write!(f, "add v{x:x}, 0x{kk:02x}"),
            Self::Move { x, y } => write!(f, "ld v{x:x}, v{y:x}"),
            Self::Or { x, y } => write!(f, "or v{x:x}, v{y:x}"),
            Self::And { x, y } => write!(f, "and v{x:x}, v{y:x}"),
            Self::Xor { x, y } => write!(f, "xor v{x:x}, v{y:x}"),
            Self::Add { x, y } => write!(f, "add v{x:x}, v{y:x}"),
            Self::Sub { x, y } => write!(f, "sub v{x:x}, v{y:x}"),
            Self::ShiftRight { x } => write!(f, "shr v{x:x}"),
            Self::SubN { x, y } => write!(f, "subn v{x:x}, v{y:x}"),
            Self::ShiftLeft { x } => write!(f, "shl v{x:x}"),
            Self::LoadIndex(address) => write!(f, "ld i, 0x{address:03x}"),
            Self::JumpOffset(address) => write!(f, "jp v0, 0x{address:03x}"),
            Self::Random { x, kk } => write!(f, "rnd v{x:x}, 0x{kk:02x}"),
            Self::Draw { x, y, n } => write!(f, "drw v{x:x}, v{y:x}, {n}"),
            Self::SkipKeyDown { x } => write!(f, "skp v{x:x}"),
            Self::SkipKeyUp { x } => write!(f, "sknp v{x:x}"),
            Self::LoadDelay { x } => write!(f, "ld v{x:x}, dt"),
            Self::WaitKey { x } => write!(f, "ld v{x:x}, k"),
            Self::SetDelay { x } => write!(f, "ld dt, v{x:x}"),
            Self::SetSound { x } => write!(f, "ld st, v{x:x}"),
            Self::AddIndex { x } => write!(f, "add i, v{x:x}"),
            Self::LoadGlyph { x } => write!(f, "ld f, v{x:x}"),
            Self::StoreBcd { x } => write!(f, "ld b, v{x:x}"),
            Self::StoreRegisters { x } => write!(f, "ld [i], v{x:x}"),
            Self::LoadRegisters { x } => write!(f, "ld v{x:x}, [i]"),
            Self::SaveFlags { x } => write!(f, "ld r, v{x:x}"),
            Self::RestoreFlags { x } => write!(f, "ld v{x:x}, r"),
        }
    }
}
