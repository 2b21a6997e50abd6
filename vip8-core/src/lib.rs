//! CHIP-8 virtual machine: memory, registers, call stack, decoder and the
//! fetch-decode-execute loop. Rendering and key input are supplied by the
//! host through [`Chip8Display`] and [`Chip8Keyboard`].

pub mod config;
pub mod display;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod stack;

pub use config::{EngineConfig, TimerMode};
pub use display::{Chip8Display, Framebuffer, Quit, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use error::{DecodeError, Fault, LoadError, MemoryError, StackError};
pub use instruction::Instruction;
pub use interpreter::{Chip8Interpreter, EngineState, HaltReason, TIMER_HZ};
pub use keyboard::{Chip8Keyboard, KeyState, KEY_COUNT};
pub use memory::{Memory, FONT_OFFSET, GLYPH_LEN, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START};
pub use registers::{Registers, FLAG_REGISTER, USER_FLAG_COUNT};
pub use stack::{Stack, STACK_DEPTH};
