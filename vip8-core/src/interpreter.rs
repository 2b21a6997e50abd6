use std::{
    io, thread,
    time::{Duration, Instant},
};

use log::{debug, error, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;

use crate::{
    config::{EngineConfig, TimerMode},
    display::Chip8Display,
    error::{DecodeError, Fault, LoadError, MemoryError, StackError},
    instruction::Instruction,
    keyboard::Chip8Keyboard,
    memory::{Memory, FONT_OFFSET, GLYPH_LEN},
    registers::{Registers, USER_FLAG_COUNT},
    stack::Stack,
};

/// Delay and sound timers count down at this rate in real-time mode.
pub const TIMER_HZ: u32 = 60;

/// Once pacing falls this many cycles behind it stops trying to catch up.
const MAX_LAG_CYCLES: u32 = 100;

struct Timer {
    interval: Duration,
    last_tick: Instant,
}

impl Timer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: Instant::now(),
        }
    }

    /// Number of whole intervals since the last call. The remainder carries over.
    fn ticks(&mut self) -> u32 {
        let due = self.last_tick.elapsed().as_nanos() / self.interval.as_nanos().max(1);
        let due = u32::try_from(due).unwrap_or(u32::MAX);
        self.last_tick += self.interval * due;
        due
    }
}

/// Sleeps until the next cycle deadline on the monotonic clock.
struct Pacer {
    period: Duration,
    next_cycle: Instant,
}

impl Pacer {
    fn new(cycle_rate: u32) -> Self {
        let period = Duration::from_secs(1) / cycle_rate.max(1);
        Self {
            period,
            next_cycle: Instant::now() + period,
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        if self.next_cycle > now {
            thread::sleep(self.next_cycle - now);
        } else if now - self.next_cycle > self.period * MAX_LAG_CYCLES {
            self.next_cycle = now;
        }
        self.next_cycle += self.period;
    }
}

/// Why the interpreter stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    UserQuit,
    Exited,
    IllegalOpcode { address: u16, opcode: u16 },
    AddressOutOfRange { pc: u16, address: usize },
    StackOverflow { pc: u16 },
    StackUnderflow { pc: u16 },
    BackendFailure,
}

impl HaltReason {
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::UserQuit | Self::Exited)
    }
}

impl From<&Fault> for HaltReason {
    fn from(fault: &Fault) -> Self {
        match *fault {
            Fault::Decode(DecodeError::IllegalOpcode { address, opcode }) => {
                Self::IllegalOpcode { address, opcode }
            }
            Fault::Memory {
                pc,
                source: MemoryError::AddressOutOfRange { address },
            } => Self::AddressOutOfRange { pc, address },
            Fault::Stack {
                pc,
                source: StackError::Overflow { .. },
            } => Self::StackOverflow { pc },
            Fault::Stack {
                pc,
                source: StackError::Underflow,
            } => Self::StackUnderflow { pc },
            Fault::Io(_) => Self::BackendFailure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Halted(HaltReason),
}

#[derive(Debug, Error)]
enum Trap {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Trap {
    fn at(self, pc: u16) -> Fault {
        match self {
            Self::Memory(source) => Fault::Memory { pc, source },
            Self::Stack(source) => Fault::Stack { pc, source },
            Self::Io(err) => Fault::Io(err),
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Fetch-decode-execute engine. Owns all machine state; the display and
/// keyboard are the only way out.
pub struct Chip8Interpreter<D: Chip8Display, K: Chip8Keyboard> {
    pub display: D,
    pub keyboard: K,
    registers: Registers,
    memory: Memory,
    stack: Stack,
    power_on_memory: Memory,
    config: EngineConfig,
    rng: StdRng,
    timer: Timer,
    pacer: Option<Pacer>,
    state: EngineState,
    cycles: u64,
}

impl<D: Chip8Display, K: Chip8Keyboard> Chip8Interpreter<D, K> {
    pub fn new(config: EngineConfig, display: D, keyboard: K) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let memory = Memory::new();
        Self {
            display,
            keyboard,
            registers: Registers::default(),
            power_on_memory: memory.clone(),
            memory,
            stack: Stack::default(),
            rng,
            timer: Timer::new(Duration::from_secs(1) / TIMER_HZ),
            pacer: config.cycle_rate.filter(|&rate| rate > 0).map(Pacer::new),
            config,
            state: EngineState::Running,
            cycles: 0,
        }
    }

    /// Installs `program` at 0x200 and puts the CPU in its power-on state.
    /// The image is kept for later resets.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        let mut memory = Memory::new();
        memory.load(program)?;
        self.power_on_memory = memory;
        self.reset_machine();
        Ok(())
    }

    /// Back to the state right after `load_program`, with a blank display.
    pub fn reset(&mut self) -> io::Result<()> {
        self.reset_machine();
        self.display.clear()
    }

    fn reset_machine(&mut self) {
        self.memory = self.power_on_memory.clone();
        self.registers = Registers::default();
        self.stack.clear();
        self.state = EngineState::Running;
        self.cycles = 0;
        self.timer = Timer::new(self.timer.interval);
        if let Some(rate) = self.config.cycle_rate.filter(|&rate| rate > 0) {
            self.pacer = Some(Pacer::new(rate));
        }
        debug!("machine reset");
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Register dump with the stack depth, as printed on a fault.
    pub fn dump(&self) -> String {
        format!("sp={} {}", self.stack.depth(), self.registers)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn sound_active(&self) -> bool {
        self.registers.sound_timer > 0
    }

    pub fn run(&mut self) -> Result<HaltReason, Fault> {
        loop {
            if let EngineState::Halted(reason) = self.step()? {
                return Ok(reason);
            }
        }
    }

    /// One full cycle: poll, execute one instruction, tick timers, pace.
    /// Does nothing once halted.
    pub fn step(&mut self) -> Result<EngineState, Fault> {
        if self.state != EngineState::Running {
            return Ok(self.state);
        }

        match self.cycle() {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => {
                self.halt(HaltReason::UserQuit);
                return Ok(self.state);
            }
            Err(fault) => {
                self.halt(HaltReason::from(&fault));
                error!("{fault}\n{}", self.dump());
                return Err(fault);
            }
        }
        self.cycles += 1;
        self.tick_timers();

        if self.registers.program_counter == 0 {
            self.halt(HaltReason::Exited);
            return Ok(self.state);
        }

        if let Some(pacer) = &mut self.pacer {
            pacer.wait();
        }
        Ok(self.state)
    }

    fn halt(&mut self, reason: HaltReason) {
        debug!("halted after {} cycles: {:?}", self.cycles, reason);
        self.state = EngineState::Halted(reason);
    }

    fn tick_timers(&mut self) {
        // real time keeps running through key waits and stalls
        let ticks = match self.config.timer_mode {
            TimerMode::PerCycle => 1,
            TimerMode::RealTime => u8::try_from(self.timer.ticks()).unwrap_or(u8::MAX),
        };
        self.registers.delay_timer = self.registers.delay_timer.saturating_sub(ticks);
        self.registers.sound_timer = self.registers.sound_timer.saturating_sub(ticks);
    }

    fn cycle(&mut self) -> Result<Flow, Fault> {
        if self.display.present_and_poll()?.is_some() {
            return Ok(Flow::Quit);
        }
        self.keyboard.update_keystates(Duration::ZERO)?;

        //fetch
        let address = self.registers.program_counter;
        let opcode = self
            .memory
            .read_word(address as usize)
            .map_err(|source| Fault::Memory {
                pc: address,
                source,
            })?;
        self.registers.program_counter = address.wrapping_add(2);

        //decode
        let instruction =
            Instruction::decode(opcode).ok_or(DecodeError::IllegalOpcode { address, opcode })?;
        trace!("0x{address:04x}: {instruction}");

        //execute
        self.execute(instruction).map_err(|trap| trap.at(address))
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.registers.program_counter = self.registers.program_counter.wrapping_add(2);
        }
    }

    fn execute(&mut self, instruction: Instruction) -> Result<Flow, Trap> {
        let state = &mut self.registers;
        match instruction {
            Instruction::ClearScreen => self.display.clear()?,
            Instruction::Return => state.program_counter = self.stack.pop()?,
            Instruction::Jump(address) => state.program_counter = address,
            Instruction::Call(address) => {
                self.stack.push(state.program_counter)?;
                state.program_counter = address;
            }
            Instruction::SkipEqImmediate { x, kk } => {
                let condition = state.register(x) == kk;
                self.skip_if(condition);
            }
            Instruction::SkipNeImmediate { x, kk } => {
                let condition = state.register(x) != kk;
                self.skip_if(condition);
            }
            Instruction::SkipEqRegister { x, y } => {
                let condition = state.register(x) == state.register(y);
                self.skip_if(condition);
            }
            Instruction::SkipNeRegister { x, y } => {
                let condition = state.register(x) != state.register(y);
                self.skip_if(condition);
            }
            Instruction::LoadImmediate { x, kk } => *state.register_mut(x) = kk,
            Instruction::AddImmediate { x, kk } => {
                *state.register_mut(x) = state.register(x).wrapping_add(kk)
            }
            Instruction::Move { x, y } => *state.register_mut(x) = state.register(y),
            Instruction::Or { x, y } => *state.register_mut(x) |= state.register(y),
            Instruction::And { x, y } => *state.register_mut(x) &= state.register(y),
            Instruction::Xor { x, y } => *state.register_mut(x) ^= state.register(y),
            // flag writes come last so VF holds the flag even when x is F
            Instruction::Add { x, y } => {
                let (result, overflow) = state.register(x).overflowing_add(state.register(y));
                *state.register_mut(x) = result;
                state.set_flag(overflow);
            }
            Instruction::Sub { x, y } => {
                let (vx, vy) = (state.register(x), state.register(y));
                *state.register_mut(x) = vx.wrapping_sub(vy);
                state.set_flag(vx >= vy);
            }
            Instruction::ShiftRight { x } => {
                let vx = state.register(x);
                *state.register_mut(x) = vx >> 1;
                state.set_flag(vx & 0x01 != 0);
            }
            Instruction::SubN { x, y } => {
                let (vx, vy) = (state.register(x), state.register(y));
                *state.register_mut(x) = vy.wrapping_sub(vx);
                state.set_flag(vy >= vx);
            }
            Instruction::ShiftLeft { x } => {
                let vx = state.register(x);
                *state.register_mut(x) = vx << 1;
                state.set_flag(vx & 0x80 != 0);
            }
            Instruction::LoadIndex(address) => state.index_register = address,
            Instruction::JumpOffset(address) => {
                state.program_counter = state.register(0x0) as u16 + address
            }
            Instruction::Random { x, kk } => *state.register_mut(x) = kk & self.rng.gen::<u8>(),
            Instruction::Draw { x, y, n } => {
                let (vx, vy) = (state.register(x), state.register(y));
                let sprite = self
                    .memory
                    .slice(state.index_register as usize, n as usize)?;
                let collision = self.display.draw(vx, vy, sprite)?;
                state.set_flag(collision);
            }
            Instruction::SkipKeyDown { x } => {
                let condition = self.keyboard.is_key_down(state.register(x));
                self.skip_if(condition);
            }
            Instruction::SkipKeyUp { x } => {
                let condition = !self.keyboard.is_key_down(state.register(x));
                self.skip_if(condition);
            }
            Instruction::LoadDelay { x } => *state.register_mut(x) = state.delay_timer,
            Instruction::WaitKey { x } => {
                let prior = self.keyboard.snapshot();
                match self.keyboard.wait_for_change(&prior, &mut self.display)? {
                    Some(key) => *state.register_mut(x) = key,
                    None => return Ok(Flow::Quit),
                }
            }
            Instruction::SetDelay { x } => state.delay_timer = state.register(x),
            Instruction::SetSound { x } => state.sound_timer = state.register(x),
            Instruction::AddIndex { x } => {
                let sum = state.index_register as u32 + state.register(x) as u32;
                state.index_register = sum as u16;
                if self.config.index_overflow_flag {
                    state.set_flag(sum > 0x0FFF);
                }
            }
            Instruction::LoadGlyph { x } => {
                state.index_register = FONT_OFFSET + state.register(x) as u16 * GLYPH_LEN;
            }
            Instruction::StoreBcd { x } => {
                let value = state.register(x);
                self.memory.write_slice(
                    state.index_register as usize,
                    &[value / 100, value / 10 % 10, value % 10],
                )?;
            }
            Instruction::StoreRegisters { x } => {
                self.memory.write_slice(
                    state.index_register as usize,
                    &state.data_registers[..=x as usize],
                )?;
            }
            Instruction::LoadRegisters { x } => {
                let values = self
                    .memory
                    .slice(state.index_register as usize, x as usize + 1)?;
                state.data_registers[..=x as usize].copy_from_slice(values);
            }
            Instruction::SaveFlags { x } => {
                let last = (x as usize).min(USER_FLAG_COUNT - 1);
                state.user_flags[..=last].copy_from_slice(&state.data_registers[..=last]);
            }
            Instruction::RestoreFlags { x } => {
                let last = (x as usize).min(USER_FLAG_COUNT - 1);
                state.data_registers[..=last].copy_from_slice(&state.user_flags[..=last]);
            }
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_waits_for_interval() {
        let mut timer = Timer::new(Duration::from_secs(3600));
        assert_eq!(timer.ticks(), 0);
    }

    #[test]
    fn test_timer_pays_back_every_elapsed_interval() {
        let mut timer = Timer::new(Duration::from_millis(50));
        thread::sleep(Duration::from_millis(170));
        assert_eq!(timer.ticks(), 3);
        // the 20ms remainder is not enough for another tick
        assert_eq!(timer.ticks(), 0);
    }

    #[test]
    fn test_pacer_sleeps_until_deadline() {
        let start = Instant::now();
        let mut pacer = Pacer::new(200);
        pacer.wait();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_pacer_drops_lag() {
        let mut pacer = Pacer::new(1_000_000);
        thread::sleep(Duration::from_millis(5));
        pacer.wait();
        assert!(pacer.next_cycle > Instant::now() - Duration::from_millis(1));
    }

    #[test]
    fn test_halt_reasons_from_faults() {
        let fault = Fault::Memory {
            pc: 0x204,
            source: MemoryError::AddressOutOfRange { address: 0x1000 },
        };
        assert_eq!(
            HaltReason::from(&fault),
            HaltReason::AddressOutOfRange {
                pc: 0x204,
                address: 0x1000
            }
        );
        let fault = Fault::Io(io::Error::new(io::ErrorKind::Other, "gone"));
        assert_eq!(HaltReason::from(&fault), HaltReason::BackendFailure);
        assert!(HaltReason::BackendFailure.is_fault());
        assert!(!HaltReason::UserQuit.is_fault());
    }

    #[test]
    fn test_trap_carries_faulting_address() {
        let fault = Trap::from(StackError::Underflow).at(0x2AE);
        assert!(matches!(
            fault,
            Fault::Stack {
                pc: 0x2AE,
                source: StackError::Underflow
            }
        ));
        assert_eq!(fault.to_string(), "stack fault at 0x02ae: return with an empty call stack");
    }
}
