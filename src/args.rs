use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use vip8_core::{EngineConfig, TimerMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimerArg {
    /// 60 Hz, independent of instruction speed
    Realtime,
    /// one tick per instruction, like the original interpreter
    PerCycle,
}

/// Runs a CHIP-8 program in the terminal.
///
/// Keys 1234/qwer/asdf/zxcv map onto the hex keypad; Esc quits.
#[derive(Debug, Parser)]
#[command(name = "vip8", version)]
pub struct Args {
    /// Program image, loaded at 0x200
    pub rom: Option<PathBuf>,

    /// Instructions per second (0 runs unthrottled)
    #[arg(long, default_value_t = 700)]
    pub ips: u32,

    /// How the delay and sound timers are clocked
    #[arg(long, value_enum, default_value_t = TimerArg::Realtime)]
    pub timer_mode: TimerArg,

    /// Leave VF untouched when `add i, vx` overflows
    #[arg(long)]
    pub no_index_overflow_flag: bool,

    /// Seed for the random number opcode
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log every executed instruction to stderr (redirect it: `2> trace.log`)
    #[arg(long)]
    pub trace: bool,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cycle_rate: Some(self.ips).filter(|&ips| ips > 0),
            timer_mode: match self.timer_mode {
                TimerArg::Realtime => TimerMode::RealTime,
                TimerArg::PerCycle => TimerMode::PerCycle,
            },
            index_overflow_flag: !self.no_index_overflow_flag,
            seed: self.seed,
        }
    }
}
