mod args;
mod terminal;

use std::{fs, process::ExitCode};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use env_logger::Env;
use log::{info, LevelFilter};
use vip8_core::Chip8Interpreter;

use crate::args::Args;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(trace: bool) {
    // the terminal owns stdout, so nothing is logged unless asked for
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("off"));
    if trace {
        builder.filter_module("vip8_core", LevelFilter::Trace);
    }
    builder.init();
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.trace);

    let Some(path) = args.rom.as_deref() else {
        Args::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    let program =
        fs::read(path).with_context(|| format!("could not read {}", path.display()))?;

    let (display, keyboard) = terminal::open().context("could not set up the terminal")?;
    let mut interpreter = Chip8Interpreter::new(args.engine_config(), display, keyboard);
    interpreter
        .load_program(&program)
        .with_context(|| format!("could not load {}", path.display()))?;
    info!("running {} ({} bytes)", path.display(), program.len());

    let outcome = interpreter.run();
    let dump = interpreter.dump();
    // restores the terminal before anything is printed
    drop(interpreter);

    match outcome {
        Ok(reason) => {
            info!("stopped: {reason:?}");
            Ok(ExitCode::SUCCESS)
        }
        Err(fault) => {
            eprintln!("{fault}");
            eprintln!("{dump}");
            Ok(ExitCode::FAILURE)
        }
    }
}
