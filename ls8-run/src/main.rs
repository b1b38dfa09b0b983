use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ls8_core::runtime::{disasm, loader};
use ls8_core::{Machine, MachineConfig};

#[derive(Parser)]
#[command(name = "ls8")]
#[command(about = "LS8 emulator")]
struct Args {
    /// Program file, one binary byte per line
    program: PathBuf,

    /// Log a trace line before every instruction
    #[arg(short, long)]
    trace: bool,

    /// Give up after this many instructions
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Print a disassembly of the loaded program to stderr before running it
    #[arg(long)]
    disasm: bool,

    /// Print the machine state to stderr once the program stops
    #[arg(short, long)]
    dump_state: bool,
}

impl Args {
    fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            trace: self.trace,
            step_limit: self.max_steps,
        }
    }
}

fn init_logging(trace: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if trace {
        builder.filter_module("ls8_core", log::LevelFilter::Info);
    }
    builder.init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.trace);

    let image = loader::load_program(&args.program)
        .with_context(|| format!("failed to load {}", args.program.display()))?;

    let stdout = io::stdout().lock();
    let mut vm = Machine::with_config(args.machine_config(), stdout);
    vm.load(&image)
        .with_context(|| format!("failed to load {}", args.program.display()))?;

    if args.disasm {
        eprint!("{}", disasm::dump_memory(vm.memory(), 0, image.len()));
    }

    let result = vm.run();

    if args.dump_state {
        eprint!("{}", disasm::dump_state(&vm));
    }

    let mut stdout = vm.into_output();
    stdout.flush()?;

    let summary = result.context("program stopped abnormally")?;
    log::debug!("program halted after {} instructions", summary.steps);

    Ok(())
}
