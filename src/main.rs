//! Simulated processor command-line runner.
//!
//! Loads a program file, then runs it or prints its decoded listing.
//!
//! # Usage
//! ```text
//! vmsim [program] [OPTIONS]
//! ```
//!
//! # Arguments
//! - `program`: Program source file (defaults to `data/input.txt`)
//!
//! # Options
//! - `-c, --check`: Parse only and print the decoded listing
//! - `-t, --trace`: Log every executed instruction
//! - `-d, --dump`: Print final registers, memory and stack to stderr
//! - `-q, --quiet`: Only log errors
//! - `--no-timestamp`: Omit timestamps from log lines
//!
//! # Exit codes
//! - `0`: normal halt, or successful check
//! - `1`: usage or load error
//! - `2`: the program halted on an error

use std::env;
use std::io::{self, Write};
use std::process;
use vmsim::config::{Command, Config, ConfigError, LOG_ENV, Mode};
use vmsim::virtual_machine::assembler::assemble_file;
use vmsim::virtual_machine::errors::{Halt, VMError};
use vmsim::virtual_machine::output::StdoutSink;
use vmsim::virtual_machine::vm::VM;
use vmsim::{error, info, warn};
use vmsim_derive::Error;

/// Top-level failure of one invocation.
#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("failed to load program: {0}")]
    Load(#[from] VMError),
    #[error("{0}")]
    Halted(#[from] Halt),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Load(_) => 1,
            CliError::Halted(_) => 2,
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map(String::as_str).unwrap_or("vmsim");
    let env_level = env::var(LOG_ENV).ok();

    let config = match Config::parse(args.iter().skip(1), env_level.as_deref()) {
        Ok(Command::Help) => {
            print_usage(program_name);
            process::exit(0);
        }
        Ok(Command::Execute(config)) => config,
        Err(e) => {
            let e = CliError::from(e);
            error!("{e}\n");
            print_usage(program_name);
            process::exit(e.exit_code());
        }
    };
    config.apply_logging();

    if let Err(e) = run(&config, &mut io::stderr()) {
        match &e {
            // The loader already logged a diagnostic with the offending line.
            CliError::Load(VMError::AssemblyError { .. }) => {}
            _ => error!("{e}"),
        }
        process::exit(e.exit_code());
    }
}

fn run(config: &Config, report: &mut impl Write) -> Result<(), CliError> {
    let program = assemble_file(&config.program)?;
    info!(
        "Loaded {} ({} instructions)",
        config.program.display(),
        program.len()
    );
    if program.is_empty() {
        warn!("{} contains no instructions", config.program.display());
    }

    if config.mode == Mode::Check {
        print!("{}", program.listing());
        return Ok(());
    }

    let mut vm = VM::new(program);
    let outcome = vm.run(&mut StdoutSink);
    if config.dump {
        // Written directly so that `--quiet` does not swallow an explicit request.
        let _ = write!(report, "{}", vm.dump());
    }
    outcome.into_result()?;

    info!("Halted normally after {} instructions", vm.ip());
    Ok(())
}

const USAGE: &str = "\
Simulated Processor

USAGE:
    {program} [program] [OPTIONS]

ARGS:
    [program]    Program source file (defaults to data/input.txt)

OPTIONS:
    -c, --check         Parse only and print the decoded listing
    -t, --trace         Log every executed instruction
    -d, --dump          Print final registers, memory and stack to stderr
    -q, --quiet         Only log errors
        --no-timestamp  Omit timestamps from log lines
    -h, --help          Print this help message

ENVIRONMENT:
    VMSIM_LOG    Default log level: debug, info, warn or error (flags win)

EXAMPLES:
    # Run the default program
    {program}

    # Check a program without running it
    {program} prog.txt --check

    # Trace execution and show the final state
    {program} prog.txt -t -d
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
