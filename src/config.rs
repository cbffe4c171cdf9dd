//! Command-line and environment configuration for the `vmsim` binary.
//!
//! Arguments are parsed by hand. `VMSIM_LOG` sets the default log level and
//! any level flag given on the command line wins over it.

use crate::utils::log::{self, Level};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use vmsim_derive::Error;

/// Environment variable holding the default log level.
pub const LOG_ENV: &str = "VMSIM_LOG";

/// Program file used when none is given.
pub const DEFAULT_PROGRAM: &str = "data/input.txt";

/// Errors in command-line arguments or environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown option: {option}")]
    UnknownOption { option: String },
    #[error("unexpected argument: {arg} (program already set to {program})")]
    UnexpectedArgument { arg: String, program: String },
    #[error("invalid log level in VMSIM_LOG: '{value}' (expected debug, info, warn or error)")]
    InvalidLogLevel { value: String },
}

/// What the binary should do with a loaded program.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Execute the program.
    Run,
    /// Parse only and print the decoded listing.
    Check,
}

/// Resolved settings for one invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub program: PathBuf,
    pub mode: Mode,
    /// Log registers, memory and stack after the run.
    pub dump: bool,
    pub log_level: Level,
    pub show_timestamp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            mode: Mode::Run,
            dump: false,
            log_level: Level::Info,
            show_timestamp: true,
        }
    }
}

/// Parsed command line.
#[derive(Debug, Eq, PartialEq)]
pub enum Command {
    Help,
    Execute(Config),
}

impl Config {
    /// Parses arguments (without the binary name) and the value of
    /// [`LOG_ENV`], if set.
    pub fn parse<I>(args: I, env_level: Option<&str>) -> Result<Command, ConfigError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut config = Config::default();
        if let Some(value) = env_level.map(str::trim).filter(|v| !v.is_empty()) {
            config.log_level = value
                .parse()
                .map_err(|value| ConfigError::InvalidLogLevel { value })?;
        }

        let mut program: Option<String> = None;
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "-h" | "--help" => return Ok(Command::Help),
                "-c" | "--check" => config.mode = Mode::Check,
                "-t" | "--trace" => config.log_level = Level::Debug,
                "-q" | "--quiet" => config.log_level = Level::Error,
                "-d" | "--dump" => config.dump = true,
                "--no-timestamp" => config.show_timestamp = false,
                other if other.starts_with('-') && other.len() > 1 => {
                    return Err(ConfigError::UnknownOption {
                        option: other.to_string(),
                    });
                }
                other => {
                    if let Some(program) = &program {
                        return Err(ConfigError::UnexpectedArgument {
                            arg: other.to_string(),
                            program: program.clone(),
                        });
                    }
                    program = Some(other.to_string());
                }
            }
        }

        if let Some(program) = program {
            config.program = PathBuf::from(program);
        }
        Ok(Command::Execute(config))
    }

    /// Installs the logging settings globally.
    pub fn apply_logging(&self) {
        log::set_max_level(self.log_level);
        log::SHOW_TIMESTAMP.store(self.show_timestamp, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(args: &[&str], env_level: Option<&str>) -> Config {
        match Config::parse(args, env_level).unwrap() {
            Command::Execute(config) => config,
            Command::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn defaults() {
        let config = parse_ok(&[], None);
        assert_eq!(config, Config::default());
        assert_eq!(config.program, PathBuf::from(DEFAULT_PROGRAM));
        assert_eq!(config.log_level, Level::Info);
    }

    #[test]
    fn program_and_flags() {
        let config = parse_ok(&["prog.txt", "-c", "--dump", "--no-timestamp"], None);
        assert_eq!(config.program, PathBuf::from("prog.txt"));
        assert_eq!(config.mode, Mode::Check);
        assert!(config.dump);
        assert!(!config.show_timestamp);
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(Config::parse(["-h", "--fast"], None), Ok(Command::Help));
        assert_eq!(Config::parse(["--help"], None), Ok(Command::Help));
    }

    #[test]
    fn env_sets_default_level() {
        assert_eq!(parse_ok(&[], Some("debug")).log_level, Level::Debug);
        assert_eq!(parse_ok(&[], Some(" WARN ")).log_level, Level::Warn);
        assert_eq!(parse_ok(&[], Some("")).log_level, Level::Info);
    }

    #[test]
    fn flags_override_env() {
        assert_eq!(parse_ok(&["-q"], Some("debug")).log_level, Level::Error);
        assert_eq!(parse_ok(&["--trace"], Some("error")).log_level, Level::Debug);
        assert_eq!(parse_ok(&["-q", "-t"], None).log_level, Level::Debug);
    }

    #[test]
    fn invalid_env_level() {
        assert_eq!(
            Config::parse(Vec::<String>::new(), Some("loud")),
            Err(ConfigError::InvalidLogLevel {
                value: "loud".into()
            })
        );
    }

    #[test]
    fn unknown_option() {
        let err = Config::parse(["--fast"], None).unwrap_err();
        assert_eq!(err.to_string(), "unknown option: --fast");
    }

    #[test]
    fn second_program_rejected() {
        let err = Config::parse(["a.txt", "b.txt"], None).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnexpectedArgument {
                arg: "b.txt".into(),
                program: "a.txt".into()
            }
        );
    }

    #[test]
    fn lone_dash_is_a_program_path() {
        assert_eq!(parse_ok(&["-"], None).program, PathBuf::from("-"));
    }
}
