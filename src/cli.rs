//! Command-line options

use anyhow::{anyhow, bail, Context, Result};
use miniseq_core::SeqConfig;
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: miniseq [OPTIONS] [PORT]

Options:
  --port <PORT>       MIDI output port, by number or part of its name
  --list-ports        Print the available MIDI output ports and exit
  --dry-run           Log MIDI messages instead of opening a port
  --bpm <BPM>         Tempo in quarter notes per minute [default: 100]
  --ppq <PPQ>         Ticks per quarter note [default: 120]
  --batch <N>         Events pulled per source each tick [default: 64]
  --no-demo           Start without the demo track
  --log-file <PATH>   Write the log to PATH instead of stderr
  -h, --help          Print this help";

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub config: SeqConfig,
    pub port: Option<String>,
    pub list_ports: bool,
    pub dry_run: bool,
    pub demo: bool,
    pub log_file: Option<PathBuf>,
    pub help: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: SeqConfig::default(),
            port: None,
            list_ports: false,
            dry_run: false,
            demo: true,
            log_file: None,
            help: false,
        }
    }
}

impl Options {
    /// Parse arguments, excluding the program name
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Options::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => options.help = true,
                "--list-ports" => options.list_ports = true,
                "--dry-run" => options.dry_run = true,
                "--no-demo" => options.demo = false,
                "--port" => options.port = Some(value(&mut args, &arg)?),
                "--log-file" => options.log_file = Some(PathBuf::from(value(&mut args, &arg)?)),
                "--bpm" => {
                    let raw = value(&mut args, &arg)?;
                    options.config.bpm = raw
                        .parse::<f64>()
                        .with_context(|| format!("invalid value '{}' for --bpm", raw))?;
                }
                "--ppq" => {
                    let raw = value(&mut args, &arg)?;
                    options.config.ppq = raw
                        .parse::<u32>()
                        .with_context(|| format!("invalid value '{}' for --ppq", raw))?;
                }
                "--batch" => {
                    let raw = value(&mut args, &arg)?;
                    options.config.batch_size = raw
                        .parse::<usize>()
                        .with_context(|| format!("invalid value '{}' for --batch", raw))?;
                }
                flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
                positional => {
                    if options.port.is_some() {
                        bail!("unexpected argument '{}'", positional);
                    }
                    options.port = Some(positional.to_string());
                }
            }
        }

        options.config.validate()?;
        Ok(options)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("option '{}' needs a value", flag))
}
