use anyhow::{Context, Result};
use colored::*;
use miniseq::cli::{Options, USAGE};
use miniseq::commands::midi::format_ports;
use miniseq::repl::Repl;
use miniseq::{demo, LogSink, MidiSink, OutputSink, TransportController};
use std::fs::File;
use std::process;
use std::sync::Arc;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = Options::parse(std::env::args().skip(1))
        .with_context(|| format!("bad arguments\n\n{}", USAGE))?;
    if options.help {
        println!("{}", USAGE);
        return Ok(());
    }
    init_logging(&options)?;

    if options.list_ports {
        println!("{}", format_ports(&MidiSink::list_ports()?));
        return Ok(());
    }

    let (sink, output_name): (Box<dyn OutputSink>, String) = if options.dry_run {
        (Box::new(LogSink::new()), "dry run (log only)".to_string())
    } else {
        let selector = options.port.as_deref().unwrap_or("0");
        let sink = MidiSink::open(selector)
            .context("could not open a MIDI output (use --list-ports or --dry-run)")?
            .with_panic_delay(options.config.panic_delay);
        let name = sink.port_name().to_string();
        (Box::new(sink), name)
    };

    let controller = TransportController::with_shared_sink(
        options.config.clone(),
        Arc::new(std::sync::Mutex::new(sink)),
    )?;
    if options.demo {
        controller.load_track(demo::demo_track(options.config.ppq));
    }
    let controller = Arc::new(controller);

    let mut repl = Repl::new(controller.clone(), output_name)?;
    let outcome = repl.run();
    controller.close()?;
    outcome
}

/// Log to stderr, or to a file when `--log-file` is given. `RUST_LOG`
/// overrides the default level.
fn init_logging(options: &Options) -> Result<()> {
    let mut builder = match &options.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            let mut builder =
                env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            builder
        }
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")),
    };
    builder.try_init()?;
    Ok(())
}
