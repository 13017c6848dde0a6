mod repl;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use macaque_interpreter::ContextOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Script to run. Starts a REPL when omitted.
    path: Option<PathBuf>,
    /// Nested function calls allowed before evaluation fails.
    #[arg(long, default_value_t = ContextOptions::default().max_call_depth)]
    max_call_depth: usize,
    /// Largest length an array may grow to by assigning past its end.
    #[arg(long, default_value_t = ContextOptions::default().max_array_length)]
    max_array_length: usize,
    /// Log more; repeat for more detail. `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = ContextOptions {
        max_call_depth: cli.max_call_depth,
        max_array_length: cli.max_array_length,
    };

    match cli.path {
        None => match repl::start(options) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {}", err);
                ExitCode::FAILURE
            }
        },
        Some(path) => match runner::execute(&path, options) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            }
        },
    }
}
