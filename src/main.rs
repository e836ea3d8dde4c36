use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flotate::{Dialect, Options};

#[derive(Parser, Debug)]
#[command(name = "flotate")]
#[command(about = "Turns JSDoc and flow comment types into inline type annotations")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a file and print the result to stdout
    Convert {
        /// Path to the JavaScript file
        file: PathBuf,

        /// Do not parse JSX syntax
        #[arg(long)]
        no_jsx: bool,

        /// Accept TypeScript syntax, e.g. to run over already converted output
        #[arg(long)]
        typescript: bool,

        /// Log every edit
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Builds the log filter from `FLOTATE_LOG`, falling back to `RUST_LOG` and then to `warn`.
fn build_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    match std::env::var("FLOTATE_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    }
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    match args.command {
        Command::Convert {
            file,
            no_jsx,
            typescript,
            verbose,
        } => {
            init_tracing(verbose);

            let text = match fs::read_to_string(&file) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("Error: failed to read {}: {}", file.display(), e);
                    return ExitCode::FAILURE;
                }
            };

            let options = Options {
                jsx: !no_jsx,
                verbose,
                dialect: if typescript {
                    Dialect::TypeScript
                } else {
                    Dialect::JavaScript
                },
            };
            match flotate::convert_with(&text, &options) {
                Ok(converted) => {
                    info!(file = %file.display(), "converted");
                    print!("{}", converted);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}: {}", file.display(), e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
