//! drmshot — one-shot DRM/KMS framebuffer capture.
//!
//! Opens a DRM device node, picks an active connector, sizes a dumb
//! buffer to its first mode, maps it, and writes the pixels out as a
//! JPEG.  Single-shot and fully synchronous; there is no retry and no
//! capture loop.

mod capture;
mod encode;
mod exit_codes;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use capture::{connector, Card, CaptureConfig};
use exit_codes::ExitCode;

/// drmshot - DRM framebuffer capture
#[derive(Parser, Debug)]
#[command(name = "drmshot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture the framebuffer to a JPEG file
    Capture {
        /// DRM device node to open
        #[arg(short, long, default_value = "/dev/dri/card0")]
        device: PathBuf,

        /// Connector to capture (e.g. HDMIA-1); defaults to the first active one
        #[arg(short, long)]
        connector: Option<String>,

        /// Output file path, overwritten on each run
        #[arg(short, long, default_value = "framebuffer.jpeg")]
        output: PathBuf,

        /// JPEG quality
        #[arg(short = 'Q', long, default_value_t = 75,
              value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },
    /// List connectors and their modes
    List {
        /// DRM device node to open
        #[arg(short, long, default_value = "/dev/dri/card0")]
        device: PathBuf,

        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let code = run(cli);
    std::process::exit(code.as_i32());
}

/// Initialize logging with RUST_LOG env var support; diagnostics go to
/// the error stream so stdout stays clean for `list --json`.
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Commands::Capture {
            device,
            connector,
            output,
            quality,
        } => {
            let cfg = CaptureConfig {
                device,
                connector,
                output,
                quality,
            };
            match capture::capture_to_file(&cfg) {
                Ok(summary) => {
                    if !cli.quiet {
                        println!(
                            "wrote {} ({}x{}, {} bytes) from {} mode {}",
                            summary.output.display(),
                            summary.width,
                            summary.height,
                            summary.file_bytes,
                            summary.connector,
                            summary.mode
                        );
                    }
                    ExitCode::Success
                }
                Err(err) => {
                    eprintln!("drmshot: {}", err);
                    ExitCode::from(&err)
                }
            }
        }
        Commands::List { device, json } => list_connectors(&device, json),
    }
}

fn list_connectors(device: &Path, json: bool) -> ExitCode {
    let card = match Card::open(device) {
        Ok(card) => card,
        Err(err) => {
            eprintln!("drmshot: {}", err);
            return ExitCode::from(&err);
        }
    };
    let outputs = match connector::list_outputs(&card) {
        Ok(outputs) => outputs,
        Err(err) => {
            eprintln!("drmshot: {}", err);
            return ExitCode::from(&err);
        }
    };

    if json {
        match serde_json::to_string_pretty(&outputs) {
            Ok(text) => println!("{}", text),
            Err(err) => {
                eprintln!("drmshot: failed to serialize connector list: {}", err);
                return ExitCode::GeneralError;
            }
        }
    } else {
        for output in &outputs {
            println!(
                "{}  {}  {} mode(s)",
                output.name,
                if output.connected {
                    "connected"
                } else {
                    "disconnected"
                },
                output.modes.len()
            );
            for mode in &output.modes {
                println!(
                    "    {}  {}x{} @ {} Hz",
                    mode.name, mode.width, mode.height, mode.refresh_hz
                );
            }
        }
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Verify the CLI definition is valid
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_capture_defaults() {
        let cli = Cli::try_parse_from(["drmshot", "capture"]).unwrap();
        match cli.command {
            Commands::Capture {
                device,
                connector,
                output,
                quality,
            } => {
                assert_eq!(device, PathBuf::from("/dev/dri/card0"));
                assert!(connector.is_none());
                assert_eq!(output, PathBuf::from("framebuffer.jpeg"));
                assert_eq!(quality, 75);
            }
            _ => panic!("expected capture command"),
        }
    }

    #[test]
    fn parse_capture_with_options() {
        let cli = Cli::try_parse_from([
            "drmshot",
            "capture",
            "-d",
            "/dev/dri/card2",
            "-c",
            "HDMIA-1",
            "-o",
            "/tmp/shot.jpeg",
            "-Q",
            "90",
        ])
        .unwrap();
        match cli.command {
            Commands::Capture {
                device,
                connector,
                output,
                quality,
            } => {
                assert_eq!(device, PathBuf::from("/dev/dri/card2"));
                assert_eq!(connector.as_deref(), Some("HDMIA-1"));
                assert_eq!(output, PathBuf::from("/tmp/shot.jpeg"));
                assert_eq!(quality, 90);
            }
            _ => panic!("expected capture command"),
        }
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["drmshot", "capture", "-Q", "0"]).is_err());
        assert!(Cli::try_parse_from(["drmshot", "capture", "-Q", "101"]).is_err());
    }

    #[test]
    fn parse_list_with_json() {
        let cli = Cli::try_parse_from(["drmshot", "list", "--json"]).unwrap();
        match cli.command {
            Commands::List { device, json } => {
                assert_eq!(device, PathBuf::from("/dev/dri/card0"));
                assert!(json);
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["drmshot", "capture", "-v", "-q"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.quiet);
    }

    #[test]
    fn parse_invalid_command() {
        assert!(Cli::try_parse_from(["drmshot", "record"]).is_err());
    }
}
