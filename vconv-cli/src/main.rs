// ============================================================================
// vconv-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: vconv Command-Line Application
//
// Parses the command line, installs logging under the output root and runs
// the selected command. The process exit code comes from the run summary:
// non-zero when a selected conversion failed or nothing convertible was
// found. Errors that abort the run (missing ffmpeg, bad input path, invalid
// configuration) are printed to stderr and exit with status 1.

use clap::Parser;
use log::error;

use vconv_cli::{Cli, Commands, logging, run_convert};

use std::process;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert(args) => logging::init_logging(&args.output_dir, args.debug)
            .and_then(|log_path| run_convert(args, &log_path)),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            // No logger yet if logging itself failed to start
            if log::max_level() == log::LevelFilter::Off {
                eprintln!("Error: {e}");
            } else {
                error!("{e}");
            }
            process::exit(1);
        }
    }
}
