//! The main entry point for the `sbe` command-line application.
//!
//! This file is responsible for parsing command-line arguments and dispatching
//! to the appropriate runner in the `scripted_editor` library.

use anyhow::Context;
use scripted_editor::cli::{self, Commands};
use scripted_editor::runner::{self, RunOptions};
use scripted_editor::logging;
use std::env;
use std::process;

fn main() -> anyhow::Result<()> {
    // Just 'sbe' on its own: show a quick start instead of clap's error
    if env::args().len() == 1 {
        println!("Scripted find/replace for USFM Bible text\n");
        println!("QUICK START EXAMPLES:");
        println!("  sbe apply control.yaml            # Apply all command tables");
        println!("  sbe apply control.yaml --dry-run  # Preview changes");
        println!("  sbe check control.yaml            # Validate command tables");
        println!("\nRun 'sbe --help' for full command list");
        process::exit(0);
    }

    let args = cli::parse_args();
    logging::init(args.verbose);

    match args.command {
        Commands::Apply {
            control,
            dry_run,
            workers,
        } => {
            let options = RunOptions {
                dry_run,
                verbose: args.verbose > 0,
                workers,
            };
            let stats = runner::run_apply(control.clone(), options)
                .with_context(|| format!("applying {}", control.display()))?;
            if stats.failed > 0 {
                process::exit(1);
            }
        }
        Commands::Check { control } => runner::run_check(control.clone())
            .with_context(|| format!("checking {}", control.display()))?,
    }

    Ok(())
}
