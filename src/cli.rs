use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Scripted find/replace for USFM Bible text.
///
/// `sbe` applies ordered tables of find/replace commands to a set of USFM
/// books, optionally limited to particular books, markers and references.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Scripted find/replace for USFM Bible text",
    long_about = "sbe - Applies ordered tables of find/replace commands to USFM books.

Commands can be limited to books, markers (\\v, \\s1, …) and references (1:2, MAT_1:2),
match whole words or surrounding context, carry word-link ids (word¦1234) across,
and alternate long and short forms of frequently-recurring names.

QUICK EXAMPLES:
  sbe apply control.yaml            # Apply every table listed in control.yaml
  sbe apply control.yaml --dry-run  # Report what would change
  sbe check control.yaml            # Validate the command tables only"
)]
pub struct Args {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides it.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// The set of available commands for the `sbe` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the command tables of a control file to its books
    ///
    /// EXAMPLES:
    ///   sbe apply control.yaml
    ///   sbe apply control.yaml -w 4 --dry-run
    ///
    /// Control file format (control.yaml):
    ///   title: Update VLT
    ///   command_tables:
    ///     - name: names
    ///       path: names.yaml
    ///   input_folder: source/
    ///   output_folder: edited/
    ///   input_filename_template: UUU.usfm
    ///
    /// Command table format (names.yaml):
    ///   commands:
    ///     - tags: wd
    ///       search: Jesus
    ///       replace: Jesus/Yeshua
    ///       exclude_markers: [s1]
    Apply {
        /// Path to the YAML control file.
        control: PathBuf,

        /// Preview the changes without writing any files.
        #[arg(long)]
        dry_run: bool,

        /// The number of parallel worker threads to use.
        #[arg(short, long, env = "SBE_WORKERS")]
        workers: Option<usize>,
    },

    /// Load and validate the command tables of a control file
    Check {
        /// Path to the YAML control file.
        control: PathBuf,
    },
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
