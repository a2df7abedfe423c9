use crate::books::{expand_template, BookRegistry, StandardBooks};
use crate::config::{ConfigLoader, ControlConfig};
use crate::editor::Editor;
use crate::errors::{Error, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

pub const PROGRAM_NAME_VERSION: &str = concat!("ScriptedEditor v", env!("CARGO_PKG_VERSION"));

/// Options for a batch run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// If `true`, changes will be calculated but not written to disk.
    pub dry_run: bool,
    /// Print each changed book.
    pub verbose: bool,
    /// The number of parallel worker threads. Defaults to the number of logical CPU cores.
    pub workers: Option<usize>,
}

/// The result of processing a single book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookResult {
    pub book: String,
    pub output: PathBuf,
    pub chars_before: usize,
    pub chars_after: usize,
    /// `true` if the edits changed the text.
    pub modified: bool,
}

/// Summary statistics of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub read: usize,
    pub modified: usize,
    pub failed: usize,
}

/// Everything needed to process the books of one control file.
pub struct Batch {
    control: ControlConfig,
    input_dir: PathBuf,
    output_dir: PathBuf,
    editor: Editor,
}

impl Batch {
    /// Loads the control file, its command tables, and prepares the editor.
    pub fn load(control_path: &Path) -> Result<Self> {
        let control = ConfigLoader::load_control(control_path)?;
        let control_dir = control_path.parent().unwrap_or_else(|| Path::new("."));
        let tables = ConfigLoader::load_tables(&control, control_dir)?;
        let editor = Editor::new(tables, control.options.clone())?;

        Ok(Self {
            input_dir: control_dir.join(&control.input_folder),
            output_dir: control_dir.join(&control.output_folder),
            control,
            editor,
        })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn title(&self) -> &str {
        self.control.title.as_deref().unwrap_or("control file")
    }

    /// The books to process, checked against the registry.
    pub fn books<'a>(&'a self, registry: &'a dyn BookRegistry) -> Result<Vec<&'a str>> {
        match &self.control.books {
            None => Ok(registry.books()),
            Some(books) => books
                .iter()
                .map(|b| {
                    if registry.contains(b) {
                        Ok(b.as_str())
                    } else {
                        Err(Error::UnknownBook(b.clone()))
                    }
                })
                .collect(),
        }
    }

    /// Applies every table to one book's file. Returns `None` if the book has
    /// no input file.
    pub fn process_book(
        &self,
        book: &str,
        registry: &dyn BookRegistry,
        dry_run: bool,
    ) -> Result<Option<BookResult>> {
        let input_name = expand_template(&self.control.input_filename_template, book, registry);
        let input_path = self.input_dir.join(&input_name);
        if !input_path.is_file() {
            return Ok(None);
        }

        let input = fs::read_to_string(&input_path)?;
        let chars_before = input.chars().count();
        tracing::info!("Read {chars_before} characters from {}", input_path.display());
        let mut applied = self.editor.apply(book, &input);

        let output_name = match &self.control.output_filename_template {
            Some(template) => expand_template(template, book, registry),
            None => input_name,
        };
        let output = self.output_dir.join(output_name);
        let modified = applied != input;

        if modified {
            if self.editor.options().stamp_edits {
                let now = Local::now().format("%Y-%m-%d %H:%M").to_string();
                applied = stamp_edit(&applied, &now);
            }
            if !dry_run {
                write_atomically(&self.output_dir, &output, &applied)?;
            }
        }

        Ok(Some(BookResult {
            book: book.to_string(),
            output,
            chars_before,
            chars_after: applied.chars().count(),
            modified,
        }))
    }
}

/// Records the edit in a `\rem` line placed before the `\h` line.
pub fn stamp_edit(text: &str, timestamp: &str) -> String {
    text.replacen(
        "\n\\h ",
        &format!("\n\\rem USFM file edited {timestamp} by {PROGRAM_NAME_VERSION}\n\\h "),
        1,
    )
}

/// The requested number of workers, or one per logical CPU.
pub fn worker_count(workers: Option<usize>) -> usize {
    workers.unwrap_or_else(num_cpus::get)
}

fn write_atomically(dir: &Path, path: &Path, content: &str) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.persist(path)?;
    Ok(())
}

/// The main entry point for the `apply` command.
///
/// This function orchestrates the entire run:
/// 1. It finds and loads the control file and every command table it lists.
/// 2. It prepares the editor once, failing on any invalid command.
/// 3. It uses a Rayon thread pool to process the books in parallel.
/// 4. It collects and prints summary statistics.
pub fn run_apply(control: PathBuf, options: RunOptions) -> Result<RunStats> {
    let working_dir = std::env::current_dir()?;
    let control_path = ConfigLoader::find_config(&control, &working_dir)?;
    println!("Using control file: {}", control_path.display());

    let batch = Batch::load(&control_path)?;
    let registry = StandardBooks;
    let books = batch.books(&registry)?;
    let num_tables = batch.editor().tables().len();
    println!(
        "Applying edits from {num_tables} table(s) of '{}' to up to {} book(s)",
        batch.title(),
        books.len()
    );

    let read = AtomicUsize::new(0);
    let modified = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count(options.workers))
        .build()?;

    let pb = if options.verbose {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(books.len() as u64)
    };
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("##-"));
    }

    let log_changes = options.verbose || options.dry_run;

    pool.install(|| {
        books.par_iter().for_each(|book| {
            pb.set_message(book.to_string());
            match batch.process_book(book, &registry, options.dry_run) {
                Ok(Some(result)) => {
                    read.fetch_add(1, Ordering::Relaxed);
                    if result.modified {
                        modified.fetch_add(1, Ordering::Relaxed);
                        if log_changes {
                            println!(
                                "{}Wrote {} characters (was {}) to {}",
                                if options.dry_run { "DRY " } else { "" },
                                result.chars_after,
                                result.chars_before,
                                result.output.display()
                            );
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!("Error processing {book}: {e}");
                }
            }
            pb.inc(1);
        });
    });
    pb.finish_and_clear();

    let stats = RunStats {
        read: read.into_inner(),
        modified: modified.into_inner(),
        failed: failed.into_inner(),
    };
    println!("\n{}", "-".repeat(50));
    println!("Books read    : {}", stats.read);
    println!("Books changed : {}", stats.modified);
    if stats.failed > 0 {
        println!("Books failed  : {}", stats.failed);
    }

    Ok(stats)
}

/// The main entry point for the `check` command.
///
/// Loads and prepares every command table without touching any book.
pub fn run_check(control: PathBuf) -> Result<()> {
    let working_dir = std::env::current_dir()?;
    let control_path = ConfigLoader::find_config(&control, &working_dir)?;
    let batch = Batch::load(&control_path)?;

    println!("'{}' is valid:", batch.title());
    for table in batch.editor().tables() {
        println!("  {:<20} {} command(s)", table.name, table.commands.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_edit() {
        let text = "\\id MAT\n\\h Matthew\n\\c 1\n";
        let stamped = stamp_edit(text, "2022-09-21 10:00");
        assert_eq!(
            stamped,
            format!(
                "\\id MAT\n\\rem USFM file edited 2022-09-21 10:00 by {PROGRAM_NAME_VERSION}\n\\h Matthew\n\\c 1\n"
            )
        );
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(Some(3)), 3);
        assert_eq!(worker_count(None), num_cpus::get());
        assert!(worker_count(None) >= 1);
    }

    #[test]
    fn test_stamp_edit_without_header() {
        assert_eq!(stamp_edit("\\c 1\n", "now"), "\\c 1\n");
    }
}
