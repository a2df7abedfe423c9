use crate::command::CommandTable;
use crate::errors::Result;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Default distance, in characters, between two full replacements under the `d` tag.
///
/// 3JN is about 2,300 characters of USFM, a single chapter of MAT about 3,500.
pub const STANDARD_DISTANCE: usize = 2500;

/// Default word-link marker character.
pub const WORD_LINK_CHAR: char = '¦';

/// Engine-wide options shared by every command of a run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Wrap contextual replacements in `Rx-…-Rx` so that they stand out when reviewing.
    pub flag_replacements: bool,
    /// Distance between full replacements for the `d` tag.
    pub distance: usize,
    /// The character that introduces a numeric word-link id.
    pub word_link_char: char,
    /// Add a `\rem` line recording the edit to every changed book.
    pub stamp_edits: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            flag_replacements: false,
            distance: STANDARD_DISTANCE,
            word_link_char: WORD_LINK_CHAR,
            stamp_edits: true,
        }
    }
}

/// A reference from the control file to one command table file.
#[derive(Debug, Clone, Deserialize)]
pub struct TableRef {
    /// The name the table is reported under.
    pub name: String,
    /// Path of the YAML table, relative to the control file.
    pub path: PathBuf,
}

/// The control file that describes a whole editing run.
///
/// ```yaml
/// title: Update VLT
/// command_tables:
///   - name: names
///     path: names.yaml
/// input_folder: source/
/// output_folder: edited/
/// input_filename_template: UUU.usfm
/// books: [MAT, MRK]
/// flag_replacements: true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    #[serde(default)]
    pub title: Option<String>,
    /// Tables are applied in the order listed.
    pub command_tables: Vec<TableRef>,
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    /// `BBB` is replaced by the book id, `UUU` by its USFM abbreviation.
    pub input_filename_template: String,
    /// Defaults to the input template.
    #[serde(default)]
    pub output_filename_template: Option<String>,
    /// Books to process. Defaults to every known book.
    #[serde(default)]
    pub books: Option<Vec<String>>,
    #[serde(flatten)]
    pub options: EngineOptions,
}

/// A utility for loading control files and command tables.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the control file by searching in a prioritized list of locations.
    ///
    /// The search order is:
    /// 1. The path provided in `config_path`, if it exists.
    /// 2. A path relative to the `working_dir`.
    /// 3. Next to the executable.
    pub fn find_config(config_path: &Path, working_dir: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let in_working_dir = working_dir.join(config_path);
        if in_working_dir.exists() {
            return Ok(in_working_dir);
        }

        let mut tried_locations = vec![
            config_path.display().to_string(),
            in_working_dir.display().to_string(),
        ];

        if let Ok(exe_path) = env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let exe_config = exe_dir.join(config_path);
                if exe_config.exists() {
                    return Ok(exe_config);
                }
                tried_locations.push(exe_config.display().to_string());
            }
        }

        Err(format!(
            "Control file '{}' not found. Searched in:\n  - {}",
            config_path.display(),
            tried_locations.join("\n  - ")
        )
        .into())
    }

    /// Loads a `ControlConfig` from a YAML file.
    pub fn load_control(path: &Path) -> Result<ControlConfig> {
        let file = File::open(path)?;
        let control: ControlConfig = serde_yaml::from_reader(file)?;
        if control.command_tables.is_empty() {
            return Err(format!("No command tables listed in {}", path.display()).into());
        }
        Ok(control)
    }

    /// Loads one command table from a YAML file, naming it `name`.
    pub fn load_table(name: &str, path: &Path) -> Result<CommandTable> {
        let file = File::open(path)?;
        let mut table: CommandTable = serde_yaml::from_reader(file)?;
        table.name = name.to_string();
        tracing::info!(
            "Loaded {} command(s) for '{}' from {}",
            table.commands.len(),
            name,
            path.display()
        );
        Ok(table)
    }

    /// Loads every table the control file lists, in order, resolving their
    /// paths against `control_dir`.
    pub fn load_tables(control: &ControlConfig, control_dir: &Path) -> Result<Vec<CommandTable>> {
        control
            .command_tables
            .iter()
            .map(|t| Self::load_table(&t.name, &control_dir.join(&t.path)))
            .collect()
    }
}
