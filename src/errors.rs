use thiserror::Error;

/// The primary error type for all operations in the `scripted_editor` crate.
///
/// Preparation errors (`InvalidCommand`) are raised before any document is
/// touched. `UnsupportedWordLink` is raised mid-transform and is normally caught
/// by the [`Editor`](crate::editor::Editor), which logs it and passes the
/// affected text through unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// An error related to file system I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that occurred during regex compilation.
    #[error("Pattern compilation failed: {0}")]
    Regex(#[from] regex::Error),

    /// An error that occurred while parsing a YAML control or command file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),

    /// A command that breaks one of the authoring rules checked while preparing it.
    #[error("Invalid command {command}: {reason}")]
    InvalidCommand { command: String, reason: String },

    /// A word-link replacement whose shape the engine refuses to guess at.
    #[error("Unsupported word-link replacement in {command}: {reason}")]
    UnsupportedWordLink { command: String, reason: String },

    /// A book id that the book registry does not know.
    #[error("Unknown book id: {0}")]
    UnknownBook(String),

    /// An error that occurred while building the Rayon thread pool.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An error related to persisting a temporary file.
    #[error("Tempfile error: {0}")]
    TempFile(#[from] tempfile::PersistError),
}

/// A convenient type alias for `Result<T, scripted_editor::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}
