//! `scripted_editor` applies ordered, declarative find/replace rules to USFM
//! Bible text while keeping the markup intact.
//!
//! It provides the core logic for the `sbe` command-line tool but can also be used
//! as a standalone library. The main components are:
//!
//! - `marker` and `reference`: splitting lines into marker and text, and tracking
//!   chapter, verse and governing marker while walking a book.
//! - `filter`: deciding per book and per line whether a command applies.
//! - `chunk`: literal replacement, with the loop and distance-attenuation policies.
//! - `contextual`: whole-word and context-constrained replacement that carries
//!   word-link ids from the matched text into the replacement.
//! - `editor`: the `Editor`, which prepares command tables once and applies them
//!   to each book in order.
//! - `config` and `runner`: loading control files and command tables, and running
//!   a whole set of books in parallel with Rayon.

pub mod books;
pub mod chunk;
pub mod cli;
pub mod command;
pub mod config;
pub mod contextual;
pub mod editor;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod marker;
pub mod patterns;
pub mod reference;
pub mod runner;

// Re-export main types for easier access by library users.
pub use command::{CommandTable, EditCommand, Tags};
pub use config::EngineOptions;
pub use editor::Editor;
pub use errors::{Error, Result};
