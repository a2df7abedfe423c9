//! Edit commands and the tables that hold them.
//!
//! An [`EditCommand`] is one row of a command table: which books, markers and
//! references it is limited to, what to search for, and what to put in its
//! place. Commands are read-only once built; the [`Editor`](crate::editor::Editor)
//! validates and compiles them once per run.

use crate::chunk::short_form;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// The behaviour flags of a command.
///
/// Tags are written as a string of single characters in command tables:
/// `w` (whole word), `l` (loop until no match remains) and `d` (distance
/// attenuation). `l` and `d` cannot be combined. Transliteration flags (`H`,
/// `G`) are resolved before commands reach the engine and are ignored here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct Tags {
    pub whole_word: bool,
    pub repeat: bool,
    pub distance: bool,
}

impl Tags {
    /// Parses a tag string such as `"wl"`.
    pub fn parse(s: &str) -> Self {
        let mut tags = Tags::default();
        for ch in s.chars() {
            match ch {
                'w' => tags.whole_word = true,
                'l' => tags.repeat = true,
                'd' => tags.distance = true,
                'H' | 'G' => {}
                other => tracing::warn!("Ignoring unknown command tag {other:?}"),
            }
        }
        tags
    }
}

impl From<String> for Tags {
    fn from(s: String) -> Self {
        Tags::parse(&s)
    }
}

impl From<&str> for Tags {
    fn from(s: &str) -> Self {
        Tags::parse(s)
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.whole_word {
            f.write_str("w")?;
        }
        if self.repeat {
            f.write_str("l")?;
        }
        if self.distance {
            f.write_str("d")?;
        }
        Ok(())
    }
}

/// A single find/replace rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EditCommand {
    pub tags: Tags,
    pub include_books: HashSet<String>,
    pub exclude_books: HashSet<String>,
    pub include_markers: HashSet<String>,
    pub exclude_markers: HashSet<String>,
    pub include_refs: HashSet<String>,
    pub exclude_refs: HashSet<String>,
    /// Leading context, a regex fragment optionally prefixed by `<=` or `<!`.
    pub pre_text: String,
    /// Reserved, never consulted.
    pub search_case: String,
    #[serde(rename = "search")]
    pub search_text: String,
    /// Trailing context, a regex fragment optionally prefixed by `=` or `!`.
    pub post_text: String,
    /// Reserved, never consulted.
    pub replace_case: String,
    #[serde(rename = "replace")]
    pub replace_text: String,
    pub name: String,
    pub comment: String,
}

impl EditCommand {
    /// Creates a command with only the search/replace pair and tags set.
    pub fn new(tags: &str, search_text: &str, replace_text: &str) -> Self {
        Self {
            tags: Tags::parse(tags),
            search_text: search_text.to_string(),
            replace_text: replace_text.to_string(),
            ..Default::default()
        }
    }

    /// A short human-readable label for log messages and errors.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("{:?}->{:?}", self.search_text, self.replace_text)
        } else {
            format!("'{}'", self.name)
        }
    }

    /// `true` if the command is limited to certain markers or references and
    /// therefore has to be applied line by line.
    pub fn has_line_filters(&self) -> bool {
        !self.include_markers.is_empty()
            || !self.exclude_markers.is_empty()
            || !self.include_refs.is_empty()
            || !self.exclude_refs.is_empty()
    }

    /// Checks the authoring rules that must hold before a command may run.
    pub fn validate(&self) -> Result<()> {
        if self.search_text.is_empty() {
            return Err(self.invalid("search text is empty"));
        }
        if self.tags.repeat && self.tags.distance {
            return Err(self.invalid("the 'l' and 'd' tags cannot be combined"));
        }
        if self.tags.distance && short_form(&self.replace_text).is_none() {
            return Err(self.invalid(format!(
                "can't use the 'd' tag with {:?}: it needs a '/' or an '\\add …\\add*' span",
                self.replace_text
            )));
        }
        for (kind, include, exclude) in [
            ("book", &self.include_books, &self.exclude_books),
            ("marker", &self.include_markers, &self.exclude_markers),
            ("reference", &self.include_refs, &self.exclude_refs),
        ] {
            if let Some(both) = include.intersection(exclude).next() {
                return Err(self.invalid(format!("{kind} {both:?} is both included and excluded")));
            }
        }
        Ok(())
    }

    pub(crate) fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidCommand {
            command: self.label(),
            reason: reason.into(),
        }
    }
}

/// A named, ordered list of commands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandTable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub commands: Vec<EditCommand>,
}

impl CommandTable {
    pub fn new(name: impl Into<String>, commands: Vec<EditCommand>) -> Self {
        Self {
            name: name.into(),
            commands,
        }
    }
}
