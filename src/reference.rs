//! Chapter/verse/marker tracking while walking a document line by line.

use crate::marker::split_marker;

/// Sentinel chapter and starting verse for lines before the first `\c`.
pub const NO_CHAPTER: &str = "-1";

/// Where a single non-blank line sits in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRef {
    pub chapter: String,
    pub verse: String,
    /// The line's own marker, if it has one.
    pub marker: Option<String>,
    /// The line's own marker, or the last explicit marker before it.
    pub effective_marker: Option<String>,
}

impl LineRef {
    /// `"C:V"`
    pub fn cv_ref(&self) -> String {
        format!("{}:{}", self.chapter, self.verse)
    }

    /// `"BBB_C:V"`
    pub fn bcv_ref(&self, book: &str) -> String {
        format!("{}_{}:{}", book, self.chapter, self.verse)
    }

    /// The diagnostic location `"BBB_C:V~marker"`.
    pub fn location(&self, book: &str) -> String {
        format!(
            "{}~{}",
            self.bcv_ref(book),
            self.marker.as_deref().unwrap_or("None")
        )
    }
}

/// Scan state for one document.
///
/// Lines before the first chapter marker are addressed as pseudo-verses
/// `-1:0`, `-1:1`, … so that header lines such as `\id` and `\h` can be
/// targeted by reference.
#[derive(Debug, Clone)]
pub struct ReferenceTracker {
    chapter: String,
    verse: String,
    last_marker: Option<String>,
}

impl Default for ReferenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self {
            chapter: NO_CHAPTER.to_string(),
            verse: NO_CHAPTER.to_string(),
            last_marker: None,
        }
    }

    pub fn chapter(&self) -> &str {
        &self.chapter
    }

    pub fn verse(&self) -> &str {
        &self.verse
    }

    pub fn last_marker(&self) -> Option<&str> {
        self.last_marker.as_deref()
    }

    /// Moves past one line and reports where it sits.
    ///
    /// Returns `None` for blank lines, which take no part in filtering and
    /// leave the last marker alone.
    pub fn advance(&mut self, line: &str) -> Option<LineRef> {
        if self.chapter == NO_CHAPTER {
            self.bump_pseudo_verse();
        }

        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            return None;
        }

        let (marker, text) = split_marker(line);
        match marker {
            Some("c") => {
                self.chapter = text.to_string();
                self.verse = "0".to_string();
            }
            Some("v") => {
                self.verse = text.split_whitespace().next().unwrap_or_default().to_string();
            }
            _ => {}
        }
        if let Some(m) = marker {
            self.last_marker = Some(m.to_string());
        }

        Some(LineRef {
            chapter: self.chapter.clone(),
            verse: self.verse.clone(),
            marker: marker.map(str::to_string),
            effective_marker: self.last_marker.clone(),
        })
    }

    fn bump_pseudo_verse(&mut self) {
        // The verse is always numeric while no chapter has been seen
        let next = self.verse.parse::<i64>().map(|v| v + 1).unwrap_or(0);
        self.verse = next.to_string();
    }
}
