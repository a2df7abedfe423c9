//! Deciding where a command applies.
//!
//! Checks run in a fixed order and the first one that matches wins:
//! excluded or not-included book, then (per line) excluded marker,
//! not-included marker, excluded `C:V`, excluded `BBB_C:V`, and finally
//! not-included reference. Lines with no marker of their own and none
//! before them skip the marker checks.

use crate::command::EditCommand;
use crate::reference::LineRef;

/// How a command is applied to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    /// The book is excluded or not included; the document is left alone.
    SkipBook,
    /// No marker or reference filters: the whole text goes to the replacer at once.
    WholeText,
    /// The document is walked line by line and each line is checked.
    ByLine,
}

/// The verdict for one line in [`CommandScope::ByLine`] mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDecision {
    /// Run the replacer on this line. `location` is `"BBB_C:V~marker"`.
    Transform { location: String },
    /// Copy the line through untouched.
    PassThrough(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ExcludedMarker,
    NotIncludedMarker,
    ExcludedRef,
    ExcludedBookRef,
    NotIncludedRef,
}

/// Which replacement algorithm a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerKind {
    Plain,
    Contextual,
}

impl ReplacerKind {
    /// Contextual replacement is needed for whole-word matching, for any
    /// pre/post context, and whenever the search text carries word links.
    pub fn for_command(command: &EditCommand, word_link_char: char) -> Self {
        if command.tags.whole_word
            || !command.pre_text.is_empty()
            || !command.post_text.is_empty()
            || command.search_text.contains(word_link_char)
        {
            ReplacerKind::Contextual
        } else {
            ReplacerKind::Plain
        }
    }
}

/// Applicability checks for one command against one book.
pub struct CommandFilter<'a> {
    book: &'a str,
    command: &'a EditCommand,
}

impl<'a> CommandFilter<'a> {
    pub fn new(book: &'a str, command: &'a EditCommand) -> Self {
        Self { book, command }
    }

    pub fn scope(&self) -> CommandScope {
        let cmd = self.command;
        if cmd.exclude_books.contains(self.book)
            || (!cmd.include_books.is_empty() && !cmd.include_books.contains(self.book))
        {
            CommandScope::SkipBook
        } else if cmd.has_line_filters() {
            CommandScope::ByLine
        } else {
            CommandScope::WholeText
        }
    }

    pub fn check_line(&self, line: &LineRef) -> LineDecision {
        let cmd = self.command;
        if let Some(marker) = line.effective_marker.as_deref() {
            if cmd.exclude_markers.contains(marker) {
                return LineDecision::PassThrough(SkipReason::ExcludedMarker);
            }
            if !cmd.include_markers.is_empty() && !cmd.include_markers.contains(marker) {
                return LineDecision::PassThrough(SkipReason::NotIncludedMarker);
            }
        }

        let cv_ref = line.cv_ref();
        let bcv_ref = line.bcv_ref(self.book);
        if cmd.exclude_refs.contains(&cv_ref) {
            return LineDecision::PassThrough(SkipReason::ExcludedRef);
        }
        if cmd.exclude_refs.contains(&bcv_ref) {
            return LineDecision::PassThrough(SkipReason::ExcludedBookRef);
        }
        if !cmd.include_refs.is_empty()
            && !cmd.include_refs.contains(&cv_ref)
            && !cmd.include_refs.contains(&bcv_ref)
        {
            return LineDecision::PassThrough(SkipReason::NotIncludedRef);
        }

        LineDecision::Transform {
            location: line.location(self.book),
        }
    }
}
