use crate::chunk::replace_chunk;
use crate::command::{CommandTable, EditCommand};
use crate::config::EngineOptions;
use crate::contextual::replace_contextual;
use crate::errors::Result;
use crate::filter::{CommandFilter, CommandScope, LineDecision, ReplacerKind};
use crate::patterns::SearchPattern;
use crate::reference::ReferenceTracker;

/// A validated command together with everything compiled for it.
#[derive(Debug, Clone)]
pub struct PreparedCommand {
    pub command: EditCommand,
    pattern: Option<SearchPattern>,
}

impl PreparedCommand {
    /// Validates `command` and compiles its search pattern if it needs one.
    pub fn prepare(command: EditCommand, options: &EngineOptions) -> Result<Self> {
        command.validate()?;
        let pattern = match ReplacerKind::for_command(&command, options.word_link_char) {
            ReplacerKind::Contextual => Some(SearchPattern::build(&command, options.word_link_char)?),
            ReplacerKind::Plain => None,
        };
        Ok(Self { command, pattern })
    }

    pub fn kind(&self) -> ReplacerKind {
        if self.pattern.is_some() {
            ReplacerKind::Contextual
        } else {
            ReplacerKind::Plain
        }
    }
}

/// A command table whose commands have all been prepared.
#[derive(Debug, Clone)]
pub struct PreparedTable {
    pub name: String,
    pub commands: Vec<PreparedCommand>,
}

/// Applies ordered command tables to documents.
///
/// An `Editor` is built once per run. All validation and pattern compilation
/// happens in [`Editor::new`]; after that it is read-only and can be shared
/// between threads that each transform their own document.
#[derive(Debug, Clone)]
pub struct Editor {
    tables: Vec<PreparedTable>,
    options: EngineOptions,
}

impl Editor {
    /// Prepares every command of every table, failing on the first command
    /// that breaks an authoring rule.
    pub fn new(tables: Vec<CommandTable>, options: EngineOptions) -> Result<Self> {
        let tables = tables
            .into_iter()
            .map(|table| {
                let commands = table
                    .commands
                    .into_iter()
                    .map(|command| PreparedCommand::prepare(command, &options))
                    .collect::<Result<Vec<_>>>()?;
                Ok(PreparedTable {
                    name: table.name,
                    commands,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { tables, options })
    }

    pub fn tables(&self) -> &[PreparedTable] {
        &self.tables
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Applies all tables, in order, to one document.
    pub fn apply(&self, book: &str, text: &str) -> String {
        self.tables.iter().fold(text.to_string(), |current, table| {
            tracing::info!("Applying '{}' to {book}", table.name);
            self.apply_table(book, &current, table)
        })
    }

    /// Applies one table's commands, in order, to one document.
    pub fn apply_table(&self, book: &str, text: &str, table: &PreparedTable) -> String {
        table
            .commands
            .iter()
            .fold(text.to_string(), |current, command| {
                self.apply_command(book, &current, command)
            })
    }

    /// Applies a single command to one document.
    pub fn apply_command(&self, book: &str, text: &str, prepared: &PreparedCommand) -> String {
        let filter = CommandFilter::new(book, &prepared.command);
        match filter.scope() {
            CommandScope::SkipBook => {
                tracing::debug!("Skipping '{book}' book for {}", prepared.command.label());
                text.to_string()
            }
            CommandScope::WholeText => self.replace(book, text, prepared),
            CommandScope::ByLine => {
                let mut tracker = ReferenceTracker::new();
                let lines: Vec<String> = text
                    .split('\n')
                    .map(|line| {
                        let Some(line_ref) = tracker.advance(line) else {
                            return line.to_string();
                        };
                        match filter.check_line(&line_ref) {
                            LineDecision::Transform { location } => {
                                self.replace(&location, line, prepared)
                            }
                            LineDecision::PassThrough(reason) => {
                                tracing::trace!(
                                    "Passing {} through: {reason:?}",
                                    line_ref.location(book)
                                );
                                line.to_string()
                            }
                        }
                    })
                    .collect();
                lines.join("\n")
            }
        }
    }

    /// Runs the command's replacer over one chunk. Unsupported word-link
    /// shapes are logged and leave the chunk as it was.
    fn replace(&self, location: &str, chunk: &str, prepared: &PreparedCommand) -> String {
        match &prepared.pattern {
            None => replace_chunk(location, chunk, &prepared.command, &self.options).text,
            Some(pattern) => {
                match replace_contextual(location, chunk, &prepared.command, pattern, &self.options)
                {
                    Ok(outcome) => outcome.text,
                    Err(e) => {
                        tracing::error!("{e}; leaving {location} unchanged");
                        chunk.to_string()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    fn editor(commands: Vec<EditCommand>) -> Editor {
        Editor::new(vec![CommandTable::new("test", commands)], EngineOptions::default()).unwrap()
    }

    const DOC: &str = "\\id MAT\n\\c 1\n\\s1 The text heading\n\\v 1 Some text.\n\\v 2 Other text.\n";

    #[test]
    fn test_unstructured_command_touches_whole_text() {
        let ed = editor(vec![EditCommand::new("", "text", "words")]);
        let out = ed.apply("MAT", DOC);
        assert_eq!(out.matches("words").count(), 3);
        assert!(!out.contains("text"));
    }

    #[test]
    fn test_excluded_book_is_skipped() {
        let mut cmd = EditCommand::new("", "text", "words");
        cmd.exclude_books.insert("MAT".into());
        let ed = editor(vec![cmd]);
        assert_eq!(ed.apply("MAT", DOC), DOC);
        assert_ne!(ed.apply("MRK", DOC), DOC);
    }

    #[test]
    fn test_excluded_marker() {
        let mut cmd = EditCommand::new("w", "text", "words");
        cmd.exclude_markers.insert("s1".into());
        let out = editor(vec![cmd]).apply("MAT", DOC);
        assert!(out.contains("\\s1 The text heading"));
        assert!(out.contains("\\v 1 Some words."));
        assert!(out.contains("\\v 2 Other words."));
    }

    #[test]
    fn test_excluded_reference() {
        let mut cmd = EditCommand::new("w", "text", "words");
        cmd.exclude_refs.insert("1:2".into());
        let out = editor(vec![cmd]).apply("MAT", DOC);
        assert!(out.contains("\\v 1 Some words."));
        assert!(out.contains("\\v 2 Other text."));
    }

    #[test]
    fn test_line_mode_keeps_blank_lines_and_trailing_newline() {
        let doc = "\\c 1\n\n\\v 1 text\n";
        let mut cmd = EditCommand::new("", "text", "words");
        cmd.include_markers.insert("v".into());
        assert_eq!(editor(vec![cmd]).apply("MAT", doc), "\\c 1\n\n\\v 1 words\n");
    }

    #[test]
    fn test_header_pseudo_verse_reference() {
        let doc = "\\id MAT Draft\n\\h Matthew\n\\c 1\n\\v 1 Matthew wrote\n";
        let mut cmd = EditCommand::new("", "Matthew", "Mattityahu");
        cmd.include_refs.insert("MAT_-1:1".into());
        let out = editor(vec![cmd]).apply("MAT", doc);
        assert_eq!(out, "\\id MAT Draft\n\\h Mattityahu\n\\c 1\n\\v 1 Matthew wrote\n");
    }

    #[test]
    fn test_commands_and_tables_apply_in_order() {
        let tables = vec![
            CommandTable::new(
                "first",
                vec![EditCommand::new("", "a", "b"), EditCommand::new("", "b", "c")],
            ),
            CommandTable::new("second", vec![EditCommand::new("", "c", "d")]),
        ];
        let ed = Editor::new(tables, EngineOptions::default()).unwrap();
        assert_eq!(ed.apply("GEN", "a"), "d");
        assert_eq!(ed.apply_table("GEN", "a", &ed.tables()[0]), "c");
    }

    #[test]
    fn test_invalid_command_fails_preparation() {
        let result = Editor::new(
            vec![CommandTable::new("bad", vec![EditCommand::new("d", "Jesus", "Yeshua")])],
            EngineOptions::default(),
        );
        assert!(matches!(result, Err(Error::InvalidCommand { .. })));
    }

    #[test]
    fn test_unsupported_word_link_passes_line_through() {
        let doc = "\\v 1 he said¦1 this\n\\v 2 he said¦2 that\n";
        let mut cmd = EditCommand::new("w", "said¦", "spoke");
        cmd.include_markers.insert("v".into());
        let ed = editor(vec![cmd, EditCommand::new("", "this", "these")]);
        assert_eq!(ed.apply("JHN", doc), "\\v 1 he said¦1 these\n\\v 2 he said¦2 that\n");
    }

    #[test]
    fn test_prepared_kind() {
        let opts = EngineOptions::default();
        let plain = PreparedCommand::prepare(EditCommand::new("l", "a", "b"), &opts).unwrap();
        let ctx = PreparedCommand::prepare(EditCommand::new("w", "a", "b"), &opts).unwrap();
        assert_eq!(plain.kind(), ReplacerKind::Plain);
        assert_eq!(ctx.kind(), ReplacerKind::Contextual);
    }

    #[test]
    fn test_editor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Editor>();
    }
}
