//! Literal substring replacement.
//!
//! Besides the plain global replace this handles the two tag-driven policies:
//! `l` repeats the replace until the search text is gone (guarded against
//! replacements that keep reintroducing it), and `d` alternates a long and a
//! short replacement form so that a frequently-recurring name is only spelled
//! out in full every so often.

use crate::command::EditCommand;
use crate::config::EngineOptions;
use once_cell::sync::Lazy;
use regex::Regex;

static ADD_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\add .+?\\add\*").expect("static pattern is valid"));

/// The result of running one replacer over one chunk of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub text: String,
    /// Replacements made with the full replacement text.
    pub full: usize,
    /// Replacements made with the short form (distance attenuation only).
    pub short: usize,
    /// `true` if a runaway loop was detected and stopped.
    pub aborted: bool,
}

impl Outcome {
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            full: 0,
            short: 0,
            aborted: false,
        }
    }

    pub fn replacements(&self) -> usize {
        self.full + self.short
    }
}

/// Derives the short form of a distance-attenuated replacement.
///
/// `"Jesus/Yeshua"` shortens to `"Jesus"`; `"Jesus \add Christ\add*"` shortens
/// to `"Jesus "`. Returns `None` if the replacement follows neither convention.
pub fn short_form(replace_text: &str) -> Option<String> {
    if let Some((short, _)) = replace_text.split_once('/') {
        Some(short.to_string())
    } else if replace_text.contains("\\add ") {
        Some(ADD_SPAN.replace_all(replace_text, "").into_owned())
    } else {
        None
    }
}

/// Replaces every literal occurrence of the command's search text in `text`.
///
/// `location` only feeds the log messages.
pub fn replace_chunk(
    location: &str,
    text: &str,
    command: &EditCommand,
    options: &EngineOptions,
) -> Outcome {
    let search = command.search_text.as_str();
    let replace = command.replace_text.as_str();

    let source_count = text.matches(search).count();
    if source_count == 0 {
        tracing::trace!("No instances of {search:?} in {location}");
        return Outcome::unchanged(text);
    }
    tracing::info!(
        "About to {}replace {source_count} instance(s) of {search:?} with {replace:?} in {location}",
        if command.tags.repeat { "loop " } else { "" }
    );

    if command.tags.distance
        && !command.tags.repeat
        && source_count > 1
        && text.chars().count() > options.distance
    {
        // Commands are validated before they run, so a short form is always available here
        if let Some(short) = short_form(replace) {
            return replace_distanced(location, text, search, replace, &short, options.distance);
        }
    }

    let mut adjusted = text.replace(search, replace);
    let mut outcome = Outcome {
        text: String::new(),
        full: source_count,
        short: 0,
        aborted: false,
    };

    if command.tags.repeat {
        let mut last_count = adjusted.matches(search).count();
        while last_count > 0 {
            adjusted = adjusted.replace(search, replace);
            outcome.full += last_count;
            let new_count = adjusted.matches(search).count();
            if new_count >= last_count {
                tracing::error!(
                    "ABORTED endless loop replacing {search:?} with {replace:?} in {location}"
                );
                outcome.aborted = true;
                break;
            }
            last_count = new_count;
        }
    }

    outcome.text = adjusted;
    outcome
}

/// Applies the long form at the first occurrence and again whenever an
/// occurrence is at least `distance` characters past the last long one; every
/// other occurrence gets the short form.
fn replace_distanced(
    location: &str,
    text: &str,
    search: &str,
    long: &str,
    short: &str,
    distance: usize,
) -> Outcome {
    // (byte offset, char offset) of every match in the original text
    let mut positions = Vec::new();
    let mut char_ix = 0;
    let mut last_byte = 0;
    for (byte_ix, _) in text.match_indices(search) {
        char_ix += text[last_byte..byte_ix].chars().count();
        last_byte = byte_ix;
        positions.push((byte_ix, char_ix));
    }

    let mut adjusted = text.to_string();
    let mut offset: isize = 0;
    let mut last_full: Option<usize> = None;
    let (mut full, mut shortened) = (0, 0);

    for (byte_ix, char_ix) in positions.iter().copied() {
        let start = (byte_ix as isize + offset) as usize;
        debug_assert!(adjusted[start..].starts_with(search));

        let use_full = last_full.is_none_or(|prev| char_ix - prev >= distance);
        let form = if use_full {
            last_full = Some(char_ix);
            full += 1;
            long
        } else {
            shortened += 1;
            short
        };
        adjusted.replace_range(start..start + search.len(), form);
        offset += form.len() as isize - search.len() as isize;
    }

    debug_assert_eq!(full + shortened, positions.len());
    tracing::info!(
        "Did {full} full and {shortened} short replaces of {search:?} in {location}"
    );
    Outcome {
        text: adjusted,
        full,
        short: shortened,
        aborted: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn options() -> EngineOptions {
        EngineOptions::default()
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` with INFO-level logging captured into a string.
    fn info_log(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_replacement_counts_logged_at_info() {
        let cmd = EditCommand::new("", "old", "new");
        let log = info_log(|| {
            replace_chunk("TST_1:1~v", "old old old", &cmd, &options());
        });
        assert!(log.contains("INFO"), "{log}");
        assert!(log.contains("replace 3 instance(s)"), "{log}");
    }

    /// Builds a `len`-char string of dots with `token` placed at each offset.
    fn place(token: &str, offsets: &[usize], len: usize) -> String {
        let mut text = String::new();
        for &offset in offsets {
            while text.len() < offset {
                text.push('.');
            }
            text.push_str(token);
        }
        while text.len() < len {
            text.push('.');
        }
        text
    }

    #[test]
    fn test_plain_replace_all() {
        let cmd = EditCommand::new("", "old", "new");
        let out = replace_chunk("MAT", "old old old", &cmd, &options());
        assert_eq!(out.text, "new new new");
        assert_eq!(out.replacements(), 3);
        assert_eq!(out.text.matches("old").count(), 0);
    }

    #[test]
    fn test_no_match_is_unchanged() {
        let cmd = EditCommand::new("", "xyz", "new");
        assert_eq!(replace_chunk("MAT", "old", &cmd, &options()), Outcome::unchanged("old"));
    }

    #[test]
    fn test_loop_resolves_overlaps() {
        let cmd = EditCommand::new("l", "  ", " ");
        let out = replace_chunk("MAT", "a        b", &cmd, &options());
        assert_eq!(out.text, "a b");
        assert!(!out.aborted);
    }

    #[test]
    fn test_loop_guard_aborts_growing_replacement() {
        let cmd = EditCommand::new("l", "a", "aa");
        let out = replace_chunk("MAT", "a b a", &cmd, &options());
        assert!(out.aborted);
        assert!(out.text.contains("aa"));
    }

    #[test]
    fn test_without_loop_tag_only_one_pass() {
        let cmd = EditCommand::new("", "  ", " ");
        let out = replace_chunk("MAT", "a    b", &cmd, &options());
        assert_eq!(out.text, "a  b");
    }

    #[test]
    fn test_short_form() {
        assert_eq!(short_form("Name/N").as_deref(), Some("Name"));
        assert_eq!(short_form("Jesus \\add Christ\\add*").as_deref(), Some("Jesus "));
        assert_eq!(short_form("\\add the\\add* Lord").as_deref(), Some(" Lord"));
        assert_eq!(short_form("Jesus"), None);
    }

    #[test]
    fn test_distance_attenuation() {
        let text = place("Name", &[0, 1000, 2600, 3000, 5200], 6000);
        let cmd = EditCommand::new("d", "Name", "Name/N");
        let out = replace_chunk("MAT", &text, &cmd, &options());

        let tokens: Vec<&str> = out.text.split('.').filter(|t| !t.is_empty()).collect();
        assert_eq!(tokens, vec!["Name/N", "Name", "Name/N", "Name", "Name/N"]);
        assert_eq!((out.full, out.short), (3, 2));
        assert_eq!(out.replacements(), 5);
    }

    #[test]
    fn test_distance_measured_from_last_full_replacement() {
        // 2400 after the first full one is still close, 2500 is not
        let text = place("Jesus", &[0, 2400, 2500, 4000], 4500);
        let cmd = EditCommand::new("d", "Jesus", "Jesus \\add Christ\\add*");
        let out = replace_chunk("MAT", &text, &cmd, &options());
        assert_eq!((out.full, out.short), (2, 2));
        assert!(out.text.starts_with("Jesus \\add Christ\\add*"));
    }

    #[test]
    fn test_distance_ignored_for_short_chunks() {
        let cmd = EditCommand::new("d", "Name", "Name/N");
        let out = replace_chunk("MAT", "Name and Name", &cmd, &options());
        assert_eq!(out.text, "Name/N and Name/N");
        assert_eq!(out.short, 0);
    }
}
