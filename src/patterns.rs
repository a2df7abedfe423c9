//! Building the search pattern for contextual replacement.
//!
//! The search text itself is matched literally except for word-link markers,
//! each of which matches the marker followed by a 1-6 digit id. Anything that
//! looks at the surrounding text (pre/post context, whole-word boundaries) is
//! checked against the haystack around a candidate match instead of being
//! compiled into the pattern, so context is never consumed.

use crate::command::EditCommand;
use crate::errors::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b").expect("static pattern is valid"));

/// A pre- or post-context constraint.
#[derive(Debug, Clone)]
struct Context {
    regex: Regex,
    negated: bool,
}

impl Context {
    /// Pre-context is written `<=frag` (must be preceded by) or `<!frag`
    /// (must not be preceded by); a bare fragment is a positive constraint.
    fn leading(written: &str) -> std::result::Result<Self, regex::Error> {
        let (fragment, negated) = if let Some(f) = written.strip_prefix("<!") {
            (f, true)
        } else {
            (written.strip_prefix("<=").unwrap_or(written), false)
        };
        Ok(Self {
            regex: Regex::new(&format!("(?:{fragment})$"))?,
            negated,
        })
    }

    /// Post-context is written `=frag` or `!frag`.
    fn trailing(written: &str) -> std::result::Result<Self, regex::Error> {
        let (fragment, negated) = if let Some(f) = written.strip_prefix('!') {
            (f, true)
        } else {
            (written.strip_prefix('=').unwrap_or(written), false)
        };
        Ok(Self {
            regex: Regex::new(&format!("^(?:{fragment})"))?,
            negated,
        })
    }

    fn holds(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack) != self.negated
    }
}

/// The compiled search side of a contextual command.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    core: Regex,
    pre: Option<Context>,
    post: Option<Context>,
    whole_word: bool,
    word_links: bool,
}

impl SearchPattern {
    pub fn build(command: &EditCommand, word_link_char: char) -> Result<Self> {
        let core = Regex::new(&core_pattern(&command.search_text, word_link_char))?;
        let pre = (!command.pre_text.is_empty())
            .then(|| Context::leading(&command.pre_text))
            .transpose()
            .map_err(|e| command.invalid(format!("bad pre-text: {e}")))?;
        let post = (!command.post_text.is_empty())
            .then(|| Context::trailing(&command.post_text))
            .transpose()
            .map_err(|e| command.invalid(format!("bad post-text: {e}")))?;

        Ok(Self {
            core,
            pre,
            post,
            whole_word: command.tags.whole_word,
            word_links: command.search_text.contains(word_link_char),
        })
    }

    /// `true` if the search text carries word-link markers.
    pub fn has_word_links(&self) -> bool {
        self.word_links
    }

    pub fn as_str(&self) -> &str {
        self.core.as_str()
    }

    /// Finds the first match starting at or after `from` whose surroundings
    /// satisfy the context and word-boundary rules.
    ///
    /// A rejected word-link match is retried with shorter id digit runs at the
    /// same start, so `said¦` followed by `=0` finds `said¦12` in `said¦120`.
    pub fn find_at(&self, text: &str, mut from: usize) -> Option<Range<usize>> {
        while from <= text.len() {
            let m = self.core.find_at(text, from)?;
            let start = m.start();
            let mut end = Some(m.end());
            while let Some(e) = end {
                if self.accepts(text, start, e) {
                    return Some(start..e);
                }
                end = if self.word_links { self.shorter_match(text, start, e) } else { None };
            }
            from = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }

    /// The end of the longest match starting at `start` that ends before `end`.
    fn shorter_match(&self, text: &str, start: usize, end: usize) -> Option<usize> {
        let last = text[start..end].chars().next_back()?;
        let m = self.core.find_at(&text[..end - last.len_utf8()], start)?;
        (m.start() == start).then(|| m.end())
    }

    /// Counts the non-overlapping matches in `text`.
    pub fn count(&self, text: &str) -> usize {
        let mut count = 0;
        let mut from = 0;
        while let Some(range) = self.find_at(text, from) {
            count += 1;
            from = range.end;
        }
        count
    }

    fn accepts(&self, text: &str, start: usize, end: usize) -> bool {
        let leading = match &self.pre {
            Some(pre) => pre.holds(&text[..start]),
            // After a word break, or after an underscore joining compound words
            None if self.whole_word => {
                is_word_boundary(text, start) || text[..start].ends_with('_')
            }
            None => true,
        };
        let trailing = match &self.post {
            Some(post) => post.holds(&text[end..]),
            None if self.whole_word => is_word_boundary(text, end),
            None => true,
        };
        leading && trailing
    }
}

/// Escapes `search` for literal matching, expanding every word-link marker
/// (and any placeholder digits after it) to the marker plus a 1-6 digit id.
fn core_pattern(search: &str, word_link_char: char) -> String {
    let marker = regex::escape(word_link_char.encode_utf8(&mut [0; 4]));
    let mut pattern = String::from("(");
    for (i, piece) in search.split(word_link_char).enumerate() {
        let piece = if i == 0 {
            piece
        } else {
            pattern.push_str(&marker);
            pattern.push_str("[0-9]{1,6}");
            piece.trim_start_matches(|c: char| c.is_ascii_digit())
        };
        pattern.push_str(&regex::escape(piece));
    }
    pattern.push(')');
    pattern
}

fn is_word_boundary(text: &str, at: usize) -> bool {
    WORD_BOUNDARY
        .find_at(text, at)
        .is_some_and(|m| m.start() == at)
}
