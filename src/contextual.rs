//! Pattern-based replacement with context constraints and word-link ids.
//!
//! Word-link ids are the digit runs that follow the word-link marker (`¦` by
//! default) and tie a word to an external record, e.g. `said¦10432`. When the
//! search text contains markers, the ids found in each match are carried over
//! into the markers of the replacement, so `the¦ word¦ → a¦ term¦` turns
//! `the¦5 word¦7` into `a¦5 term¦7`. Words are never reordered.

use crate::chunk::Outcome;
use crate::command::EditCommand;
use crate::config::EngineOptions;
use crate::errors::{Error, Result};
use crate::patterns::SearchPattern;

/// Replaces every match of `pattern` in `text` with the command's replacement.
///
/// Fails only for word-link replacements whose ids can't be placed
/// unambiguously; the caller decides what to do with the text then.
pub fn replace_contextual(
    location: &str,
    text: &str,
    command: &EditCommand,
    pattern: &SearchPattern,
    options: &EngineOptions,
) -> Result<Outcome> {
    if pattern.has_word_links() {
        return replace_linked(location, text, command, pattern, options);
    }

    let replacement = flagged(&command.replace_text, options);
    let (mut adjusted, count) = substitute_all(text, pattern, &replacement);
    if count == 0 {
        return Ok(Outcome::unchanged(text));
    }
    tracing::info!(
        "Replaced {count} instance(s) of {:?} with {:?} in {location}",
        command.search_text,
        command.replace_text
    );

    let mut outcome = Outcome {
        text: String::new(),
        full: count,
        short: 0,
        aborted: false,
    };
    if command.tags.repeat {
        let mut last_count = pattern.count(&adjusted);
        while last_count > 0 {
            let (next, count) = substitute_all(&adjusted, pattern, &replacement);
            adjusted = next;
            outcome.full += count;
            let new_count = pattern.count(&adjusted);
            if new_count >= last_count {
                tracing::error!(
                    "ABORTED endless loop replacing {:?} with {:?} in {location}",
                    command.search_text,
                    command.replace_text
                );
                outcome.aborted = true;
                break;
            }
            last_count = new_count;
        }
    }

    outcome.text = adjusted;
    Ok(outcome)
}

/// One global pass: every match is found in `text` as it was before the pass.
fn substitute_all(text: &str, pattern: &SearchPattern, replacement: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;
    while let Some(range) = pattern.find_at(text, last) {
        out.push_str(&text[last..range.start]);
        out.push_str(replacement);
        last = range.end;
        count += 1;
    }
    out.push_str(&text[last..]);
    (out, count)
}

/// Scans left to right, splicing a replacement with the match's own ids into
/// the text and continuing after the inserted text.
fn replace_linked(
    location: &str,
    text: &str,
    command: &EditCommand,
    pattern: &SearchPattern,
    options: &EngineOptions,
) -> Result<Outcome> {
    let marker = options.word_link_char;
    let mut adjusted = text.to_string();
    let mut cursor = 0;
    let mut count = 0;

    while let Some(range) = pattern.find_at(&adjusted, cursor) {
        let matched = &adjusted[range.clone()];
        let literal = link_replacement(&command.search_text, &command.replace_text, matched, marker)
            .map_err(|reason| Error::UnsupportedWordLink {
                command: format!("{} at {location}", command.label()),
                reason,
            })?;
        let literal = flagged(&literal, options);
        tracing::trace!("{location}: {matched:?} -> {literal:?}");
        adjusted.replace_range(range.clone(), &literal);
        cursor = range.start + literal.len();
        count += 1;
    }

    if count > 0 {
        tracing::info!(
            "Replaced {count} linked instance(s) of {:?} in {location}",
            command.search_text
        );
    }
    Ok(Outcome {
        text: adjusted,
        full: count,
        short: 0,
        aborted: false,
    })
}

/// Computes the literal replacement for one matched span.
fn link_replacement(
    search: &str,
    template: &str,
    matched: &str,
    marker: char,
) -> std::result::Result<String, String> {
    let ids = link_ids(matched, marker);
    if !template.contains(marker) {
        return Err(format!(
            "the match {matched:?} carries word-link ids but the replacement has no '{marker}' to put them in"
        ));
    }
    let Some(&first) = ids.first() else {
        return Ok(template.to_string());
    };

    if ids.iter().all(|id| *id == first) {
        return Ok(fill_links(template, marker, first));
    }

    // Different ids: pair the words up by position
    let search_words: Vec<&str> = search.split(' ').collect();
    let template_words: Vec<&str> = template.split(' ').collect();
    let matched_words: Vec<&str> = matched.split(' ').collect();
    if search_words.len() != template_words.len() || template_words.len() != matched_words.len() {
        return Err(format!(
            "differing ids need equal word counts, got {} search, {} replacement and {} matched words",
            search_words.len(),
            template_words.len(),
            matched_words.len()
        ));
    }

    let mut words = Vec::with_capacity(template_words.len());
    for (template_word, matched_word) in template_words.iter().zip(&matched_words) {
        if !template_word.contains(marker) {
            words.push(template_word.to_string());
            continue;
        }
        let Some(&id) = link_ids(matched_word, marker).first() else {
            return Err(format!(
                "replacement word {template_word:?} has a '{marker}' but {matched_word:?} has no id"
            ));
        };
        words.push(fill_links(template_word, marker, id));
    }
    Ok(words.join(" "))
}

/// The digit runs following each marker in `text`, in order.
fn link_ids(text: &str, marker: char) -> Vec<&str> {
    text.match_indices(marker)
        .map(|(ix, m)| {
            let rest = &text[ix + m.len()..];
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            &rest[..digits]
        })
        .filter(|id| !id.is_empty())
        .collect()
}

/// Writes `id` after every marker in `template`, dropping placeholder digits.
fn fill_links(template: &str, marker: char, id: &str) -> String {
    let mut out = String::with_capacity(template.len() + id.len());
    for (i, piece) in template.split(marker).enumerate() {
        if i > 0 {
            out.push(marker);
            out.push_str(id);
            out.push_str(piece.trim_start_matches(|c: char| c.is_ascii_digit()));
        } else {
            out.push_str(piece);
        }
    }
    out
}

fn flagged(replacement: &str, options: &EngineOptions) -> String {
    if options.flag_replacements {
        format!("Rx-{replacement}-Rx")
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(command: &EditCommand, text: &str) -> Result<Outcome> {
        let options = EngineOptions::default();
        let pattern = SearchPattern::build(command, options.word_link_char).unwrap();
        replace_contextual("TST", text, command, &pattern, &options)
    }

    #[test]
    fn test_whole_word_leaves_longer_words() {
        let cmd = EditCommand::new("w", "cat", "dog");
        let out = run(&cmd, "The cat sat in a category, cat_like cat.").unwrap();
        assert_eq!(out.text, "The dog sat in a category, cat_like dog.");
        assert_eq!(out.full, 2);
    }

    #[test]
    fn test_underscore_joined_compound() {
        let cmd = EditCommand::new("w", "Lord", "Master");
        let out = run(&cmd, "the_Lord said").unwrap();
        assert_eq!(out.text, "the_Master said");
    }

    #[test]
    fn test_replacement_is_literal() {
        let cmd = EditCommand::new("w", "cost", "$1 \\nd");
        let out = run(&cmd, "the cost").unwrap();
        assert_eq!(out.text, "the $1 \\nd");
    }

    #[test]
    fn test_flagged_replacements() {
        let cmd = EditCommand::new("w", "cat", "dog");
        let options = EngineOptions {
            flag_replacements: true,
            ..Default::default()
        };
        let pattern = SearchPattern::build(&cmd, '¦').unwrap();
        let out = replace_contextual("TST", "a cat", &cmd, &pattern, &options).unwrap();
        assert_eq!(out.text, "a Rx-dog-Rx");
    }

    #[test]
    fn test_loop_guard() {
        let cmd = EditCommand::new("wl", "a", "a a");
        let out = run(&cmd, "x a y").unwrap();
        assert!(out.aborted);
    }

    #[test]
    fn test_loop_until_gone() {
        let mut cmd = EditCommand::new("l", "ab", "b");
        cmd.pre_text = "<=a".into();
        let out = run(&cmd, "aaab").unwrap();
        assert_eq!(out.text, "ab");
        assert!(!out.aborted);
    }

    #[test]
    fn test_single_word_link() {
        let cmd = EditCommand::new("w", "said¦", "spoke¦");
        let out = run(&cmd, "he said¦10432 that she said¦77").unwrap();
        assert_eq!(out.text, "he spoke¦10432 that she spoke¦77");
        assert_eq!(out.full, 2);
    }

    #[test]
    fn test_shared_word_link_id() {
        let cmd = EditCommand::new("", "Holy¦ Spirit¦", "Holy¦ Ghost¦");
        let out = run(&cmd, "the Holy¦12 Spirit¦12 came").unwrap();
        assert_eq!(out.text, "the Holy¦12 Ghost¦12 came");
    }

    #[test]
    fn test_differing_ids_keep_their_positions() {
        let cmd = EditCommand::new("w", "the¦1 word¦2", "a¦1 x¦2");
        let out = run(&cmd, "in the¦5 word¦7 here").unwrap();
        assert_eq!(out.text, "in a¦5 x¦7 here");
    }

    #[test]
    fn test_one_id_spread_over_phrase() {
        let cmd = EditCommand::new("", "begat¦", "became the father of¦");
        let out = run(&cmd, "Abraham begat¦301 Isaac").unwrap();
        assert_eq!(out.text, "Abraham became the father of¦301 Isaac");
    }

    #[test]
    fn test_replacement_without_marker_fails() {
        let cmd = EditCommand::new("w", "said¦", "spoke");
        let err = run(&cmd, "he said¦1").unwrap_err();
        assert!(matches!(err, Error::UnsupportedWordLink { .. }));
    }

    #[test]
    fn test_differing_ids_with_mismatched_word_counts_fail() {
        let cmd = EditCommand::new("", "the¦ word¦", "a¦ new x¦");
        let err = run(&cmd, "the¦5 word¦7").unwrap_err();
        assert!(err.to_string().contains("word counts"));
    }

    #[test]
    fn test_replacement_text_containing_search_is_not_rescanned() {
        let cmd = EditCommand::new("w", "said¦", "said¦ again¦");
        let out = run(&cmd, "said¦3 said¦4").unwrap();
        assert_eq!(out.text, "said¦3 again¦3 said¦4 again¦4");
    }
}
