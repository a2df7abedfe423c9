//! Splitting a USFM line into its leading marker and the remaining text.

/// Splits one line (without its newline) into an optional marker and text.
///
/// The marker is returned without its leading backslash. It ends at the first
/// space, asterisk or backslash after it:
///
/// - a space is dropped: `\v 12 In` gives `("v", "12 In")`
/// - an asterisk is kept with the marker: `\f*rest` gives `("f*", "rest")`
/// - a backslash followed by `*` closes the marker: `\ts\*` gives `("ts\*", "")`
/// - any other backslash starts the text, so the next marker stays intact
///
/// Lines that don't start with a backslash have no marker.
pub fn split_marker(line: &str) -> (Option<&str>, &str) {
    let Some(rest) = line.strip_prefix('\\') else {
        return (None, line);
    };

    let Some(ix) = rest.find([' ', '*', '\\']) else {
        // The line is only the marker
        return (Some(rest), "");
    };

    match rest.as_bytes()[ix] {
        b'\\' if rest[ix + 1..].starts_with('*') => (Some(&rest[..ix + 2]), &rest[ix + 2..]),
        b'\\' => (Some(&rest[..ix]), &rest[ix..]),
        b'*' => (Some(&rest[..ix + 1]), &rest[ix + 1..]),
        _ => (Some(&rest[..ix]), &rest[ix + 1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", None, "")]
    #[case("plain text", None, "plain text")]
    #[case("\\v 12 In the beginning", Some("v"), "12 In the beginning")]
    #[case("\\ts\\*", Some("ts\\*"), "")]
    #[case("\\p", Some("p"), "")]
    #[case("\\f*rest", Some("f*"), "rest")]
    #[case("\\q1\\v 3 text", Some("q1"), "\\v 3 text")]
    #[case("\\c 1", Some("c"), "1")]
    #[case("\\s1  Two spaces", Some("s1"), " Two spaces")]
    fn test_split_marker(#[case] line: &str, #[case] marker: Option<&str>, #[case] text: &str) {
        assert_eq!(split_marker(line), (marker, text));
    }

    #[test]
    fn test_non_ascii_text_after_marker() {
        assert_eq!(split_marker("\\v 1 Ἐν ἀρχῇ"), (Some("v"), "1 Ἐν ἀρχῇ"));
    }
}
