//! Response-line parsing: one line of model output → `(term, definition)`.
//!
//! The model is asked for `term, definition` but answers drift between
//! `term: definition`, `term - definition` and the requested comma form. The
//! ladder below tries the narrow delimiters first, because definitions often
//! contain commas:
//!
//! 1. first `:`
//! 2. first `" - "` (space, hyphen, space)
//! 3. first `,`
//!
//! Anything else (a bare "none", a blank line, prose) yields `None`, which
//! callers treat as "skip this line". The ladder is a heuristic; keep the
//! order and the first-occurrence splitting exactly as they are.

/// A trimmed term/definition pair taken from one response line.
///
/// Either side may be empty (e.g. `"Phishing:"`); the accumulator decides
/// what to do with such partial candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub term: String,
    pub definition: String,
}

impl Candidate {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

/// Split one response line into a candidate, or `None` if no delimiter applies.
pub fn parse_line(line: &str) -> Option<Candidate> {
    let (term, definition) = line
        .split_once(':')
        .or_else(|| line.split_once(" - "))
        .or_else(|| line.split_once(','))?;
    Some(Candidate::new(term.trim(), definition.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> (String, String) {
        let c = parse_line(line).expect("line should parse");
        (c.term, c.definition)
    }

    #[test]
    fn colon_splits_at_first_colon() {
        assert_eq!(
            parsed("Zero Trust: a model, not a product"),
            ("Zero Trust".into(), "a model, not a product".into())
        );
        assert_eq!(
            parsed("T1110: Brute Force: guessing passwords"),
            ("T1110".into(), "Brute Force: guessing passwords".into())
        );
    }

    #[test]
    fn colon_wins_over_dash_and_comma() {
        assert_eq!(
            parsed("CSPM - posture, management: continuous checks"),
            ("CSPM - posture, management".into(), "continuous checks".into())
        );
    }

    #[test]
    fn spaced_dash_used_without_colon() {
        assert_eq!(
            parsed("Least Privilege - restricting access to minimum needed"),
            (
                "Least Privilege".into(),
                "restricting access to minimum needed".into()
            )
        );
    }

    #[test]
    fn dash_wins_over_comma() {
        assert_eq!(
            parsed("IAM - identity, access management"),
            ("IAM".into(), "identity, access management".into())
        );
    }

    #[test]
    fn unspaced_hyphen_is_not_a_delimiter() {
        assert_eq!(parse_line("Multi-factor"), None);
        assert_eq!(
            parsed("Multi-factor, two or more proofs of identity"),
            ("Multi-factor".into(), "two or more proofs of identity".into())
        );
    }

    #[test]
    fn comma_splits_at_first_comma() {
        assert_eq!(
            parsed("Phishing,deceptive technique to harvest credentials"),
            (
                "Phishing".into(),
                "deceptive technique to harvest credentials".into()
            )
        );
        assert_eq!(
            parsed("CloudTrail, logs API calls, across accounts"),
            ("CloudTrail".into(), "logs API calls, across accounts".into())
        );
    }

    #[test]
    fn no_delimiter_fails() {
        assert_eq!(parse_line("none"), None);
        assert_eq!(parse_line("None"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("Just some prose without delimiters"), None);
    }

    #[test]
    fn empty_sides_are_kept_as_empty_strings() {
        assert_eq!(parsed("Phishing:"), ("Phishing".into(), "".into()));
        assert_eq!(parsed(": orphan definition"), ("".into(), "orphan definition".into()));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            parsed("  S3 Bucket :   object storage container  \r"),
            ("S3 Bucket".into(), "object storage container".into())
        );
    }
}
