//! Kudos mention scanning.
//!
//! A kudos tag is a structured user reference immediately followed by `++`
//! or `--`:
//!
//! ```rust
//! use kudos_slack::mentions::{Direction, scan};
//!
//! let tags = scan("<@U1>++ and <@U2>-- for the release");
//! assert_eq!(tags.len(), 2);
//! assert_eq!(tags[0].user_id, "U1");
//! assert_eq!(tags[0].direction, Direction::Increment);
//! assert_eq!(tags[1].direction, Direction::Decrement);
//! ```

use regex::Regex;
use std::sync::LazyLock;

pub use kudos_ledger::Direction;

/// A user tagged for a score change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionTag {
    /// Tagged user ID.
    pub user_id: String,
    /// Requested change.
    pub direction: Direction,
}

impl MentionTag {
    /// Create a new tag.
    pub fn new(user_id: impl Into<String>, direction: Direction) -> Self {
        Self {
            user_id: user_id.into(),
            direction,
        }
    }
}

/// `<@ID>` or `<@ID|label>` directly followed by `++` or `--`.
static KUDOS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)<@(\w+)(?:\|[^>]*)?>(\+\+|--)").expect("Invalid kudos regex")
});

/// Extract kudos tags from message text, in order of appearance.
pub fn scan(text: &str) -> Vec<MentionTag> {
    KUDOS_REGEX
        .captures_iter(text)
        .map(|cap| {
            let direction = if &cap[2] == "++" {
                Direction::Increment
            } else {
                Direction::Decrement
            };
            MentionTag::new(&cap[1], direction)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inc(user: &str) -> MentionTag {
        MentionTag::new(user, Direction::Increment)
    }

    fn dec(user: &str) -> MentionTag {
        MentionTag::new(user, Direction::Decrement)
    }

    #[test]
    fn test_plain_text_has_no_tags() {
        assert!(scan("plain text").is_empty());
        assert!(scan("This is some text++").is_empty());
        assert!(scan("This is some text--").is_empty());
    }

    #[test]
    fn test_mention_without_marker() {
        assert!(scan("This is some text <@UBLKAG9K4>").is_empty());
    }

    #[test]
    fn test_single_increment() {
        assert_eq!(scan("<@U1>++"), vec![inc("U1")]);
        assert_eq!(
            scan("This is some text <@UBLKAG9K4>++"),
            vec![inc("UBLKAG9K4")]
        );
    }

    #[test]
    fn test_single_decrement() {
        assert_eq!(scan("<@U1>--"), vec![dec("U1")]);
    }

    #[test]
    fn test_multiple_increments() {
        assert_eq!(
            scan("<@U1>++ and <@U2>++."),
            vec![inc("U1"), inc("U2")]
        );
    }

    #[test]
    fn test_mixed_directions_keep_text_order() {
        assert_eq!(
            scan("<@U2>-- then <@U1>++ then <@U3>--"),
            vec![dec("U2"), inc("U1"), dec("U3")]
        );
    }

    #[test]
    fn test_unstructured_mention_ignored() {
        assert!(scan("@U1++").is_empty());
        assert!(scan("This is an invalid user @Dave--").is_empty());
    }

    #[test]
    fn test_marker_must_be_adjacent() {
        assert!(scan("<@U1> ++").is_empty());
        assert!(scan("<@U1>\n--").is_empty());
        assert!(scan("<@U1>+-").is_empty());
    }

    #[test]
    fn test_labelled_reference() {
        assert_eq!(scan("thanks <@U1|alice>++"), vec![inc("U1")]);
    }

    #[test]
    fn test_case_sensitive_ids() {
        assert_eq!(scan("<@u1>++ <@U1>++"), vec![inc("u1"), inc("U1")]);
    }

    #[test]
    fn test_multiline() {
        assert_eq!(
            scan("first line <@U1>++\nsecond line <@U2>--"),
            vec![inc("U1"), dec("U2")]
        );
    }

    #[test]
    fn test_non_overlapping() {
        // The second `++` belongs to no reference.
        assert_eq!(scan("<@U1>++++"), vec![inc("U1")]);
        assert_eq!(scan("<@U1>++<@U2>--"), vec![inc("U1"), dec("U2")]);
    }

    #[test]
    fn test_scan_is_repeatable() {
        let text = "<@U1>++ nice, <@U2>-- not nice, <@U1>++ again";
        assert_eq!(scan(text), scan(text));
        assert_eq!(scan(text).len(), 3);
    }
}
