//! Recipient tags in composed text.
//!
//! A tag is whitespace, `#`, then digits that end at a word boundary:
//! `"see you #202"` is addressed to 202. The first tag must be reachable
//! from the start of the text without crossing a line break; the text
//! before it is the message body. Later tags add recipients but never add
//! to the body, so `"a #1 and b #2"` sends `"a"` to both 1 and 2.
//!
//! Whitespace also covers U+FEFF, and the word boundary is ASCII-only, so
//! `"hi #12é"` is addressed to 12 while `"hi #12ab"` is not a tag.

use std::sync::OnceLock;

use regex::Regex;

use groupin_types::models::ParticipantId;

/// A composed message split into what gets sent and to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// No tag found: the whole text goes out unencrypted.
    Plain(String),
    /// Encrypt `body` separately for each recipient, in order.
    Addressed {
        body: String,
        recipients: Vec<ParticipantId>,
    },
}

impl Composition {
    pub fn is_addressed(&self) -> bool {
        matches!(self, Self::Addressed { .. })
    }
}

/// Body up to the first tag, which may not cross a line break.
fn first_tag() -> &'static Regex {
    static FIRST_TAG_RE: OnceLock<Regex> = OnceLock::new();
    FIRST_TAG_RE.get_or_init(|| {
        Regex::new(r"^([^\n\r\x{2028}\x{2029}]*?)[\s\x{FEFF}]+#([0-9]+)(?-u:\b)")
            .expect("valid first tag regex")
    })
}

fn later_tag() -> &'static Regex {
    static LATER_TAG_RE: OnceLock<Regex> = OnceLock::new();
    LATER_TAG_RE.get_or_init(|| {
        Regex::new(r"[\s\x{FEFF}]+#([0-9]+)(?-u:\b)").expect("valid later tag regex")
    })
}

/// Split composed text into body and recipient tags.
///
/// Tags that are not digits or run into letters (`#12ab`) are not tags;
/// text without any tag is plain. A tag too large for an identity still
/// addresses the message, to an identity nobody holds.
pub fn parse(text: &str) -> Composition {
    let Some(first) = first_tag().captures(text) else {
        return Composition::Plain(text.to_string());
    };

    let body = first[1].to_string();
    let mut recipients = vec![recipient(&first[2])];
    let rest = &text[first.get_match().end()..];
    recipients.extend(later_tag().captures_iter(rest).map(|caps| recipient(&caps[1])));

    Composition::Addressed { body, recipients }
}

/// Digits past `u32::MAX` saturate. The registry never issues `u32::MAX`,
/// so such a message stays encrypted and nobody can read it.
fn recipient(digits: &str) -> ParticipantId {
    ParticipantId(digits.parse().unwrap_or(u32::MAX))
}
