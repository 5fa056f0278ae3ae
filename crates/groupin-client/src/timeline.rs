use std::fmt;

use chrono::{DateTime, Utc};
use tracing::warn;

use groupin_crypto::selective::{self, Reading};
use groupin_types::models::{Envelope, ParticipantId};

/// One received envelope as rendered for this viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub display_name: String,
    pub sender: ParticipantId,
    pub encrypted: bool,
    pub reading: Reading,
    /// The viewer is among the envelope's declared recipients.
    pub to_you: bool,
    /// The viewer sent this envelope.
    pub from_self: bool,
    pub received_at: DateTime<Utc>,
}

impl TimelineEntry {
    pub fn text(&self) -> &str {
        self.reading.text()
    }
}

impl fmt::Display for TimelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.display_name, self.sender)?;
        if self.to_you {
            f.write_str(" - To You")?;
        }
        write!(f, " - {}", self.reading)
    }
}

/// Append-only list of entries in arrival order.
#[derive(Debug, Clone)]
pub struct Timeline {
    key: [u8; 32],
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key,
            entries: Vec::new(),
        }
    }

    /// Render `envelope` for `viewer` and append it. A viewer without an
    /// identity yet cannot read any encrypted envelope.
    pub fn append(&mut self, envelope: &Envelope, viewer: Option<ParticipantId>) -> &TimelineEntry {
        let reading = if envelope.encrypted {
            match viewer {
                Some(viewer) => selective::decrypt_for(&envelope.body, viewer, &self.key),
                None => Reading::Redacted,
            }
        } else {
            Reading::Plain(envelope.body.clone())
        };

        if reading == Reading::Undecodable {
            warn!(
                "Could not decrypt message from #{} ({})",
                envelope.sender_identity, envelope.display_name
            );
        }

        let entry = TimelineEntry {
            display_name: envelope.display_name.clone(),
            sender: envelope.sender_identity,
            encrypted: envelope.encrypted,
            reading,
            to_you: viewer.is_some_and(|v| envelope.is_addressed_to(v)),
            from_self: viewer == Some(envelope.sender_identity),
            received_at: Utc::now(),
        };
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// The entry a view should scroll to.
    pub fn latest(&self) -> Option<&TimelineEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupin_crypto::keys::generate_shared_key;
    use groupin_crypto::selective::{REDACTED_PLACEHOLDER, encrypt_for};

    const A: ParticipantId = ParticipantId(101);
    const B: ParticipantId = ParticipantId(202);
    const C: ParticipantId = ParticipantId(303);

    fn sealed(key: &[u8; 32], text: &str, to: &[ParticipantId]) -> Envelope {
        Envelope::sealed("ana", A, encrypt_for(text, to, key).unwrap(), to.to_vec())
    }

    #[test]
    fn entries_keep_arrival_order_across_kinds() {
        let key = generate_shared_key();
        let mut timeline = Timeline::new(key);

        timeline.append(&Envelope::plain("ana", A, "one"), Some(B));
        timeline.append(&sealed(&key, "two", &[B]), Some(B));
        timeline.append(&sealed(&key, "three", &[C]), Some(B));
        timeline.append(&Envelope::plain("cy", C, "four"), Some(B));

        let texts: Vec<&str> = timeline.entries().iter().map(TimelineEntry::text).collect();
        assert_eq!(texts, ["one", "two", REDACTED_PLACEHOLDER, "four"]);
        assert_eq!(timeline.latest().unwrap().text(), "four");
        assert_eq!(timeline.len(), 4);
    }

    #[test]
    fn plaintext_reads_the_same_for_everyone() {
        let key = generate_shared_key();
        let env = Envelope::plain("ana", A, "hello #world");
        for viewer in [Some(A), Some(B), None] {
            let mut timeline = Timeline::new(key);
            assert_eq!(timeline.append(&env, viewer).text(), "hello #world");
        }
    }

    #[test]
    fn marks_messages_to_the_viewer_and_from_the_viewer() {
        let key = generate_shared_key();
        let env = sealed(&key, "secret", &[B]);

        let mut b_view = Timeline::new(key);
        let entry = b_view.append(&env, Some(B));
        assert!(entry.to_you);
        assert!(!entry.from_self);
        assert_eq!(entry.to_string(), "ana (#101) - To You - secret");

        let mut a_view = Timeline::new(key);
        let entry = a_view.append(&env, Some(A));
        assert!(!entry.to_you);
        assert!(entry.from_self);
        assert_eq!(entry.to_string(), "ana (#101) - Encrypted Text");
    }

    #[test]
    fn viewer_without_identity_sees_placeholder() {
        let key = generate_shared_key();
        let mut timeline = Timeline::new(key);
        let entry = timeline.append(&sealed(&key, "secret", &[B]), None);
        assert_eq!(entry.reading, Reading::Redacted);
    }

    #[test]
    fn wrong_key_shows_decode_marker() {
        let sender_key = generate_shared_key();
        let mut timeline = Timeline::new(generate_shared_key());
        let entry = timeline.append(&sealed(&sender_key, "secret", &[B]), Some(B));
        assert_eq!(entry.reading, Reading::Undecodable);
    }
}
