use std::fmt;

use groupin_types::models::ParticipantId;

use crate::encrypt::{CipherError, open, seal};

/// Shown to a viewer who is not among a message's recipients.
pub const REDACTED_PLACEHOLDER: &str = "Encrypted Text";

/// Shown when a message was addressed to the viewer but could not be
/// decrypted (corrupt ciphertext, different key).
pub const UNDECODABLE_MARKER: &str = "Undecodable Text";

/// Separates a ciphertext from its recipient tag.
pub const TAG_SEPARATOR: char = '#';

/// Separates the cipher segments of a multi-recipient body.
pub const SEGMENT_SEPARATOR: &str = "\n";

/// What one viewer can read of an encrypted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Plain(String),
    Redacted,
    Undecodable,
}

impl Reading {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) => text,
            Self::Redacted => REDACTED_PLACEHOLDER,
            Self::Undecodable => UNDECODABLE_MARKER,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Encrypt `body` once per recipient, in the order given, and tag each
/// ciphertext as `<ciphertext>#<id>`. Segments are joined with a newline.
///
/// Every segment is an independent encryption of the same body. An empty
/// recipient list yields an empty string.
pub fn encrypt_for(
    body: &str,
    recipients: &[ParticipantId],
    key: &[u8; 32],
) -> Result<String, CipherError> {
    let segments = recipients
        .iter()
        .map(|recipient| seal(key, body).map(|ciphertext| format!("{ciphertext}{TAG_SEPARATOR}{recipient}")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(segments.join(SEGMENT_SEPARATOR))
}

/// Decide what `viewer` sees of an encrypted envelope body.
///
/// The body is split on `#`. The text before the first `#` is the only
/// ciphertext ever attempted; the later fields are read as recipient tags
/// by their leading digits, so `"7\n<next ciphertext>"` reads as tag 7.
/// All segments share one key, so any listed recipient can open the first.
///
/// Never fails: a viewer outside the tags gets [`Reading::Redacted`] and a
/// ciphertext that does not open gets [`Reading::Undecodable`].
pub fn decrypt_for(envelope_body: &str, viewer: ParticipantId, key: &[u8; 32]) -> Reading {
    let mut fields = envelope_body.split(TAG_SEPARATOR);
    let ciphertext = fields.next().unwrap_or_default().trim();
    let tag_fields: Vec<&str> = fields.collect();

    let tags: Vec<ParticipantId> = tag_fields.iter().filter_map(|field| leading_id(field)).collect();
    let viewer_text = viewer.to_string();
    let first_tag_exact = tag_fields.first().is_some_and(|field| *field == viewer_text);

    if !tags.contains(&viewer) && !first_tag_exact {
        return Reading::Redacted;
    }

    match open(key, ciphertext) {
        Ok(plaintext) => Reading::Plain(plaintext),
        Err(_) => Reading::Undecodable,
    }
}

/// Integer prefix of a trimmed tag field: `" 12\nabc"` is 12, `"x1"` is nothing.
fn leading_id(field: &str) -> Option<ParticipantId> {
    let field = field.trim();
    let digits = field.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    field[..digits].parse().ok()
}
