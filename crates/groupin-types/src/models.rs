use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Short numeric token identifying one connected participant.
/// Only unique among participants connected at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u32> for ParticipantId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// One chat message as placed on the broadcast channel.
///
/// Plaintext envelopes carry the message text in `body` and no recipients.
/// Encrypted envelopes carry newline-joined `<ciphertext>#<id>` segments in
/// `body` and list every tag in `recipients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub display_name: String,
    pub body: String,
    pub sender_identity: ParticipantId,
    pub encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<ParticipantId>>,
}

impl Envelope {
    pub fn plain(
        display_name: impl Into<String>,
        sender_identity: ParticipantId,
        body: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            body: body.into(),
            sender_identity,
            encrypted: false,
            recipients: None,
        }
    }

    pub fn sealed(
        display_name: impl Into<String>,
        sender_identity: ParticipantId,
        body: impl Into<String>,
        recipients: Vec<ParticipantId>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            body: body.into(),
            sender_identity,
            encrypted: true,
            recipients: Some(recipients),
        }
    }

    /// Declared recipients. Always empty for plaintext envelopes, whatever
    /// the `recipients` field holds.
    pub fn recipients(&self) -> &[ParticipantId] {
        if !self.encrypted {
            return &[];
        }
        self.recipients.as_deref().unwrap_or(&[])
    }

    /// Whether `id` is among the declared recipients.
    pub fn is_addressed_to(&self, id: ParticipantId) -> bool {
        self.recipients().contains(&id)
    }
}
