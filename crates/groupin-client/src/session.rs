use thiserror::Error;
use tracing::{debug, info};

use groupin_crypto::{CipherError, encrypt_for};
use groupin_types::events::ServerEvent;
use groupin_types::models::{Envelope, ParticipantId};

use crate::address::{self, Composition};
use crate::timeline::Timeline;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("display name must not be blank")]
    NoName,

    #[error("no identity assigned yet")]
    NotJoined,

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// What a server event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Joined(ParticipantId),
    Members(usize),
    Appended,
}

/// One participant's local state: its name and identity, the last
/// membership snapshot, and its timeline.
pub struct Session {
    display_name: String,
    identity: Option<ParticipantId>,
    members: Vec<ParticipantId>,
    key: [u8; 32],
    timeline: Timeline,
}

impl Session {
    pub fn new(display_name: &str, key: [u8; 32]) -> Result<Self, SessionError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(SessionError::NoName);
        }
        Ok(Self {
            display_name: display_name.to_string(),
            identity: None,
            members: Vec::new(),
            key,
            timeline: Timeline::new(key),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn identity(&self) -> Option<ParticipantId> {
        self.identity
    }

    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Turn composed text into an envelope ready to publish.
    ///
    /// Returns `Ok(None)` for blank text. Tagged text is encrypted once per
    /// recipient; anything else goes out as plaintext.
    pub fn compose(&self, text: &str) -> Result<Option<Envelope>, SessionError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let sender = self.identity.ok_or(SessionError::NotJoined)?;

        let envelope = match address::parse(text) {
            Composition::Plain(body) => Envelope::plain(&self.display_name, sender, body),
            Composition::Addressed { body, recipients } => {
                debug!("Encrypting for {} recipients", recipients.len());
                let sealed = encrypt_for(&body, &recipients, &self.key)?;
                Envelope::sealed(&self.display_name, sender, sealed, recipients)
            }
        };
        Ok(Some(envelope))
    }

    pub fn handle_event(&mut self, event: ServerEvent) -> SessionUpdate {
        match event {
            ServerEvent::Ready { participant_id } => {
                info!("Joined as #{}", participant_id);
                self.identity = Some(participant_id);
                SessionUpdate::Joined(participant_id)
            }
            ServerEvent::UserIds(members) => {
                debug!("Membership: {:?}", members);
                self.members = members;
                SessionUpdate::Members(self.members.len())
            }
            ServerEvent::Message(envelope) => {
                self.timeline.append(&envelope, self.identity);
                SessionUpdate::Appended
            }
        }
    }
}
