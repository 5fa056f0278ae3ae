use serde::{Deserialize, Serialize};

use crate::models::{Envelope, ParticipantId};

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    /// Identity assigned to this connection. Sent only to the joiner.
    #[serde(rename = "ready", rename_all = "camelCase")]
    Ready { participant_id: ParticipantId },

    /// Full membership snapshot, sent to everyone on every join and leave.
    /// Receivers replace their copy; it is never a delta.
    #[serde(rename = "userIds")]
    UserIds(Vec<ParticipantId>),

    /// An envelope republished verbatim to every participant, sender included.
    #[serde(rename = "message")]
    Message(Envelope),
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientCommand {
    /// Publish an envelope to the channel
    #[serde(rename = "message")]
    Message(Envelope),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_ids_event_shape() {
        let event = ServerEvent::UserIds(vec![ParticipantId(101), ParticipantId(202)]);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "userIds", "data": [101, 202] })
        );
    }

    #[test]
    fn ready_event_shape() {
        let event = ServerEvent::Ready { participant_id: ParticipantId(7) };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "ready", "data": { "participantId": 7 } })
        );
    }

    #[test]
    fn client_message_parses() {
        let raw = r#"{"type":"message","data":{"displayName":"c","body":"yo","senderIdentity":303,"encrypted":false}}"#;
        let cmd: ClientCommand = serde_json::from_str(raw).unwrap();
        let ClientCommand::Message(env) = cmd;
        assert_eq!(env.sender_identity, ParticipantId(303));
        assert_eq!(env.body, "yo");
    }

    #[test]
    fn unknown_command_is_rejected() {
        let raw = r#"{"type":"Identify","data":{"token":"x"}}"#;
        assert!(serde_json::from_str::<ClientCommand>(raw).is_err());
    }
}
