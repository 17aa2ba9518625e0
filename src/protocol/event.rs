//! Outbound events reported to the remote session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::directive::Header;
use super::SPEECH_SYNTHESIZER;

/// Speech activity as reported in `SpeechState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerActivity {
    Playing,
    Finished,
}

/// Event payloads.  Untagged: the shape alone tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    SpeechState {
        token: String,
        #[serde(rename = "offsetInMilliseconds")]
        offset_in_milliseconds: u64,
        #[serde(rename = "playerActivity")]
        player_activity: PlayerActivity,
    },
    Token {
        token: String,
    },
}

impl EventPayload {
    pub fn token(&self) -> &str {
        match self {
            EventPayload::SpeechState { token, .. } | EventPayload::Token { token } => token,
        }
    }
}

/// An event sent to (or pulled by) the remote session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub header: Header,
    pub payload: EventPayload,
}

impl Event {
    /// `SpeechSynthesizer.SpeechStarted` with a fresh message id.
    pub fn speech_started(token: impl Into<String>) -> Self {
        Self::pushed("SpeechStarted", token.into())
    }

    /// `SpeechSynthesizer.SpeechFinished` with a fresh message id.
    pub fn speech_finished(token: impl Into<String>) -> Self {
        Self::pushed("SpeechFinished", token.into())
    }

    /// `SpeechSynthesizer.SpeechState`.  Pulled on demand, so no message id.
    pub fn speech_state(
        token: impl Into<String>,
        offset_in_milliseconds: u64,
        player_activity: PlayerActivity,
    ) -> Self {
        Self {
            header: Header::new(SPEECH_SYNTHESIZER, "SpeechState"),
            payload: EventPayload::SpeechState {
                token: token.into(),
                offset_in_milliseconds,
                player_activity,
            },
        }
    }

    fn pushed(name: &str, token: String) -> Self {
        Self {
            header: Header::new(SPEECH_SYNTHESIZER, name).with_message_id(new_message_id()),
            payload: EventPayload::Token { token },
        }
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn token(&self) -> &str {
        self.payload.token()
    }
}

/// Random v4 UUID rendered as 32 lowercase hex digits.
fn new_message_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn speech_started_shape() {
        let event = Event::speech_started("t1");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["header"]["namespace"], "SpeechSynthesizer");
        assert_eq!(value["header"]["name"], "SpeechStarted");
        assert_eq!(value["payload"], json!({"token": "t1"}));

        let id = value["header"]["messageId"].as_str().unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn message_ids_are_unique() {
        let a = Event::speech_finished("t");
        let b = Event::speech_finished("t");
        assert_ne!(a.header.message_id, b.header.message_id);
    }

    #[test]
    fn speech_state_shape() {
        let event = Event::speech_state("t2", 1500, PlayerActivity::Playing);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            json!({
                "header": {"namespace": "SpeechSynthesizer", "name": "SpeechState"},
                "payload": {
                    "token": "t2",
                    "offsetInMilliseconds": 1500,
                    "playerActivity": "PLAYING"
                }
            })
        );
    }

    #[test]
    fn untagged_payload_parses_back_by_shape() {
        let state: EventPayload = serde_json::from_value(json!({
            "token": "x",
            "offsetInMilliseconds": 0,
            "playerActivity": "FINISHED"
        }))
        .unwrap();
        assert!(matches!(
            state,
            EventPayload::SpeechState { player_activity: PlayerActivity::Finished, .. }
        ));

        let token: EventPayload = serde_json::from_value(json!({"token": "y"})).unwrap();
        assert_eq!(token, EventPayload::Token { token: "y".into() });
    }
}
