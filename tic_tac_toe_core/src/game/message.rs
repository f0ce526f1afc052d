use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::BOARD_SIZE;

/// Largest payload accepted from the peer, in bytes.
pub const MAX_MESSAGE_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireMessage {
    Handshake { name: String },
    Move { row: usize, col: usize },
    Restart,
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload of {len} bytes exceeds the {MAX_MESSAGE_LEN} byte limit")]
    TooLong { len: usize },
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("handshake carried an empty name")]
    EmptyName,
    #[error("move ({row}, {col}) is outside the board")]
    BadCoordinate { row: usize, col: usize },
    #[error("unrecognized payload {0:?}")]
    Unrecognized(String),
}

impl WireMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes an in-game payload. Only the tagged form is accepted, so a
    /// move can never be mistaken for a control message.
    pub fn decode(payload: &str) -> Result<WireMessage, DecodeError> {
        check_len(payload)?;

        let message = serde_json::from_str::<WireMessage>(payload)
            .map_err(|_| DecodeError::Unrecognized(payload.to_string()))?;

        if let WireMessage::Move { row, col } = message {
            if row >= BOARD_SIZE || col >= BOARD_SIZE {
                return Err(DecodeError::BadCoordinate { row, col });
            }
        }
        Ok(message)
    }

    pub fn decode_handshake(payload: &str) -> Result<String, DecodeError> {
        check_len(payload)?;

        let name = match serde_json::from_str::<WireMessage>(payload) {
            Ok(WireMessage::Handshake { name }) => name,
            _ => return Err(DecodeError::Unrecognized(payload.to_string())),
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(DecodeError::EmptyName);
        }
        Ok(name.to_string())
    }
}

fn check_len(payload: &str) -> Result<(), DecodeError> {
    if payload.len() > MAX_MESSAGE_LEN {
        return Err(DecodeError::TooLong { len: payload.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_is_tagged() {
        let text = WireMessage::Move { row: 1, col: 2 }.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "MOVE");
        assert_eq!(value["row"], 1);
        assert_eq!(value["col"], 2);
    }

    #[test]
    fn test_control_messages_are_tagged() {
        assert_eq!(WireMessage::Restart.encode().unwrap(), r#"{"type":"RESTART"}"#);
        assert_eq!(
            WireMessage::Terminate.encode().unwrap(),
            r#"{"type":"TERMINATE"}"#
        );
    }

    #[test]
    fn test_tagged_payloads_decode() {
        assert_eq!(
            WireMessage::decode(r#"{"type":"MOVE","row":2,"col":0}"#),
            Ok(WireMessage::Move { row: 2, col: 0 })
        );
        assert_eq!(
            WireMessage::decode(r#"{"type":"RESTART"}"#),
            Ok(WireMessage::Restart)
        );
    }

    #[test]
    fn test_untagged_text_is_not_a_message() {
        for payload in ["0,2", "Play Again", "Fun Times"] {
            assert_eq!(
                WireMessage::decode(payload),
                Err(DecodeError::Unrecognized(payload.to_string()))
            );
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            WireMessage::decode("hello there"),
            Err(DecodeError::Unrecognized(_))
        ));
        assert!(matches!(
            WireMessage::decode(r#"{"type":"MOVE","row":1}"#),
            Err(DecodeError::Unrecognized(_))
        ));
        assert!(matches!(
            WireMessage::decode(r#"{"type":"JUMP"}"#),
            Err(DecodeError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_coordinates_outside_board_are_rejected() {
        assert_eq!(
            WireMessage::decode(r#"{"type":"MOVE","row":3,"col":0}"#),
            Err(DecodeError::BadCoordinate { row: 3, col: 0 })
        );
        assert_eq!(
            WireMessage::decode(r#"{"type":"MOVE","row":0,"col":9}"#),
            Err(DecodeError::BadCoordinate { row: 0, col: 9 })
        );
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let payload = "a".repeat(MAX_MESSAGE_LEN + 1);
        assert_eq!(
            WireMessage::decode(&payload),
            Err(DecodeError::TooLong {
                len: MAX_MESSAGE_LEN + 1
            })
        );
    }

    #[test]
    fn test_handshake_name_is_trimmed() {
        let tagged = WireMessage::Handshake {
            name: "  Alice \n".to_string(),
        }
        .encode()
        .unwrap();
        assert_eq!(WireMessage::decode_handshake(&tagged), Ok("Alice".to_string()));
    }

    #[test]
    fn test_handshake_rejects_empty_or_wrong_kind() {
        assert_eq!(
            WireMessage::decode_handshake(r#"{"type":"HANDSHAKE","name":"  "}"#),
            Err(DecodeError::EmptyName)
        );
        assert!(matches!(
            WireMessage::decode_handshake(r#"{"type":"TERMINATE"}"#),
            Err(DecodeError::Unrecognized(_))
        ));
        assert!(matches!(
            WireMessage::decode_handshake("Bob"),
            Err(DecodeError::Unrecognized(_))
        ));
    }
}
