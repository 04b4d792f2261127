//! Client -> Server message parsing.

use super::ClientEventName;
use crate::{Cell, Direction, ProtocolError};
use serde_json::Value;

/// Parsed client event.
///
/// Optional fields are `None` when the client sent a value of the wrong shape;
/// the server keeps the previous value for those.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Join a room with a display name.
    JoinRoom {
        room: Option<String>,
        name: Option<String>,
    },
    /// Client-authoritative trajectory and score.
    Update {
        snake: Option<Vec<Cell>>,
        score: Option<u64>,
    },
    /// Facing direction.
    Move { dir: Direction },
    /// Food claim at a cell.
    EatFood(Cell),
    /// Reset own snake.
    Restart,
}

impl ClientEvent {
    /// Parse a client event from a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let envelope = value.as_object().ok_or(ProtocolError::NotAnObject)?;
        let name = envelope
            .get("event")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingEvent)?;
        let event = ClientEventName::parse(name)
            .ok_or_else(|| ProtocolError::UnknownEvent(name.to_string()))?;
        let data = envelope.get("data").unwrap_or(&Value::Null);

        match event {
            ClientEventName::JoinRoom => Ok(ClientEvent::JoinRoom {
                room: string_field(data, "room"),
                name: string_field(data, "name"),
            }),
            ClientEventName::Update => Ok(ClientEvent::Update {
                snake: data.get("snake").and_then(parse_trajectory),
                score: data.get("score").and_then(parse_score),
            }),
            ClientEventName::Move => data
                .get("dir")
                .and_then(Value::as_str)
                .and_then(Direction::parse)
                .map(|dir| ClientEvent::Move { dir })
                .ok_or(ProtocolError::MalformedPayload(event.as_str())),
            ClientEventName::EatFood => serde_json::from_value::<Cell>(data.clone())
                .map(ClientEvent::EatFood)
                .map_err(|_| ProtocolError::MalformedPayload(event.as_str())),
            ClientEventName::Restart => Ok(ClientEvent::Restart),
        }
    }
}

fn string_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// A trajectory is only accepted whole: one bad cell rejects the list.
fn parse_trajectory(value: &Value) -> Option<Vec<Cell>> {
    serde_json::from_value(value.clone()).ok()
}

/// Scores are non-negative; fractional values are truncated.
fn parse_score(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|score| score.is_finite() && *score >= 0.0)
            .map(|score| score as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join() {
        let event = ClientEvent::parse(r#"{"event":"joinRoom","data":{"room":"r1","name":"ann"}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room: Some("r1".to_string()),
                name: Some("ann".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_join_without_payload() {
        let event = ClientEvent::parse(r#"{"event":"joinRoom"}"#).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom { room: None, name: None });

        let event = ClientEvent::parse(r#"{"event":"joinRoom","data":{"room":7,"name":null}}"#).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom { room: None, name: None });
    }

    #[test]
    fn test_parse_update() {
        let event = ClientEvent::parse(
            r#"{"event":"update","data":{"snake":[{"x":3,"y":4},{"x":2,"y":4}],"score":12}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Update {
                snake: Some(vec![Cell::new(3, 4), Cell::new(2, 4)]),
                score: Some(12),
            }
        );
    }

    #[test]
    fn test_parse_update_malformed_fields() {
        let event = ClientEvent::parse(
            r#"{"event":"update","data":{"snake":"nope","score":"12"}}"#,
        )
        .unwrap();
        assert_eq!(event, ClientEvent::Update { snake: None, score: None });

        let event = ClientEvent::parse(
            r#"{"event":"update","data":{"snake":[{"x":1,"y":1},{"x":"a"}],"score":-3}}"#,
        )
        .unwrap();
        assert_eq!(event, ClientEvent::Update { snake: None, score: None });
    }

    #[test]
    fn test_parse_update_fractional_score() {
        let event = ClientEvent::parse(r#"{"event":"update","data":{"score":4.9}}"#).unwrap();
        assert_eq!(event, ClientEvent::Update { snake: None, score: Some(4) });
    }

    #[test]
    fn test_parse_move() {
        let event = ClientEvent::parse(r#"{"event":"move","data":{"dir":"up"}}"#).unwrap();
        assert_eq!(event, ClientEvent::Move { dir: Direction::Up });

        let err = ClientEvent::parse(r#"{"event":"move","data":{"dir":"north"}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload("move")));
    }

    #[test]
    fn test_parse_eat_food() {
        let event = ClientEvent::parse(r#"{"event":"eatFood","data":{"x":9,"y":0}}"#).unwrap();
        assert_eq!(event, ClientEvent::EatFood(Cell::new(9, 0)));

        let err = ClientEvent::parse(r#"{"event":"eatFood","data":{"x":9}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload("eatFood")));
    }

    #[test]
    fn test_parse_restart_ignores_payload() {
        let event = ClientEvent::parse(r#"{"event":"restart","data":[1,2,3]}"#).unwrap();
        assert_eq!(event, ClientEvent::Restart);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(ClientEvent::parse("{"), Err(ProtocolError::Json(_))));
        assert!(matches!(ClientEvent::parse("[]"), Err(ProtocolError::NotAnObject)));
        assert!(matches!(ClientEvent::parse(r#"{"data":{}}"#), Err(ProtocolError::MissingEvent)));
        assert!(matches!(
            ClientEvent::parse(r#"{"event":"chat"}"#),
            Err(ProtocolError::UnknownEvent(name)) if name == "chat"
        ));
    }
}
