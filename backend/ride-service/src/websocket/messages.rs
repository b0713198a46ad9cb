/// Frames exchanged on the notification socket
use crate::models::UserId;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Client to server. Unknown kinds are kept so the session can log them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Push the current unread count to the socket of user `id`
    GetNumber { id: UserId },
    /// Resend the unread count to this socket
    ReadMessages,
    Unrecognized(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("get_number frame without a usable target id")]
    MissingTarget,
}

#[derive(Deserialize)]
struct RawFrame {
    // Web clients send the tag as `type`
    #[serde(alias = "type")]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let raw: RawFrame =
            serde_json::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;

        match raw.kind.as_str() {
            "get_number" => {
                let id = raw.id.as_ref().and_then(target_id).ok_or(FrameError::MissingTarget)?;
                Ok(InboundFrame::GetNumber { id })
            }
            "read_messages" => Ok(InboundFrame::ReadMessages),
            _ => Ok(InboundFrame::Unrecognized(raw.kind)),
        }
    }
}

fn target_id(value: &Value) -> Option<UserId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Server to client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    UnreadCount(i64),
}

impl Outbound {
    /// Wire form: the count as a plain decimal string
    pub fn into_text(self) -> String {
        match self {
            Outbound::UnreadCount(count) => count.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_number_with_text_id() {
        let frame = InboundFrame::parse(r#"{"kind":"get_number","id":"42"}"#).unwrap();
        assert_eq!(frame, InboundFrame::GetNumber { id: 42 });
    }

    #[test]
    fn test_type_alias_and_numeric_id() {
        let frame = InboundFrame::parse(r#"{"type":"get_number","id":7}"#).unwrap();
        assert_eq!(frame, InboundFrame::GetNumber { id: 7 });
    }

    #[test]
    fn test_read_messages_ignores_extra_fields() {
        let frame = InboundFrame::parse(r#"{"type":"read_messages","foo":1}"#).unwrap();
        assert_eq!(frame, InboundFrame::ReadMessages);
    }

    #[test]
    fn test_unknown_kind_kept() {
        let frame = InboundFrame::parse(r#"{"kind":"subscribe"}"#).unwrap();
        assert_eq!(frame, InboundFrame::Unrecognized("subscribe".into()));
    }

    #[test]
    fn test_get_number_without_id() {
        assert_eq!(
            InboundFrame::parse(r#"{"kind":"get_number"}"#),
            Err(FrameError::MissingTarget)
        );
        assert_eq!(
            InboundFrame::parse(r#"{"kind":"get_number","id":"abc"}"#),
            Err(FrameError::MissingTarget)
        );
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            InboundFrame::parse("not json"),
            Err(FrameError::Malformed(_))
        ));
        assert!(matches!(
            InboundFrame::parse(r#"{"id":1}"#),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_outbound_is_plain_integer() {
        assert_eq!(Outbound::UnreadCount(3).into_text(), "3");
    }
}
