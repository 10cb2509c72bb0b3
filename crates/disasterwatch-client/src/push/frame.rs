//! Engine.IO v4 / Socket.IO v5 text frame codec.
//!
//! Each WebSocket text message is one Engine.IO packet: a single type digit
//! followed by its payload. Packet `4` (message) wraps a Socket.IO packet,
//! itself a type digit, an optional `/namespace,` prefix, an optional
//! numeric ack id and a JSON payload:
//!
//! ```text
//! 0{"sid":"x","pingInterval":25000,"pingTimeout":20000}   open
//! 2                                                        ping
//! 40                                                       connect
//! 42["new_event",{"_id":"1"}]                              event
//! 42/admin,7["new_event",{}]                               event, namespace + ack id
//! ```
//!
//! Binary attachments are not used by the alert stream and are not decoded.

use serde::Deserialize;

/// Sent by the client after the Engine.IO handshake to join the default
/// namespace.
pub const CONNECT: &str = "40";

/// Errors decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame was empty.
    #[error("empty frame")]
    Empty,

    /// Unknown Engine.IO or Socket.IO packet type.
    #[error("unknown packet type {0:?}")]
    UnknownType(char),

    /// The payload did not have the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Engine.IO handshake payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine.IO session id.
    #[serde(default)]
    pub sid: String,
    /// Server ping interval in milliseconds.
    #[serde(default)]
    pub ping_interval: u64,
    /// Server ping timeout in milliseconds.
    #[serde(default)]
    pub ping_timeout: u64,
}

/// One Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// `0`: session opened.
    Open(Handshake),
    /// `1`: server closing the transport.
    Close,
    /// `2`: heartbeat probe; answer with [`pong`].
    Ping(String),
    /// `3`: heartbeat answer.
    Pong(String),
    /// `4`: a Socket.IO packet.
    Message(SocketPacket),
    /// `5`: transport upgrade.
    Upgrade,
    /// `6`: no-op.
    Noop,
}

/// One Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// `0`: namespace joined.
    Connect,
    /// `1`: namespace left.
    Disconnect,
    /// `2`: named event with its first argument.
    Event {
        /// Event name.
        name: String,
        /// First argument, `null` when absent.
        data: serde_json::Value,
    },
    /// `3`: acknowledgement; contents ignored.
    Ack,
    /// `4`: the server refused the connection.
    ConnectError(String),
}

/// Decode one text frame.
pub fn decode(frame: &str) -> Result<EnginePacket, FrameError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let payload = chars.as_str();
    match kind {
        '0' => {
            let handshake = serde_json::from_str(payload)
                .map_err(|e| FrameError::Malformed(format!("handshake: {e}")))?;
            Ok(EnginePacket::Open(handshake))
        }
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(payload.to_owned())),
        '3' => Ok(EnginePacket::Pong(payload.to_owned())),
        '4' => decode_socket(payload).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(FrameError::UnknownType(other)),
    }
}

/// Answer to a ping carrying `payload`.
pub fn pong(payload: &str) -> String {
    format!("3{payload}")
}

fn decode_socket(packet: &str) -> Result<SocketPacket, FrameError> {
    let mut chars = packet.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let body = skip_ack_id(skip_namespace(chars.as_str()));
    match kind {
        '0' => Ok(SocketPacket::Connect),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => decode_event(body),
        '3' => Ok(SocketPacket::Ack),
        '4' => Ok(SocketPacket::ConnectError(connect_error_message(body))),
        other => Err(FrameError::UnknownType(other)),
    }
}

fn skip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        body.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        body
    }
}

fn skip_ack_id(body: &str) -> &str {
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn decode_event(body: &str) -> Result<SocketPacket, FrameError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FrameError::Malformed(format!("event: {e}")))?;
    let serde_json::Value::Array(mut args) = value else {
        return Err(FrameError::Malformed(String::from("event payload is not an array")));
    };
    if args.is_empty() {
        return Err(FrameError::Malformed(String::from("event without a name")));
    }
    let name = match args.remove(0) {
        serde_json::Value::String(name) => name,
        other => {
            return Err(FrameError::Malformed(format!("event name is not a string: {other}")));
        }
    };
    let data = if args.is_empty() {
        serde_json::Value::Null
    } else {
        args.swap_remove(0)
    };
    Ok(SocketPacket::Event { name, data })
}

fn connect_error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("connection refused")
            .to_owned(),
        Ok(serde_json::Value::String(message)) => message,
        _ if body.is_empty() => String::from("connection refused"),
        _ => body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_handshake() {
        let packet = decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#);
        assert_eq!(
            packet,
            Ok(EnginePacket::Open(Handshake {
                sid: String::from("abc"),
                ping_interval: 25_000,
                ping_timeout: 20_000,
            }))
        );
    }

    #[test]
    fn ping_is_answered_with_same_payload() {
        assert_eq!(decode("2"), Ok(EnginePacket::Ping(String::new())));
        assert_eq!(pong(""), "3");
        assert_eq!(pong("probe"), "3probe");
    }

    #[test]
    fn decodes_connect_with_sid_payload() {
        assert_eq!(
            decode(r#"40{"sid":"xyz"}"#),
            Ok(EnginePacket::Message(SocketPacket::Connect))
        );
    }

    #[test]
    fn decodes_event() {
        let packet = decode(r#"42["new_event",{"_id":"1","severity":"High"}]"#);
        assert_eq!(
            packet,
            Ok(EnginePacket::Message(SocketPacket::Event {
                name: String::from("new_event"),
                data: json!({"_id": "1", "severity": "High"}),
            }))
        );
    }

    #[test]
    fn skips_namespace_and_ack_id() {
        let packet = decode(r#"42/admin,17["new_event",{"_id":"9"}]"#);
        assert_eq!(
            packet,
            Ok(EnginePacket::Message(SocketPacket::Event {
                name: String::from("new_event"),
                data: json!({"_id": "9"}),
            }))
        );
    }

    #[test]
    fn event_without_argument_has_null_data() {
        let packet = decode(r#"42["heartbeat"]"#);
        assert_eq!(
            packet,
            Ok(EnginePacket::Message(SocketPacket::Event {
                name: String::from("heartbeat"),
                data: serde_json::Value::Null,
            }))
        );
    }

    #[test]
    fn connect_error_carries_message() {
        assert_eq!(
            decode(r#"44{"message":"Not authorized"}"#),
            Ok(EnginePacket::Message(SocketPacket::ConnectError(String::from(
                "Not authorized"
            ))))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(decode(""), Err(FrameError::Empty));
        assert_eq!(decode("9"), Err(FrameError::UnknownType('9')));
        assert!(matches!(decode("42{}"), Err(FrameError::Malformed(_))));
        assert!(matches!(decode("42[1,2]"), Err(FrameError::Malformed(_))));
    }
}
