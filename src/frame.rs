//! Wire protocol definitions
//!
//! The relay speaks a plain-text sentinel protocol over WebSocket text
//! frames. The exact byte layout is an external contract shared with
//! existing clients, so every encoding here must be reproduced verbatim:
//!
//! - in:  `typing:1` / `typing:0`, anything else is a chat message body
//! - out: `<HH:MM:SS>|<rendered>`, `system:<text>`, `typing:1:<name>`,
//!   `typing:0`, `status:<name>:Online`, `status:<name>:Offline`,
//!   `Room is full`

/// Client → Hub frame
///
/// Decoded by the reader task from an inbound text frame. The protocol has
/// no explicit chat sentinel: any frame that is not a typing marker is a
/// chat body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Sender started (`true`) or stopped (`false`) typing
    Typing(bool),
    /// A chat message body
    Chat(String),
}

impl InboundFrame {
    /// Decode an inbound text frame
    ///
    /// The typing markers match exactly; `typing:1 ` or `Typing:1` are
    /// ordinary chat bodies.
    pub fn parse(text: &str) -> Self {
        match text {
            "typing:1" => Self::Typing(true),
            "typing:0" => Self::Typing(false),
            _ => Self::Chat(text.to_string()),
        }
    }
}

/// Hub → client frame
///
/// Encoded by the writer task just before the socket write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// A live broadcast or a history replay entry. `content` is already
    /// rendered as `<name>: <body>`.
    Chat { timestamp: String, content: String },
    /// Join/leave notice
    System(String),
    /// Someone in the room is typing
    TypingStarted(String),
    /// No one (relevant) is typing
    TypingStopped,
    /// Presence update for the named participant
    Status { name: String, online: bool },
    /// Capacity rejection notice, immediately followed by a forced close
    RoomFull,
}

impl OutboundFrame {
    /// Encode this frame to its wire representation
    pub fn encode(&self) -> String {
        match self {
            Self::Chat { timestamp, content } => format!("{}|{}", timestamp, content),
            Self::System(text) => format!("system:{}", text),
            Self::TypingStarted(name) => format!("typing:1:{}", name),
            Self::TypingStopped => "typing:0".to_string(),
            Self::Status { name, online } => {
                let state = if *online { "Online" } else { "Offline" };
                format!("status:{}:{}", name, state)
            }
            Self::RoomFull => "Room is full".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typing_markers() {
        assert_eq!(InboundFrame::parse("typing:1"), InboundFrame::Typing(true));
        assert_eq!(InboundFrame::parse("typing:0"), InboundFrame::Typing(false));
    }

    #[test]
    fn test_parse_chat_body() {
        assert_eq!(
            InboundFrame::parse("hello there"),
            InboundFrame::Chat("hello there".to_string())
        );
        // Only the exact markers are typing events
        assert_eq!(
            InboundFrame::parse("typing:2"),
            InboundFrame::Chat("typing:2".to_string())
        );
        assert_eq!(
            InboundFrame::parse("typing:1 "),
            InboundFrame::Chat("typing:1 ".to_string())
        );
        assert_eq!(InboundFrame::parse(""), InboundFrame::Chat(String::new()));
    }

    #[test]
    fn test_encode_chat() {
        let frame = OutboundFrame::Chat {
            timestamp: "14:03:59".to_string(),
            content: "alice: hi".to_string(),
        };
        assert_eq!(frame.encode(), "14:03:59|alice: hi");
    }

    #[test]
    fn test_encode_system() {
        let frame = OutboundFrame::System("bob joined the room".to_string());
        assert_eq!(frame.encode(), "system:bob joined the room");
    }

    #[test]
    fn test_encode_typing() {
        assert_eq!(
            OutboundFrame::TypingStarted("alice".to_string()).encode(),
            "typing:1:alice"
        );
        assert_eq!(OutboundFrame::TypingStopped.encode(), "typing:0");
    }

    #[test]
    fn test_encode_status() {
        assert_eq!(
            OutboundFrame::Status {
                name: "bob".to_string(),
                online: true
            }
            .encode(),
            "status:bob:Online"
        );
        assert_eq!(
            OutboundFrame::Status {
                name: "Other".to_string(),
                online: false
            }
            .encode(),
            "status:Other:Offline"
        );
    }

    #[test]
    fn test_encode_room_full() {
        assert_eq!(OutboundFrame::RoomFull.encode(), "Room is full");
    }
}
