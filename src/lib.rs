//! 1:1 WebSocket Chat Relay Library
//!
//! A small real-time relay that pairs clients into two-person rooms and
//! fans out chat messages, typing indicators, presence, join/leave
//! notices, and replayed history among room members.
//!
//! # Features
//! - WebSocket connection handling with join parameters on the upgrade
//! - Two-person rooms created implicitly on first join
//! - Full history replay to late joiners
//! - Presence and typing indicators
//! - Non-blocking fan-out: saturated consumers are evicted, never awaited
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Hub` is the central actor owning all registry/room/history state
//! - Each connection runs a reader task and a writer task that talk to
//!   the Hub only through its event channel
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use pairchat::{handle_connection, ConnectionConfig, Hub};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (event_tx, event_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(Hub::new(event_rx).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let event_tx = event_tx.clone();
//!         tokio::spawn(handle_connection(stream, event_tx, ConnectionConfig::default()));
//!     }
//! }
//! ```

pub mod error;
pub mod frame;
pub mod handler;
pub mod hub;
pub mod room;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use error::AppError;
pub use frame::{InboundFrame, OutboundFrame};
pub use handler::{handle_connection, ConnectionConfig, OriginPolicy};
pub use hub::{Hub, HubEvent};
pub use room::{Room, StoredMessage, ROOM_CAPACITY};
pub use session::{Session, MAILBOX_CAPACITY};
pub use types::{ClientId, RoomId};
