//! Hub actor implementation
//!
//! The central actor that owns all shared state: the session registry, the
//! room table, and per-room message history. Uses the Actor pattern with
//! mpsc channels for message passing: every mutation happens inside the
//! single `run` loop, one event at a time, so no locks are needed and
//! room/registry updates are linearizable.
//!
//! Delivery to a session is always a non-blocking enqueue into its bounded
//! mailbox. A recipient whose mailbox cannot accept a frame is evicted on
//! the spot; the Hub never waits on a slow consumer.

use std::collections::HashMap;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::frame::OutboundFrame;
use crate::room::Room;
use crate::session::Session;
use crate::types::{ClientId, RoomId};

/// Placeholder peer name for the solo-member presence frame
const ABSENT_PEER: &str = "Other";

/// Events sent from connection handlers to the Hub actor
#[derive(Debug)]
pub enum HubEvent {
    /// A fully-formed session finished its handshake
    Register { session: Session },
    /// A session's connection ended (idempotent)
    Unregister { client_id: ClientId },
    /// A chat message from a registered session
    Broadcast { client_id: ClientId, body: String },
    /// A typing-indicator change from a registered session
    TypingChanged { client_id: ClientId, is_typing: bool },
}

/// The Hub actor
///
/// Sessions are owned by the Hub from Register until removal; dropping a
/// session closes its mailbox, which its writer task observes as the
/// signal to shut the connection down.
pub struct Hub {
    /// All registered sessions: ClientId -> Session
    clients: HashMap<ClientId, Session>,
    /// All live rooms: RoomId -> Room
    rooms: HashMap<RoomId, Room>,
    /// Event receiver channel
    receiver: mpsc::Receiver<HubEvent>,
}

impl Hub {
    /// Create a new Hub with the given event receiver
    pub fn new(receiver: mpsc::Receiver<HubEvent>) -> Self {
        Self {
            clients: HashMap::new(),
            rooms: HashMap::new(),
            receiver,
        }
    }

    /// Run the Hub event loop
    ///
    /// Processes events strictly one at a time, in arrival order, until
    /// all senders are dropped.
    pub async fn run(mut self) {
        info!("Hub started");

        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }

        info!("Hub shutting down");
    }

    /// Process a single event
    fn handle_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Register { session } => {
                self.handle_register(session);
            }
            HubEvent::Unregister { client_id } => {
                self.handle_unregister(client_id);
            }
            HubEvent::Broadcast { client_id, body } => {
                self.handle_broadcast(client_id, body);
            }
            HubEvent::TypingChanged { client_id, is_typing } => {
                self.handle_typing(client_id, is_typing);
            }
        }
    }

    /// Handle a new session joining its room
    ///
    /// On acceptance: replay the room's history to the newcomer, notify
    /// the existing member of the join, then push presence to everyone.
    /// A third joiner is rejected with a `Room is full` notice and its
    /// connection is closed; the two existing members are not told.
    fn handle_register(&mut self, session: Session) {
        let client_id = session.id;
        let room_id = session.room_id.clone();
        let name = session.display_name.clone();

        self.clients.insert(client_id, session);
        let room = self.rooms.entry(room_id.clone()).or_default();
        room.add_member(client_id);

        if room.over_capacity() {
            room.truncate_to_capacity();
            if let Some(rejected) = self.clients.remove(&client_id) {
                // Dropping the session closes the mailbox; the writer
                // drains the notice, then shuts the connection down.
                let _ = rejected.try_deliver(OutboundFrame::RoomFull);
            }
            warn!(client = %client_id, name = %name, room = %room_id, "join rejected, room full");
            return;
        }

        let replay: Vec<OutboundFrame> = room
            .history
            .iter()
            .map(|entry| OutboundFrame::Chat {
                timestamp: entry.timestamp.clone(),
                content: entry.content.clone(),
            })
            .collect();
        for frame in replay {
            if !self.deliver_or_evict(client_id, frame) {
                return;
            }
        }

        self.fan_out_except(
            &room_id,
            client_id,
            OutboundFrame::System(format!("{} joined the room", name)),
        );
        self.broadcast_presence(&room_id);

        info!(
            client = %client_id,
            name = %name,
            room = %room_id,
            total = self.clients.len(),
            "session registered"
        );
    }

    /// Handle a session's connection ending
    ///
    /// Idempotent: the reader and writer task each emit one Unregister,
    /// and the second one finds the session already gone.
    fn handle_unregister(&mut self, client_id: ClientId) {
        let Some(session) = self.clients.remove(&client_id) else {
            return;
        };
        let room_id = session.room_id.clone();
        let name = session.display_name.clone();

        self.remove_from_room(client_id, &room_id);

        self.fan_out_except(
            &room_id,
            client_id,
            OutboundFrame::System(format!("{} left the room", name)),
        );
        self.broadcast_presence(&room_id);

        info!(
            client = %client_id,
            name = %name,
            room = %room_id,
            total = self.clients.len(),
            "session unregistered"
        );
    }

    /// Handle a chat message
    ///
    /// Stamps the message, appends it to the room history, and fans it out
    /// to every other member. Never echoed to the sender.
    fn handle_broadcast(&mut self, client_id: ClientId, body: String) {
        let Some(session) = self.clients.get(&client_id) else {
            return;
        };
        let room_id = session.room_id.clone();
        let timestamp = wall_clock_stamp();
        let content = format!("{}: {}", session.display_name, body);

        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        room.append_history(timestamp.clone(), content.clone());

        self.fan_out_except(&room_id, client_id, OutboundFrame::Chat { timestamp, content });
    }

    /// Handle a typing-indicator change
    ///
    /// Relayed to the other member only; never persisted.
    fn handle_typing(&mut self, client_id: ClientId, is_typing: bool) {
        let Some(session) = self.clients.get(&client_id) else {
            return;
        };
        let room_id = session.room_id.clone();
        let frame = if is_typing {
            OutboundFrame::TypingStarted(session.display_name.clone())
        } else {
            OutboundFrame::TypingStopped
        };

        self.fan_out_except(&room_id, client_id, frame);
    }

    /// Helper: deliver a frame to every room member except one
    fn fan_out_except(&mut self, room_id: &RoomId, except: ClientId, frame: OutboundFrame) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        for target in room.others(except) {
            self.deliver_or_evict(target, frame.clone());
        }
    }

    /// Helper: push presence to every member of a room
    ///
    /// Each member learns the state of "the other participant": Online with
    /// the peer's name when one exists, Offline when the member is alone.
    fn broadcast_presence(&mut self, room_id: &RoomId) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        let members = room.members.clone();

        let mut deliveries = Vec::with_capacity(members.len());
        for member in &members {
            let frame = match members.iter().find(|peer| *peer != member) {
                Some(peer) => OutboundFrame::Status {
                    name: self
                        .clients
                        .get(peer)
                        .map(|s| s.display_name.clone())
                        .unwrap_or_else(|| ABSENT_PEER.to_string()),
                    online: true,
                },
                None => OutboundFrame::Status {
                    name: ABSENT_PEER.to_string(),
                    online: false,
                },
            };
            deliveries.push((*member, frame));
        }

        for (target, frame) in deliveries {
            self.deliver_or_evict(target, frame);
        }
    }

    /// Helper: non-blocking delivery with the backpressure policy
    ///
    /// Returns false if the recipient had to be evicted (mailbox full or
    /// already closed).
    fn deliver_or_evict(&mut self, client_id: ClientId, frame: OutboundFrame) -> bool {
        let Some(session) = self.clients.get(&client_id) else {
            return false;
        };
        if session.try_deliver(frame).is_ok() {
            return true;
        }
        self.evict(client_id);
        false
    }

    /// Helper: silently remove an unresponsive session
    ///
    /// No left notice and no presence recompute; the delivering operation
    /// carries on for its remaining recipients.
    fn evict(&mut self, client_id: ClientId) {
        let Some(session) = self.clients.remove(&client_id) else {
            return;
        };
        warn!(
            client = %client_id,
            name = %session.display_name,
            room = %session.room_id,
            "evicting unresponsive session"
        );
        self.remove_from_room(client_id, &session.room_id);
    }

    /// Helper: remove a member from a room, dropping the room when empty
    fn remove_from_room(&mut self, client_id: ClientId, room_id: &RoomId) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        room.remove_member(client_id);
        if room.is_empty() {
            self.rooms.remove(room_id);
            debug!(room = %room_id, "room dropped (empty)");
        }
    }
}

/// Current wall-clock time as `HH:MM:SS`
fn wall_clock_stamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
