//! Room struct definition
//!
//! A room is a small-group aggregate owned by the Hub: an ordered member
//! list capped at two sessions plus the append-only message history that
//! is replayed to late joiners.

use crate::types::ClientId;

/// Maximum number of members a room admits
pub const ROOM_CAPACITY: usize = 2;

/// One rendered chat message retained for replay
///
/// `content` already includes the sender's display name; the timestamp is
/// the Hub-assigned `HH:MM:SS` stamp from broadcast time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub timestamp: String,
    pub content: String,
}

/// Two-party chat room
///
/// Members are kept in join order. The capacity invariant (len ≤ 2) holds
/// between Hub events; during a Register the Hub may briefly push a third
/// member before rejecting it via [`Room::truncate_to_capacity`].
#[derive(Debug, Default)]
pub struct Room {
    /// Member sessions in join order
    pub members: Vec<ClientId>,
    /// Append-only message log, replayed in full to new members
    pub history: Vec<StoredMessage>,
}

impl Room {
    /// Create an empty room
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member (capacity is checked by the caller afterwards)
    pub fn add_member(&mut self, client_id: ClientId) {
        self.members.push(client_id);
    }

    /// Check whether the last join pushed the room past capacity
    pub fn over_capacity(&self) -> bool {
        self.members.len() > ROOM_CAPACITY
    }

    /// Drop members beyond capacity, keeping the earliest joiners
    pub fn truncate_to_capacity(&mut self) {
        self.members.truncate(ROOM_CAPACITY);
    }

    /// Remove a member; returns true if it was present
    pub fn remove_member(&mut self, client_id: ClientId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| *id != client_id);
        self.members.len() != before
    }

    /// Check if the room has no members (and should be dropped)
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if a session is a member of this room
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.members.contains(&client_id)
    }

    /// Members other than the given one, in join order
    pub fn others(&self, client_id: ClientId) -> Vec<ClientId> {
        self.members
            .iter()
            .copied()
            .filter(|id| *id != client_id)
            .collect()
    }

    /// Append a rendered message to the history
    pub fn append_history(&mut self, timestamp: String, content: String) {
        self.history.push(StoredMessage { timestamp, content });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_starts_empty() {
        let room = Room::new();
        assert!(room.is_empty());
        assert!(!room.over_capacity());
        assert!(room.history.is_empty());
    }

    #[test]
    fn test_capacity_check() {
        let mut room = Room::new();
        room.add_member(ClientId::new());
        room.add_member(ClientId::new());
        assert!(!room.over_capacity());

        room.add_member(ClientId::new());
        assert!(room.over_capacity());
    }

    #[test]
    fn test_truncate_keeps_earliest_joiners() {
        let a = ClientId::new();
        let b = ClientId::new();
        let c = ClientId::new();
        let mut room = Room::new();
        room.add_member(a);
        room.add_member(b);
        room.add_member(c);

        room.truncate_to_capacity();

        assert_eq!(room.members, vec![a, b]);
        assert!(!room.contains(c));
    }

    #[test]
    fn test_remove_member() {
        let a = ClientId::new();
        let b = ClientId::new();
        let mut room = Room::new();
        room.add_member(a);
        room.add_member(b);

        assert!(room.remove_member(a));
        assert_eq!(room.members, vec![b]);
        assert!(!room.is_empty());

        // Removing an absent member is a no-op
        assert!(!room.remove_member(a));

        assert!(room.remove_member(b));
        assert!(room.is_empty());
    }

    #[test]
    fn test_others_excludes_self() {
        let a = ClientId::new();
        let b = ClientId::new();
        let mut room = Room::new();
        room.add_member(a);
        room.add_member(b);

        assert_eq!(room.others(a), vec![b]);
        assert_eq!(room.others(b), vec![a]);

        let stranger = ClientId::new();
        assert_eq!(room.others(stranger), vec![a, b]);
    }

    #[test]
    fn test_history_preserves_order() {
        let mut room = Room::new();
        room.append_history("10:00:00".to_string(), "alice: one".to_string());
        room.append_history("10:00:01".to_string(), "bob: two".to_string());

        assert_eq!(room.history.len(), 2);
        assert_eq!(room.history[0].content, "alice: one");
        assert_eq!(room.history[1].content, "bob: two");
    }
}
