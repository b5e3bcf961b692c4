//! Session struct definition
//!
//! Represents one connected identity: display name, assigned room, and the
//! bounded outbound mailbox drained by the connection's writer task.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::frame::OutboundFrame;
use crate::types::{ClientId, RoomId};

/// Outbound mailbox capacity per session
///
/// A session whose mailbox is full when the Hub delivers to it is evicted
/// rather than awaited.
pub const MAILBOX_CAPACITY: usize = 256;

/// Connected client session
///
/// Display name and room are fixed at connect time from the upgrade
/// request and never change for the session's lifetime. The Hub owns the
/// session once registered; dropping it closes the mailbox, which the
/// writer task observes as its termination signal.
#[derive(Debug)]
pub struct Session {
    /// Unique identifier for this session
    pub id: ClientId,
    /// Display name supplied at connect time (not unique)
    pub display_name: String,
    /// Room assigned at connect time
    pub room_id: RoomId,
    /// Hub → writer-task mailbox
    outbound: mpsc::Sender<OutboundFrame>,
}

impl Session {
    /// Create a new session with its outbound mailbox sender
    pub fn new(
        id: ClientId,
        display_name: String,
        room_id: RoomId,
        outbound: mpsc::Sender<OutboundFrame>,
    ) -> Self {
        Self {
            id,
            display_name,
            room_id,
            outbound,
        }
    }

    /// Enqueue a frame without blocking
    ///
    /// Fails when the mailbox is full (slow consumer) or closed (writer
    /// task already gone); the Hub treats either as grounds for eviction.
    pub fn try_deliver(&self, frame: OutboundFrame) -> Result<(), TrySendError<OutboundFrame>> {
        self.outbound.try_send(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_capacity(cap: usize) -> (Session, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(cap);
        let session = Session::new(ClientId::new(), "alice".to_string(), RoomId::new("r1"), tx);
        (session, rx)
    }

    #[tokio::test]
    async fn test_try_deliver_enqueues() {
        let (session, mut rx) = session_with_capacity(4);
        session.try_deliver(OutboundFrame::TypingStopped).unwrap();
        assert_eq!(rx.recv().await, Some(OutboundFrame::TypingStopped));
    }

    #[tokio::test]
    async fn test_try_deliver_full_mailbox() {
        let (session, _rx) = session_with_capacity(1);
        session.try_deliver(OutboundFrame::TypingStopped).unwrap();
        let err = session.try_deliver(OutboundFrame::TypingStopped);
        assert!(matches!(err, Err(TrySendError::Full(_))));
    }

    #[tokio::test]
    async fn test_try_deliver_closed_mailbox() {
        let (session, rx) = session_with_capacity(1);
        drop(rx);
        let err = session.try_deliver(OutboundFrame::TypingStopped);
        assert!(matches!(err, Err(TrySendError::Closed(_))));
    }

    #[tokio::test]
    async fn test_dropping_session_closes_mailbox() {
        let (session, mut rx) = session_with_capacity(4);
        session
            .try_deliver(OutboundFrame::System("bye".to_string()))
            .unwrap();
        drop(session);
        // Buffered frames drain before the closure is observed
        assert_eq!(
            rx.recv().await,
            Some(OutboundFrame::System("bye".to_string()))
        );
        assert_eq!(rx.recv().await, None);
    }
}
