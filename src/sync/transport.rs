// Sync transports
// Delivery of sync messages between windows: an in-process channel pair, or Tauri events.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use super::SyncMessage;
use crate::error::{NotationError, Result};

/// Outgoing side of a window's connection
pub trait SyncTransport {
    fn send(&self, message: &SyncMessage) -> Result<()>;
}

/// One end of an in-process connection.
/// Messages travel as JSON text so both ends see exactly the wire shape.
pub struct ChannelTransport {
    outgoing: Sender<String>,
    incoming: Receiver<String>,
}

impl ChannelTransport {
    /// Two connected ends: what one sends, the other receives
    pub fn pair() -> (Self, Self) {
        let (to_b, from_a) = channel();
        let (to_a, from_b) = channel();
        (
            Self { outgoing: to_b, incoming: from_b },
            Self { outgoing: to_a, incoming: from_a },
        )
    }

    /// Next pending message; `Ok(None)` when nothing is waiting
    pub fn try_recv(&self) -> Result<Option<SyncMessage>> {
        match self.incoming.try_recv() {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(NotationError::Other("sync peer disconnected".to_string())),
        }
    }

    /// Every pending message, in send order. Malformed messages are logged and skipped.
    pub fn drain(&self) -> Vec<SyncMessage> {
        let mut out = Vec::new();
        while let Ok(text) = self.incoming.try_recv() {
            match serde_json::from_str(&text) {
                Ok(message) => out.push(message),
                Err(e) => log::warn!("Dropping malformed sync message: {}", e),
            }
        }
        out
    }
}

impl SyncTransport for ChannelTransport {
    fn send(&self, message: &SyncMessage) -> Result<()> {
        let text = serde_json::to_string(message)?;
        self.outgoing
            .send(text)
            .map_err(|_| NotationError::Other("sync peer disconnected".to_string()))
    }
}

/// Emits each message as a Tauri event named after its type
#[cfg(feature = "desktop")]
pub struct TauriTransport<R: tauri::Runtime> {
    app: tauri::AppHandle<R>,
}

#[cfg(feature = "desktop")]
impl<R: tauri::Runtime> TauriTransport<R> {
    pub fn new(app: tauri::AppHandle<R>) -> Self {
        Self { app }
    }
}

#[cfg(feature = "desktop")]
impl<R: tauri::Runtime> SyncTransport for TauriTransport<R> {
    fn send(&self, message: &SyncMessage) -> Result<()> {
        use tauri::Emitter;

        let payload = message.payload()?;
        self.app
            .emit(message.event_name(), payload)
            .map_err(|e| NotationError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{DetachedNotes, Navigation};

    #[test]
    fn test_pair_delivers_in_order() {
        let (main, detached) = ChannelTransport::pair();
        assert!(detached.try_recv().unwrap().is_none());

        detached.send(&SyncMessage::RequestSnapshot).unwrap();
        detached.send(&SyncMessage::NavigateClip(Navigation::default())).unwrap();
        detached.send(&SyncMessage::Undo).unwrap();

        let received = main.drain();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0], SyncMessage::RequestSnapshot);
        assert_eq!(received[2], SyncMessage::Undo);
        assert!(main.drain().is_empty());
    }

    #[test]
    fn test_disconnected_peer() {
        let (main, detached) = ChannelTransport::pair();
        drop(detached);
        assert!(main.send(&SyncMessage::Undo).is_err());
        assert!(main.try_recv().is_err());
    }

    #[test]
    fn test_mirror_over_channel() {
        let (main_end, detached_end) = ChannelTransport::pair();
        let mirror = DetachedNotes::new();
        detached_end.send(&mirror.request_resync()).unwrap();
        assert_eq!(main_end.try_recv().unwrap(), Some(SyncMessage::RequestSnapshot));
    }
}
