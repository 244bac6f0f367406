// AMV Notation - Sync Commands
// Entry point for messages coming from the detached notes window

use super::SessionState;
use crate::sync::{ClipSnapshot, SyncBridge, SyncMessage};

/// Apply a detached-window message; the reply is what the shell should emit back
pub fn sync_message(state: &SessionState, message: SyncMessage) -> Result<Option<SyncMessage>, String> {
    let mut session = state.lock()?;
    Ok(SyncBridge::handle(&mut session, message))
}

pub fn get_clip_snapshot(state: &SessionState) -> Result<ClipSnapshot, String> {
    let session = state.lock()?;
    Ok(SyncBridge::snapshot(&session))
}
