// Sync Module
// Messages between the main window and the detached notes window.
// The main side owns the session; the detached side keeps a mirror and sends edits.

pub mod transport;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::bareme::Bareme;
use crate::error::{NotationError, Result};
use crate::notation::{CriterionScoreData, NoteData};
use crate::project::Clip;
use crate::scoring::ScoreValue;
use crate::session::{Direction, NotationSession};

pub use transport::{ChannelTransport, SyncTransport};

/// Everything the detached window needs to render the current clip
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSnapshot {
    pub clip_id: Option<String>,
    pub clip: Option<Clip>,
    /// Position in the author-sorted clip list
    pub clip_index: usize,
    pub total_clips: usize,
    pub bareme: Option<Bareme>,
    pub note: Option<NoteData>,
    pub hide_totals: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionUpdate {
    pub clip_id: String,
    pub criterion_id: String,
    pub value: ScoreValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNotesUpdate {
    pub clip_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionNoteUpdate {
    pub clip_id: String,
    pub criterion_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNoteUpdate {
    pub clip_id: String,
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    pub clip_id: String,
    pub note: Option<NoteData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    #[serde(default)]
    pub direction: Direction,
}

/// Wire shape: `{"type": "...", "payload": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum SyncMessage {
    RequestSnapshot,
    Snapshot(ClipSnapshot),
    CriterionUpdated(CriterionUpdate),
    TextNotesUpdated(TextNotesUpdate),
    CriterionNoteUpdated(CriterionNoteUpdate),
    CategoryNoteUpdated(CategoryNoteUpdate),
    NoteUpdated(NoteUpdate),
    Undo,
    NavigateClip(Navigation),
}

// (message type tag, desktop event name)
const EVENT_NAMES: [(&str, &str); 9] = [
    ("requestSnapshot", "notes:request-data"),
    ("snapshot", "main:clip-data"),
    ("criterionUpdated", "notes:criterion-updated"),
    ("textNotesUpdated", "notes:text-notes-updated"),
    ("criterionNoteUpdated", "notes:criterion-note-updated"),
    ("categoryNoteUpdated", "notes:category-note-updated"),
    ("noteUpdated", "main:note-updated"),
    ("undo", "notes:undo"),
    ("navigateClip", "notes:navigate-clip"),
];

/// Desktop events sent by the detached window, handled on the main side
pub fn main_window_event_names() -> impl Iterator<Item = &'static str> {
    EVENT_NAMES
        .iter()
        .map(|(_, event)| *event)
        .filter(|event| event.starts_with("notes:"))
}

impl SyncMessage {
    pub fn type_tag(&self) -> &'static str {
        match self {
            SyncMessage::RequestSnapshot => "requestSnapshot",
            SyncMessage::Snapshot(_) => "snapshot",
            SyncMessage::CriterionUpdated(_) => "criterionUpdated",
            SyncMessage::TextNotesUpdated(_) => "textNotesUpdated",
            SyncMessage::CriterionNoteUpdated(_) => "criterionNoteUpdated",
            SyncMessage::CategoryNoteUpdated(_) => "categoryNoteUpdated",
            SyncMessage::NoteUpdated(_) => "noteUpdated",
            SyncMessage::Undo => "undo",
            SyncMessage::NavigateClip(_) => "navigateClip",
        }
    }

    /// Event name on the desktop event bus
    pub fn event_name(&self) -> &'static str {
        let tag = self.type_tag();
        EVENT_NAMES
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, event)| *event)
            .unwrap_or("notes:unknown")
    }

    /// Payload alone, as sent with [`SyncMessage::event_name`]
    pub fn payload(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        Ok(value.get_mut("payload").map(Value::take).unwrap_or(Value::Null))
    }

    /// Rebuild a message from a desktop event name and its payload
    pub fn from_event(event: &str, payload: Value) -> Result<Self> {
        let tag = EVENT_NAMES
            .iter()
            .find(|(_, name)| *name == event)
            .map(|(tag, _)| *tag)
            .ok_or_else(|| NotationError::Other(format!("unknown sync event: {}", event)))?;
        let value = if payload.is_null() {
            json!({ "type": tag })
        } else {
            json!({ "type": tag, "payload": payload })
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// Main-window side: applies the detached window's messages to the session
pub struct SyncBridge;

impl SyncBridge {
    pub fn snapshot(session: &NotationSession) -> ClipSnapshot {
        let clip = session.current_clip().cloned();
        let note = clip
            .as_ref()
            .and_then(|c| session.note(&c.id))
            .map(|n| n.to_data());
        ClipSnapshot {
            clip_id: clip.as_ref().map(|c| c.id.clone()),
            clip_index: session.sorted_clip_position().unwrap_or(session.current_clip_index()),
            total_clips: session.clips().len(),
            bareme: session.current_bareme().cloned(),
            note,
            hide_totals: session.hide_totals(),
            clip,
        }
    }

    fn note_echo(session: &NotationSession, clip_id: &str) -> SyncMessage {
        SyncMessage::NoteUpdated(NoteUpdate {
            clip_id: clip_id.to_string(),
            note: session.note(clip_id).map(|n| n.to_data()),
        })
    }

    /// Apply one message and return the reply to send back, if any.
    ///
    /// Edits are answered with the edited clip's note (even when the edit was refused,
    /// so the mirror drops its optimistic value); undo and navigation with a new snapshot.
    pub fn handle(session: &mut NotationSession, message: SyncMessage) -> Option<SyncMessage> {
        let tag = message.type_tag();
        match message {
            SyncMessage::RequestSnapshot => Some(SyncMessage::Snapshot(Self::snapshot(session))),
            SyncMessage::CriterionUpdated(update) => {
                session.update_criterion(&update.clip_id, &update.criterion_id, update.value);
                Some(Self::note_echo(session, &update.clip_id))
            }
            SyncMessage::TextNotesUpdated(update) => {
                session.set_text_notes(&update.clip_id, &update.text);
                Some(Self::note_echo(session, &update.clip_id))
            }
            SyncMessage::CriterionNoteUpdated(update) => {
                session.set_criterion_note(&update.clip_id, &update.criterion_id, &update.text);
                Some(Self::note_echo(session, &update.clip_id))
            }
            SyncMessage::CategoryNoteUpdated(update) => {
                session.set_category_note(&update.clip_id, &update.category, &update.text);
                Some(Self::note_echo(session, &update.clip_id))
            }
            SyncMessage::Undo => {
                session.undo();
                Some(SyncMessage::Snapshot(Self::snapshot(session)))
            }
            SyncMessage::NavigateClip(nav) => {
                session.navigate(nav.direction);
                Some(SyncMessage::Snapshot(Self::snapshot(session)))
            }
            SyncMessage::Snapshot(_) | SyncMessage::NoteUpdated(_) => {
                log::debug!("Main window ignores {} messages", tag);
                None
            }
        }
    }
}

/// Detached-window mirror of the current clip.
///
/// Messages are applied in arrival order and the latest write to a field wins:
/// a snapshot replaces everything, a note echo replaces the note, a local edit
/// replaces the one field it touches.
#[derive(Debug, Clone, Default)]
pub struct DetachedNotes {
    snapshot: Option<ClipSnapshot>,
}

impl DetachedNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&ClipSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn note(&self) -> Option<&NoteData> {
        self.snapshot.as_ref().and_then(|s| s.note.as_ref())
    }

    /// True until the first snapshot arrives
    pub fn needs_resync(&self) -> bool {
        self.snapshot.is_none()
    }

    pub fn request_resync(&self) -> SyncMessage {
        SyncMessage::RequestSnapshot
    }

    fn clip_id(&self) -> Option<String> {
        self.snapshot.as_ref().and_then(|s| s.clip_id.clone())
    }

    /// Apply a message from the main window; returns whether the mirror changed
    pub fn apply(&mut self, message: SyncMessage) -> bool {
        match message {
            SyncMessage::Snapshot(snapshot) => {
                self.snapshot = Some(snapshot);
                true
            }
            SyncMessage::NoteUpdated(update) => match self.snapshot.as_mut() {
                Some(snapshot) if snapshot.clip_id.as_deref() == Some(update.clip_id.as_str()) => {
                    snapshot.note = update.note;
                    true
                }
                _ => false,
            },
            other => {
                log::debug!("Detached notes ignore {} messages", other.type_tag());
                false
            }
        }
    }

    fn note_mut(&mut self) -> Option<&mut NoteData> {
        let snapshot = self.snapshot.as_mut()?;
        let clip_id = snapshot.clip_id.clone()?;
        let bareme_id = snapshot.bareme.as_ref().map(|b| b.id.clone()).unwrap_or_default();
        Some(snapshot.note.get_or_insert_with(|| NoteData {
            clip_id,
            bareme_id,
            ..NoteData::default()
        }))
    }

    /// Optimistic criterion edit; `None` without a current clip
    pub fn edit_criterion(&mut self, criterion_id: &str, value: impl Into<ScoreValue>) -> Option<SyncMessage> {
        let clip_id = self.clip_id()?;
        let value = value.into();
        let note = self.note_mut()?;
        note.scores.insert(
            criterion_id.to_string(),
            CriterionScoreData {
                criterion_id: criterion_id.to_string(),
                value: value.clone(),
                is_valid: true,
            },
        );
        Some(SyncMessage::CriterionUpdated(CriterionUpdate {
            clip_id,
            criterion_id: criterion_id.to_string(),
            value,
        }))
    }

    pub fn edit_text_notes(&mut self, text: &str) -> Option<SyncMessage> {
        let clip_id = self.clip_id()?;
        self.note_mut()?.text_notes = text.to_string();
        Some(SyncMessage::TextNotesUpdated(TextNotesUpdate { clip_id, text: text.to_string() }))
    }

    pub fn edit_criterion_note(&mut self, criterion_id: &str, text: &str) -> Option<SyncMessage> {
        let clip_id = self.clip_id()?;
        let note = self.note_mut()?;
        if text.is_empty() {
            note.criterion_notes.remove(criterion_id);
        } else {
            note.criterion_notes.insert(criterion_id.to_string(), text.to_string());
        }
        Some(SyncMessage::CriterionNoteUpdated(CriterionNoteUpdate {
            clip_id,
            criterion_id: criterion_id.to_string(),
            text: text.to_string(),
        }))
    }

    pub fn edit_category_note(&mut self, category: &str, text: &str) -> Option<SyncMessage> {
        let clip_id = self.clip_id()?;
        let note = self.note_mut()?;
        if text.is_empty() {
            note.category_notes.remove(category);
        } else {
            note.category_notes.insert(category.to_string(), text.to_string());
        }
        Some(SyncMessage::CategoryNoteUpdated(CategoryNoteUpdate {
            clip_id,
            category: category.to_string(),
            text: text.to_string(),
        }))
    }

    pub fn undo(&self) -> SyncMessage {
        SyncMessage::Undo
    }

    pub fn navigate(&self, direction: Direction) -> SyncMessage {
        SyncMessage::NavigateClip(Navigation { direction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bareme::{BaremeRegistry, Criterion};
    use crate::notation::NotationStore;

    fn session() -> NotationSession {
        let mut registry = BaremeRegistry::new();
        registry.set_current(Bareme::new(
            "b",
            "B",
            vec![Criterion::numeric("rythme", "Rythme", 10.0).with_category("Montage")],
        ));
        let mut session = NotationSession::with_store(NotationStore::with_registry(registry));
        let clips = ["Abe-One.mp4", "Bea-Two.mp4"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut clip = Clip::from_file(name, "", i as i64);
                clip.id = format!("c{}", i);
                clip
            })
            .collect();
        session.new_project("P", "Sam", clips);
        session
    }

    #[test]
    fn test_wire_shape_and_event_names() {
        let message = SyncMessage::CriterionUpdated(CriterionUpdate {
            clip_id: "c0".to_string(),
            criterion_id: "rythme".to_string(),
            value: ScoreValue::Number(7.5),
        });
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "criterionUpdated");
        assert_eq!(value["payload"]["clipId"], "c0");
        assert_eq!(value["payload"]["value"], 7.5);
        assert_eq!(message.event_name(), "notes:criterion-updated");

        let back = SyncMessage::from_event(message.event_name(), message.payload().unwrap()).unwrap();
        assert_eq!(back, message);

        assert_eq!(serde_json::to_value(SyncMessage::Undo).unwrap()["type"], "undo");
        assert_eq!(SyncMessage::from_event("notes:undo", Value::Null).unwrap(), SyncMessage::Undo);
        let nav = SyncMessage::from_event("notes:navigate-clip", json!({"direction": "prev"})).unwrap();
        assert_eq!(nav, SyncMessage::NavigateClip(Navigation { direction: Direction::Prev }));
        assert!(SyncMessage::from_event("notes:close", Value::Null).is_err());

        let inbound: Vec<&str> = main_window_event_names().collect();
        assert_eq!(inbound.len(), 7);
        assert!(!inbound.contains(&"main:clip-data"));
    }

    #[test]
    fn test_bridge_applies_edits_and_echoes_note() {
        let mut session = session();
        let reply = SyncBridge::handle(
            &mut session,
            SyncMessage::CriterionUpdated(CriterionUpdate {
                clip_id: "c0".to_string(),
                criterion_id: "rythme".to_string(),
                value: ScoreValue::Text("12".to_string()),
            }),
        );
        let Some(SyncMessage::NoteUpdated(update)) = reply else {
            panic!("expected a note echo");
        };
        let note = update.note.unwrap();
        assert_eq!(note.scores["rythme"].value, ScoreValue::Number(10.0));
        assert_eq!(note.final_score, 10.0);
        assert!(session.is_dirty());
        assert!(session.clips()[0].scored);
    }

    #[test]
    fn test_bridge_navigation_and_undo_send_snapshots() {
        let mut session = session();
        session.update_criterion("c0", "rythme", 4.0);

        let reply = SyncBridge::handle(&mut session, SyncMessage::NavigateClip(Navigation::default()));
        let Some(SyncMessage::Snapshot(snapshot)) = reply else {
            panic!("expected a snapshot");
        };
        assert_eq!(snapshot.clip_id.as_deref(), Some("c1"));
        assert_eq!(snapshot.clip_index, 1);
        assert_eq!(snapshot.total_clips, 2);
        assert!(snapshot.note.is_none());

        SyncBridge::handle(&mut session, SyncMessage::Undo);
        assert!(session.note("c0").is_none());
        assert!(SyncBridge::handle(&mut session, SyncMessage::Snapshot(snapshot)).is_none());
    }

    #[test]
    fn test_detached_round_trip_last_write_wins() {
        let mut main = session();
        let mut detached = DetachedNotes::new();
        assert!(detached.needs_resync());
        assert!(detached.edit_text_notes("lost").is_none());

        let reply = SyncBridge::handle(&mut main, detached.request_resync()).unwrap();
        assert!(detached.apply(reply));
        assert!(!detached.needs_resync());

        // Optimistic value, then the authoritative clamped echo replaces it
        let edit = detached.edit_criterion("rythme", 25.0).unwrap();
        assert_eq!(detached.note().unwrap().scores["rythme"].value, ScoreValue::Number(25.0));
        let echo = SyncBridge::handle(&mut main, edit).unwrap();
        assert!(detached.apply(echo));
        assert_eq!(detached.note().unwrap().scores["rythme"].value, ScoreValue::Number(10.0));

        let edit = detached.edit_category_note("Montage", "0:12 flash").unwrap();
        SyncBridge::handle(&mut main, edit);
        assert_eq!(main.note("c0").unwrap().category_notes()["Montage"], "0:12 flash");

        // Echo for another clip is ignored
        let stray = SyncMessage::NoteUpdated(NoteUpdate { clip_id: "c1".to_string(), note: None });
        assert!(!detached.apply(stray));
        assert!(detached.note().is_some());
    }
}
