use crate::api::ApiError;
use crate::models::{Note, NotePatch};
use futures::channel::oneshot;
use std::collections::HashMap;

/// Sync state of a note's local edits, as shown next to the editor.
#[derive(Clone, Debug, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub(crate) enum WriteStatus {
    #[default]
    #[strum(serialize = "Saved")]
    Synced,
    #[strum(serialize = "Saving…")]
    Pending,
    #[strum(serialize = "Save failed")]
    Failed { message: String },
}

/// Handle for one local edit. Only the ticket carrying the note's latest version may push.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct WriteTicket {
    pub id: String,
    pub version: u64,
}

#[derive(Clone, Debug)]
pub(crate) enum WriteOutcome {
    /// Every local edit up to this ticket reached the backend.
    Synced,
    /// A newer edit exists; its ticket pushes instead.
    Superseded,
    /// Another write for the note is on the wire; it drains this edit when it returns.
    Deferred,
    /// The note was deleted or the list was reset.
    Discarded,
    Failed(ApiError),
}

/// Next thing the flush loop has to do.
#[derive(Clone, Debug)]
pub(crate) enum FlushStep {
    Send(NotePatch),
    Done(WriteOutcome),
}

#[derive(Clone, Debug, Default)]
struct NoteWrites {
    version: u64,
    /// Fields edited locally and not yet acknowledged.
    dirty: NotePatch,
    /// Fields on the wire right now; cleared when the backend answers.
    sending: Option<NotePatch>,
    in_flight: bool,
    deleting: bool,
    status: WriteStatus,
}

/// Immutable view handed to rendering code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NotesSnapshot {
    pub notes: Vec<Note>,
    pub selected: Option<Note>,
    /// Only notes that have been edited at least once appear here.
    pub writes: HashMap<String, WriteStatus>,
}

impl NotesSnapshot {
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|n| n.id.as_str())
    }

    pub fn write_status(&self, id: &str) -> WriteStatus {
        self.writes.get(id).cloned().unwrap_or_default()
    }
}

/// In-memory notes with selection and per-note write sequencing.
///
/// # Invariants
/// - `selected` is `None` or the id of an entry in `notes`.
/// - Every `writes` key is the id of an entry in `notes`.
/// - A note has at most one write in flight.
#[derive(Debug, Default)]
pub(crate) struct NoteList {
    notes: Vec<Note>,
    selected: Option<String>,
    writes: HashMap<String, NoteWrites>,
    /// Bumped by every load and reset; older load responses are dropped.
    load_seq: u64,
    /// Woken once no write is in flight.
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl NoteList {
    pub fn snapshot(&self) -> NotesSnapshot {
        NotesSnapshot {
            notes: self.notes.clone(),
            selected: self
                .selected
                .as_ref()
                .and_then(|id| self.find(id))
                .cloned(),
            writes: self
                .writes
                .iter()
                .map(|(id, w)| (id.clone(), w.status.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn find(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn begin_load(&mut self) -> u64 {
        self.load_seq = self.load_seq.saturating_add(1);
        self.load_seq
    }

    pub fn is_current_load(&self, seq: u64) -> bool {
        self.load_seq == seq
    }

    /// Replaces the list with freshly loaded rows and selects the head.
    ///
    /// Edits that have not reached the backend yet are replayed on top of the rows so the
    /// screen never jumps back to older text.
    pub fn replace_all(&mut self, mut notes: Vec<Note>) {
        self.writes
            .retain(|id, _| notes.iter().any(|n| &n.id == id));
        for note in notes.iter_mut() {
            if let Some(w) = self.writes.get(&note.id) {
                if let Some(sending) = &w.sending {
                    note.apply(sending);
                }
                note.apply(&w.dirty);
            }
        }

        self.selected = notes.first().map(|n| n.id.clone());
        self.notes = notes;
    }

    /// Puts a freshly created note at the head and selects it.
    pub fn prepend(&mut self, note: Note) {
        self.selected = Some(note.id.clone());
        self.notes.insert(0, note);
    }

    pub fn select(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    /// Applies `patch` locally and opens a new write version for the note.
    pub fn apply_update(&mut self, id: &str, patch: NotePatch) -> Option<WriteTicket> {
        if patch.is_empty() {
            return None;
        }
        if self.writes.get(id).is_some_and(|w| w.deleting) {
            return None;
        }

        let note = self.notes.iter_mut().find(|n| n.id == id)?;
        note.apply(&patch);

        let w = self.writes.entry(id.to_string()).or_default();
        w.version = w.version.saturating_add(1);
        w.dirty.merge(patch);
        w.status = WriteStatus::Pending;

        Some(WriteTicket {
            id: id.to_string(),
            version: w.version,
        })
    }

    pub fn begin_flush(&mut self, ticket: &WriteTicket) -> FlushStep {
        if self.find(&ticket.id).is_none() {
            return FlushStep::Done(WriteOutcome::Discarded);
        }
        let Some(w) = self.writes.get_mut(&ticket.id) else {
            return FlushStep::Done(WriteOutcome::Discarded);
        };
        if w.deleting {
            return FlushStep::Done(WriteOutcome::Discarded);
        }
        if w.version != ticket.version {
            return FlushStep::Done(WriteOutcome::Superseded);
        }
        if w.in_flight {
            return FlushStep::Done(WriteOutcome::Deferred);
        }

        Self::next_send(w)
    }

    /// Records the backend's answer for `sent` and decides whether more edits must go out.
    pub fn finish_send(
        &mut self,
        id: &str,
        sent: NotePatch,
        result: Result<(), &ApiError>,
    ) -> FlushStep {
        let Some(w) = self.writes.get_mut(id) else {
            return FlushStep::Done(WriteOutcome::Discarded);
        };
        w.in_flight = false;
        w.sending = None;

        if w.deleting {
            return FlushStep::Done(WriteOutcome::Discarded);
        }

        match result {
            Ok(()) => Self::next_send(w),
            Err(e) => {
                let mut restored = sent;
                restored.merge(std::mem::take(&mut w.dirty));
                w.dirty = restored;
                w.status = WriteStatus::Failed {
                    message: e.to_string(),
                };
                FlushStep::Done(WriteOutcome::Failed(e.clone()))
            }
        }
    }

    fn next_send(w: &mut NoteWrites) -> FlushStep {
        if w.dirty.is_empty() {
            w.status = WriteStatus::Synced;
            return FlushStep::Done(WriteOutcome::Synced);
        }
        let patch = std::mem::take(&mut w.dirty);
        w.in_flight = true;
        w.sending = Some(patch.clone());
        w.status = WriteStatus::Pending;
        FlushStep::Send(patch)
    }

    pub fn has_in_flight(&self) -> bool {
        self.writes.values().any(|w| w.in_flight)
    }

    /// Receiver that resolves once no write is in flight. Resolves at once when idle.
    pub fn wait_idle(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if self.has_in_flight() {
            self.idle_waiters.push(tx);
        } else {
            let _ = tx.send(());
        }
        rx
    }

    /// Wakes idle waiters when the last in-flight write has settled.
    pub fn notify_if_idle(&mut self) {
        if self.has_in_flight() {
            return;
        }
        for tx in self.idle_waiters.drain(..) {
            let _ = tx.send(());
        }
    }

    /// New ticket for a note whose last write failed.
    pub fn retry(&mut self, id: &str) -> Option<WriteTicket> {
        let w = self.writes.get_mut(id)?;
        if !matches!(w.status, WriteStatus::Failed { .. }) || w.dirty.is_empty() || w.deleting {
            return None;
        }
        w.version = w.version.saturating_add(1);
        w.status = WriteStatus::Pending;
        Some(WriteTicket {
            id: id.to_string(),
            version: w.version,
        })
    }

    /// Tickets at the current version for every note with unsent edits.
    pub fn pending_tickets(&self) -> Vec<WriteTicket> {
        let mut out: Vec<WriteTicket> = self
            .writes
            .iter()
            .filter(|(_, w)| !w.dirty.is_empty() && !w.in_flight && !w.deleting)
            .map(|(id, w)| WriteTicket {
                id: id.clone(),
                version: w.version,
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Blocks further writes for a note about to be deleted. Returns false for unknown ids.
    pub fn mark_deleting(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.writes.entry(id.to_string()).or_default().deleting = true;
        true
    }

    /// Removes exactly the entry with `id`, keeping the order of the rest.
    ///
    /// A removed selection falls back to the new head, or none.
    pub fn remove(&mut self, id: &str) -> Option<Note> {
        let idx = self.notes.iter().position(|n| n.id == id)?;
        let removed = self.notes.remove(idx);
        self.writes.remove(id);

        if self.selected.as_deref() == Some(id) {
            self.selected = self.notes.first().map(|n| n.id.clone());
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.selected = None;
        self.writes.clear();
        self.begin_load();
        self.notify_if_idle();
    }
}
