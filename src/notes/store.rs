use super::list::{FlushStep, NoteList, NotesSnapshot, WriteOutcome, WriteTicket};
use super::NoteStoreError;
use crate::api::{AuthApi, NotesApi};
use crate::models::{NewNote, Note, NotePatch};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

pub(crate) const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// Owner of the in-memory notes and the only way to mutate them.
///
/// Every operation applies to local state and forwards to the backend. Borrows of the shared
/// state never cross an `.await`.
pub(crate) struct NoteStore<A, N> {
    auth: Rc<A>,
    notes: Rc<N>,
    state: Rc<RefCell<NoteList>>,
}

impl<A, N> Clone for NoteStore<A, N> {
    fn clone(&self) -> Self {
        Self {
            auth: Rc::clone(&self.auth),
            notes: Rc::clone(&self.notes),
            state: Rc::clone(&self.state),
        }
    }
}

impl<A: AuthApi, N: NotesApi> NoteStore<A, N> {
    pub fn new(auth: Rc<A>, notes: Rc<N>) -> Self {
        Self {
            auth,
            notes,
            state: Rc::new(RefCell::new(NoteList::default())),
        }
    }

    pub fn snapshot(&self) -> NotesSnapshot {
        self.state.borrow().snapshot()
    }

    /// Replaces the local list with the caller's notes (newest first) and selects the head.
    ///
    /// A response that arrives after a newer load (or a reset) is dropped.
    pub async fn load(&self) -> Result<(), NoteStoreError> {
        let seq = self.state.borrow_mut().begin_load();
        let result = self.notes.select_notes().await;

        let mut state = self.state.borrow_mut();
        if !state.is_current_load(seq) {
            debug!(seq, "dropping stale notes load");
            return Ok(());
        }

        match result {
            Ok(notes) => {
                state.replace_all(notes);
                info!(count = state.len(), "notes loaded");
                Ok(())
            }
            Err(e) if e.is_unauthorized() => Err(NoteStoreError::Unauthenticated),
            Err(e) => {
                warn!(error = %e, "loading notes failed");
                Err(NoteStoreError::LoadFailed(e))
            }
        }
    }

    /// Inserts an empty note for the signed-in user; on success it becomes the selected head.
    pub async fn create(&self) -> Result<Note, NoteStoreError> {
        let user = match self.auth.get_user().await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(NoteStoreError::Unauthenticated),
            Err(e) if e.is_unauthorized() => return Err(NoteStoreError::Unauthenticated),
            Err(e) => {
                warn!(error = %e, "create note: user lookup failed");
                return Err(NoteStoreError::CreateFailed {
                    reason: e.to_string(),
                });
            }
        };

        let row = NewNote {
            title: DEFAULT_NOTE_TITLE.to_string(),
            content: String::new(),
            user_id: user.id,
        };

        match self.notes.insert_note(&row).await {
            Ok(note) => {
                info!(id = %note.id, "note created");
                self.state.borrow_mut().prepend(note.clone());
                Ok(note)
            }
            Err(e) if e.is_unauthorized() => Err(NoteStoreError::Unauthenticated),
            Err(e) => {
                warn!(error = %e, "create note rejected");
                Err(NoteStoreError::CreateFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Applies `patch` locally right away. The returned ticket is pushed with [`Self::flush`].
    ///
    /// Empty patches, unknown ids and notes being deleted yield `None`.
    pub fn update(&self, id: &str, patch: NotePatch) -> Option<WriteTicket> {
        self.state.borrow_mut().apply_update(id, patch)
    }

    /// Pushes the note's unsent fields, one request at a time, until nothing is left.
    pub async fn flush(&self, ticket: &WriteTicket) -> WriteOutcome {
        let mut step = self.state.borrow_mut().begin_flush(ticket);
        loop {
            let patch = match step {
                FlushStep::Send(patch) => patch,
                FlushStep::Done(outcome) => {
                    self.state.borrow_mut().notify_if_idle();
                    if let WriteOutcome::Failed(e) = &outcome {
                        warn!(id = %ticket.id, error = %e, "saving note failed");
                    }
                    return outcome;
                }
            };

            let result = self.notes.update_note(&ticket.id, &patch).await;
            step = self
                .state
                .borrow_mut()
                .finish_send(&ticket.id, patch, result.as_ref().map(|_| ()));
        }
    }

    pub fn retry(&self, id: &str) -> Option<WriteTicket> {
        self.state.borrow_mut().retry(id)
    }

    pub fn pending_tickets(&self) -> Vec<WriteTicket> {
        self.state.borrow().pending_tickets()
    }

    /// Pushes every unsent edit and waits for writes already on the wire.
    ///
    /// Edits queued behind an in-flight write are drained by that write's own flush loop.
    pub async fn flush_all(&self) {
        for ticket in self.pending_tickets() {
            self.flush(&ticket).await;
        }
        let idle = self.state.borrow_mut().wait_idle();
        // A dropped sender means the list was reset; nothing is left to wait for.
        let _ = idle.await;
    }

    /// Deletes remotely, then removes locally whatever the backend answered.
    pub async fn delete(&self, id: &str) -> Result<(), NoteStoreError> {
        if !self.state.borrow_mut().mark_deleting(id) {
            debug!(id, "delete ignored: unknown note");
            return Ok(());
        }

        let result = self.notes.delete_note(id).await;
        self.state.borrow_mut().remove(id);

        match result {
            Ok(()) => {
                info!(id, "note deleted");
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "deleting note failed");
                Err(NoteStoreError::DeleteFailed {
                    id: id.to_string(),
                    source: e,
                })
            }
        }
    }

    pub fn select(&self, id: &str) -> bool {
        self.state.borrow_mut().select(id)
    }

    /// Forgets all local notes (sign-out). In-flight loads and writes are dropped.
    pub fn reset(&self) {
        self.state.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ApiErrorKind};
    use crate::notes::fakes::{note, FakeBackend};
    use crate::notes::list::WriteStatus;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;

    fn store_with(backend: FakeBackend) -> (NoteStore<FakeBackend, FakeBackend>, Rc<FakeBackend>) {
        let backend = Rc::new(backend);
        (
            NoteStore::new(Rc::clone(&backend), Rc::clone(&backend)),
            backend,
        )
    }

    fn scenario() -> FakeBackend {
        FakeBackend::signed_in(vec![
            note("1", "Shopping", "milk"),
            note("2", "Todo", "call mom"),
        ])
    }

    #[test]
    fn test_load_selects_first_note() {
        let (store, _) = store_with(scenario());
        block_on(store.load()).expect("load");

        let snap = store.snapshot();
        assert_eq!(snap.notes.len(), 2);
        assert_eq!(snap.selected_id(), Some("1"));
    }

    #[test]
    fn test_load_empty_selects_none() {
        let (store, _) = store_with(FakeBackend::signed_in(vec![]));
        block_on(store.load()).expect("load");

        let snap = store.snapshot();
        assert!(snap.notes.is_empty());
        assert!(snap.selected.is_none());
    }

    #[test]
    fn test_load_failure_keeps_state_and_maps_unauthorized() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");

        backend.fail_select(ApiError {
            kind: ApiErrorKind::Network,
            message: "offline".to_string(),
        });
        let err = block_on(store.load()).expect_err("load should fail");
        assert!(matches!(err, NoteStoreError::LoadFailed(_)));
        assert_eq!(store.snapshot().notes.len(), 2);

        backend.fail_select(ApiError::unauthorized());
        let err = block_on(store.load()).expect_err("load should fail");
        assert!(err.is_unauthenticated());
    }

    #[test]
    fn test_create_on_empty_list_selects_new_note() {
        let (store, backend) = store_with(FakeBackend::signed_in(vec![]));
        block_on(store.load()).expect("load");

        let created = block_on(store.create()).expect("create");
        assert_eq!(created.title_str(), "Untitled Note");
        assert_eq!(created.content_str(), "");

        let snap = store.snapshot();
        assert_eq!(snap.notes.len(), 1);
        assert_eq!(snap.selected_id(), Some(created.id.as_str()));

        let inserted = backend.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].user_id, "user-1");
    }

    #[test]
    fn test_create_prepends_to_existing_list() {
        let (store, _) = store_with(scenario());
        block_on(store.load()).expect("load");

        let created = block_on(store.create()).expect("create");
        let snap = store.snapshot();
        let ids: Vec<&str> = snap.notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![created.id.as_str(), "1", "2"]);
        assert_eq!(snap.selected_id(), Some(created.id.as_str()));
    }

    #[test]
    fn test_create_rejected_leaves_state_unchanged() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");
        let before = store.snapshot();

        backend.fail_insert(ApiError {
            kind: ApiErrorKind::Http,
            message: "null value in column \"user_id\"".to_string(),
        });
        let err = block_on(store.create()).expect_err("create should fail");
        match err {
            NoteStoreError::CreateFailed { reason } => assert!(reason.contains("user_id")),
            other => panic!("expected CreateFailed, got {other:?}"),
        }
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_create_without_user_is_unauthenticated() {
        let (store, backend) = store_with(FakeBackend::signed_out());
        let err = block_on(store.create()).expect_err("create should fail");
        assert!(matches!(err, NoteStoreError::Unauthenticated));
        assert!(backend.inserted().is_empty());
        assert!(store.snapshot().notes.is_empty());
    }

    #[test]
    fn test_update_applies_locally_then_flushes() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");

        let ticket = store
            .update("2", NotePatch::content("call dad"))
            .expect("ticket");
        assert_eq!(store.snapshot().notes[1].content_str(), "call dad");
        assert!(backend.updates().is_empty());

        assert!(matches!(block_on(store.flush(&ticket)), WriteOutcome::Synced));
        assert_eq!(
            backend.updates(),
            vec![("2".to_string(), NotePatch::content("call dad"))]
        );
        assert_eq!(store.snapshot().write_status("2"), WriteStatus::Synced);
        assert_eq!(backend.row("2").map(|n| n.content_str().to_string()).as_deref(), Some("call dad"));
    }

    #[test]
    fn test_superseded_ticket_does_not_send() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");

        let old = store.update("1", NotePatch::title("S")).expect("ticket");
        let new = store.update("1", NotePatch::title("Sh")).expect("ticket");

        assert!(matches!(block_on(store.flush(&old)), WriteOutcome::Superseded));
        assert!(backend.updates().is_empty());
        assert!(matches!(block_on(store.flush(&new)), WriteOutcome::Synced));
        assert_eq!(
            backend.updates(),
            vec![("1".to_string(), NotePatch::title("Sh"))]
        );
    }

    #[test]
    fn test_update_failure_marks_note_failed_and_retry_resends() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");

        backend.fail_next_update(ApiError {
            kind: ApiErrorKind::Network,
            message: "offline".to_string(),
        });
        let ticket = store.update("1", NotePatch::title("Groceries")).expect("ticket");
        assert!(matches!(block_on(store.flush(&ticket)), WriteOutcome::Failed(_)));

        // Local edit stays visible.
        let snap = store.snapshot();
        assert_eq!(snap.notes[0].title_str(), "Groceries");
        assert!(matches!(snap.write_status("1"), WriteStatus::Failed { .. }));

        let retry = store.retry("1").expect("retry ticket");
        assert!(matches!(block_on(store.flush(&retry)), WriteOutcome::Synced));
        assert_eq!(store.snapshot().write_status("1"), WriteStatus::Synced);
        assert_eq!(
            backend.row("1").map(|n| n.title_str().to_string()).as_deref(),
            Some("Groceries")
        );
    }

    #[test]
    fn test_delete_selected_moves_selection() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");
        assert_eq!(store.snapshot().selected_id(), Some("1"));

        block_on(store.delete("1")).expect("delete");
        let snap = store.snapshot();
        assert_eq!(snap.notes.len(), 1);
        assert_eq!(snap.selected_id(), Some("2"));
        assert!(backend.row("1").is_none());
    }

    #[test]
    fn test_delete_failure_still_removes_locally() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");

        backend.fail_delete(ApiError {
            kind: ApiErrorKind::Http,
            message: "boom".to_string(),
        });
        let err = block_on(store.delete("2")).expect_err("delete should report failure");
        assert!(matches!(err, NoteStoreError::DeleteFailed { ref id, .. } if id == "2"));

        let snap = store.snapshot();
        assert_eq!(snap.notes.len(), 1);
        assert_eq!(snap.selected_id(), Some("1"));
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");

        block_on(store.delete("9")).expect("noop");
        assert_eq!(store.snapshot().notes.len(), 2);
        assert!(backend.deleted().is_empty());
    }

    #[test]
    fn test_write_completing_after_delete_is_discarded() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let release = backend.hold_next_update();
        let ticket = store.update("1", NotePatch::title("late")).expect("ticket");
        let s2 = store.clone();
        let write = spawner
            .spawn_local_with_handle(async move { s2.flush(&ticket).await })
            .expect("spawn");
        pool.run_until_stalled();
        assert_eq!(backend.updates().len(), 1);

        pool.run_until(store.delete("1")).expect("delete");
        assert!(store.snapshot().notes.iter().all(|n| n.id != "1"));

        let _ = release.send(());
        let outcome = pool.run_until(write);
        assert!(matches!(outcome, WriteOutcome::Discarded));
        assert!(store.update("1", NotePatch::title("again")).is_none());
    }

    #[test]
    fn test_edits_during_in_flight_write_are_sent_in_order() {
        let (store, backend) = store_with(scenario());
        block_on(store.load()).expect("load");

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let release = backend.hold_next_update();
        let first = store.update("1", NotePatch::title("a")).expect("ticket");
        let s2 = store.clone();
        let write = spawner
            .spawn_local_with_handle(async move { s2.flush(&first).await })
            .expect("spawn");
        pool.run_until_stalled();

        let second = store.update("1", NotePatch::content("b")).expect("ticket");
        assert!(matches!(
            pool.run_until(store.flush(&second)),
            WriteOutcome::Deferred
        ));

        let _ = release.send(());
        assert!(matches!(pool.run_until(write), WriteOutcome::Synced));
        assert_eq!(
            backend.updates(),
            vec![
                ("1".to_string(), NotePatch::title("a")),
                ("1".to_string(), NotePatch::content("b")),
            ]
        );
        assert_eq!(store.snapshot().write_status("1"), WriteStatus::Synced);
    }

    #[test]
    fn test_stale_load_is_dropped_after_reset() {
        let (store, backend) = store_with(scenario());

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let release = backend.hold_next_select();
        let s2 = store.clone();
        let load = spawner
            .spawn_local_with_handle(async move { s2.load().await })
            .expect("spawn");
        pool.run_until_stalled();

        store.reset();
        let _ = release.send(());
        pool.run_until(load).expect("stale load is not an error");
        assert!(store.snapshot().notes.is_empty());
    }

    #[test]
    fn test_search_scenario_over_store_snapshot() {
        let (store, _) = store_with(scenario());
        block_on(store.load()).expect("load");
        let snap = store.snapshot();

        let hits = crate::notes::filter_notes(&snap.notes, "MOM");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
        assert_eq!(crate::notes::filter_notes(&snap.notes, "").len(), 2);
    }
}
