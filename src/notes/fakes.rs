//! In-memory backend for store and session tests.

use crate::api::{ApiError, ApiResult, AuthApi, NotesApi};
use crate::models::{NewNote, Note, NotePatch, Session, User};
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};

pub(crate) fn note(id: &str, title: &str, content: &str) -> Note {
    Note {
        id: id.to_string(),
        title: Some(title.to_string()),
        content: Some(content.to_string()),
        created_at: format!("2024-05-01T00:00:0{}Z", id.len()),
        user_id: Some("user-1".to_string()),
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    user: RefCell<Option<User>>,
    rows: RefCell<Vec<Note>>,
    inserted: RefCell<Vec<NewNote>>,
    updates: RefCell<Vec<(String, NotePatch)>>,
    deleted: RefCell<Vec<String>>,
    select_error: RefCell<Option<ApiError>>,
    insert_error: RefCell<Option<ApiError>>,
    next_update_error: RefCell<Option<ApiError>>,
    delete_error: RefCell<Option<ApiError>>,
    session_error: RefCell<Option<ApiError>>,
    held_update: RefCell<Option<oneshot::Receiver<()>>>,
    held_select: RefCell<Option<oneshot::Receiver<()>>>,
    sign_outs: Cell<u32>,
    next_id: Cell<u32>,
}

impl FakeBackend {
    pub fn signed_in(rows: Vec<Note>) -> Self {
        let backend = Self::default();
        *backend.user.borrow_mut() = Some(User {
            id: "user-1".to_string(),
            email: Some("u@example.com".to_string()),
        });
        *backend.rows.borrow_mut() = rows;
        backend
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn fail_select(&self, e: ApiError) {
        *self.select_error.borrow_mut() = Some(e);
    }

    pub fn fail_insert(&self, e: ApiError) {
        *self.insert_error.borrow_mut() = Some(e);
    }

    pub fn fail_next_update(&self, e: ApiError) {
        *self.next_update_error.borrow_mut() = Some(e);
    }

    pub fn fail_delete(&self, e: ApiError) {
        *self.delete_error.borrow_mut() = Some(e);
    }

    pub fn fail_session(&self, e: ApiError) {
        *self.session_error.borrow_mut() = Some(e);
    }

    /// The next `update_note` call waits until the returned sender fires.
    pub fn hold_next_update(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.held_update.borrow_mut() = Some(rx);
        tx
    }

    /// The next `select_notes` call waits until the returned sender fires.
    pub fn hold_next_select(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.held_select.borrow_mut() = Some(rx);
        tx
    }

    pub fn inserted(&self) -> Vec<NewNote> {
        self.inserted.borrow().clone()
    }

    pub fn updates(&self) -> Vec<(String, NotePatch)> {
        self.updates.borrow().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.borrow().clone()
    }

    pub fn sign_outs(&self) -> u32 {
        self.sign_outs.get()
    }

    pub fn row(&self, id: &str) -> Option<Note> {
        self.rows.borrow().iter().find(|n| n.id == id).cloned()
    }
}

impl AuthApi for FakeBackend {
    async fn get_session(&self) -> ApiResult<Option<Session>> {
        if let Some(e) = self.session_error.borrow().clone() {
            return Err(e);
        }
        Ok(self.user.borrow().clone().map(|user| Session {
            access_token: "jwt".to_string(),
            refresh_token: None,
            expires_at: None,
            user,
        }))
    }

    async fn get_user(&self) -> ApiResult<Option<User>> {
        Ok(self.user.borrow().clone())
    }

    async fn sign_out(&self) -> ApiResult<()> {
        self.sign_outs.set(self.sign_outs.get() + 1);
        *self.user.borrow_mut() = None;
        Ok(())
    }
}

impl NotesApi for FakeBackend {
    async fn select_notes(&self) -> ApiResult<Vec<Note>> {
        let held = self.held_select.borrow_mut().take();
        if let Some(rx) = held {
            let _ = rx.await;
        }
        if let Some(e) = self.select_error.borrow().clone() {
            return Err(e);
        }
        Ok(self.rows.borrow().clone())
    }

    async fn insert_note(&self, row: &NewNote) -> ApiResult<Note> {
        if let Some(e) = self.insert_error.borrow().clone() {
            return Err(e);
        }
        self.inserted.borrow_mut().push(row.clone());

        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let note = Note {
            id: format!("new-{n}"),
            title: Some(row.title.clone()),
            content: Some(row.content.clone()),
            created_at: format!("2024-06-01T00:00:{n:02}Z"),
            user_id: Some(row.user_id.clone()),
        };
        self.rows.borrow_mut().insert(0, note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: &str, patch: &NotePatch) -> ApiResult<()> {
        self.updates
            .borrow_mut()
            .push((id.to_string(), patch.clone()));

        let held = self.held_update.borrow_mut().take();
        if let Some(rx) = held {
            let _ = rx.await;
        }

        let failure = self.next_update_error.borrow_mut().take();
        if let Some(e) = failure {
            return Err(e);
        }

        if let Some(row) = self.rows.borrow_mut().iter_mut().find(|n| n.id == id) {
            row.apply(patch);
        }
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> ApiResult<()> {
        self.deleted.borrow_mut().push(id.to_string());
        if let Some(e) = self.delete_error.borrow().clone() {
            return Err(e);
        }
        self.rows.borrow_mut().retain(|n| n.id != id);
        Ok(())
    }
}
