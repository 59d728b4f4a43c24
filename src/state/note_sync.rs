use crate::models::{NotePatch, Session};
use crate::notes::{WriteOutcome, WriteTicket};
use crate::session::{needs_initial_load, sign_out, LOGIN_ROUTE};
use crate::state::AppContext;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::{window_event_listener, WindowListenerHandle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use wasm_bindgen::JsCast;

/// Bridges UI events to the note store.
///
/// Responsibilities:
/// - run store operations on the local task queue and publish snapshots afterwards
/// - per-note debounce of edits before they are pushed
/// - best-effort pagehide flush of unsent edits
/// - bounce to the login route when the backend rejects the session
#[derive(Clone)]
pub(crate) struct NoteSyncController {
    app_state: AppContext,

    /// Per-note debounce timers.
    autosave_ms: i32,
    autosave_timers: Arc<Mutex<HashMap<String, i32>>>,

    /// Global listener (keep handle alive).
    _pagehide_handle: StoredValue<Option<WindowListenerHandle>>,
}

impl NoteSyncController {
    pub fn new(app_state: AppContext) -> Self {
        let autosave_ms = app_state.0.config.with_value(|c| c.autosave_ms);

        let s = Self {
            app_state,
            autosave_ms,
            autosave_timers: Arc::new(Mutex::new(HashMap::new())),
            _pagehide_handle: StoredValue::new(None),
        };

        s.start_global_listeners();
        s
    }

    fn state(&self) -> crate::state::AppState {
        self.app_state.0
    }

    /// Loads notes the first time a session is seen; later calls for the same user are no-ops.
    pub fn start_session(&self, session: &Session) {
        let loaded_for = self.state().notes_loaded_for.get_untracked();
        if !needs_initial_load(loaded_for.as_deref(), session) {
            return;
        }

        self.state().notes_loaded_for.set(Some(session.user.id.clone()));
        self.load();
    }

    pub fn load(&self) {
        let state = self.state();
        state.notes_loading.set(true);
        state.notes_error.set(None);

        let store = state.store();
        let s2 = self.clone();
        spawn_local(async move {
            let result = store.load().await;
            state.publish();
            match result {
                Ok(()) => {}
                Err(e) if e.is_unauthenticated() => s2.force_login(),
                Err(e) => state.notes_error.set(Some(e.to_string())),
            }
            state.notes_loading.set(false);
        });
    }

    pub fn create(&self) {
        let state = self.state();
        if state.creating.get_untracked() {
            return;
        }
        state.creating.set(true);
        state.create_error.set(None);

        let store = state.store();
        let s2 = self.clone();
        spawn_local(async move {
            match store.create().await {
                Ok(_) => state.publish(),
                Err(e) if e.is_unauthenticated() => s2.force_login(),
                Err(e) => state.create_error.set(Some(e.to_string())),
            }
            state.creating.set(false);
        });
    }

    pub fn select(&self, id: &str) {
        if self.state().store().select(id) {
            self.state().publish();
        }
    }

    /// Called by the editor on each input.
    pub fn on_note_changed(&self, id: &str, patch: NotePatch) {
        let Some(ticket) = self.state().store().update(id, patch) else {
            return;
        };
        self.state().publish();
        self.schedule_autosave(ticket);
    }

    pub fn retry(&self, id: &str) {
        if let Some(ticket) = self.state().store().retry(id) {
            self.state().publish();
            self.flush(ticket);
        }
    }

    pub fn delete(&self, id: &str) {
        self.cancel_autosave(id);

        let state = self.state();
        state.notes_error.set(None);

        let store = state.store();
        let id = id.to_string();
        let s2 = self.clone();
        spawn_local(async move {
            let result = store.delete(&id).await;
            state.publish();
            match result {
                Ok(()) => {}
                Err(e) if e.is_unauthenticated() => s2.force_login(),
                Err(e) => state.notes_error.set(Some(e.to_string())),
            }
        });
    }

    pub fn sign_out(&self) {
        self.cancel_all_autosaves();

        let state = self.state();
        let client = state.client();
        let store = state.store();
        spawn_local(async move {
            sign_out(client.as_ref(), &store).await;
            state.notes_loaded_for.set(None);
            state.notes_loading.set(true);
            state.search_query.set(String::new());
            state.publish();
            info!("signed out");
            let _ = window().location().set_href(LOGIN_ROUTE);
        });
    }

    /// Drops the rejected session and sends the user to sign in again.
    fn force_login(&self) {
        debug!("session rejected by backend; redirecting to login");
        self.cancel_all_autosaves();

        let state = self.state();
        state.client().clear_session();
        state.store().reset();
        state.notes_loaded_for.set(None);
        state.notes_loading.set(true);
        state.publish();
        let _ = window().location().set_href(LOGIN_ROUTE);
    }

    fn flush(&self, ticket: WriteTicket) {
        let state = self.state();
        let store = state.store();
        let s2 = self.clone();
        spawn_local(async move {
            let outcome = store.flush(&ticket).await;
            state.publish();
            if let WriteOutcome::Failed(e) = outcome {
                if e.is_unauthorized() {
                    s2.force_login();
                }
            }
        });
    }

    fn schedule_autosave(&self, ticket: WriteTicket) {
        let Some(win) = web_sys::window() else {
            return;
        };

        let id = ticket.id.clone();
        self.cancel_autosave(&id);

        let s2 = self.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            if let Ok(mut map) = s2.autosave_timers.lock() {
                map.remove(&ticket.id);
            }
            s2.flush(ticket);
        });

        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                self.autosave_ms,
            )
            .unwrap_or(0);

        if let Ok(mut map) = self.autosave_timers.lock() {
            map.insert(id, tid);
        }
    }

    fn cancel_autosave(&self, id: &str) {
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Ok(mut map) = self.autosave_timers.lock() {
            if let Some(tid) = map.remove(id) {
                win.clear_timeout_with_handle(tid);
            }
        }
    }

    fn cancel_all_autosaves(&self) {
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Ok(mut map) = self.autosave_timers.lock() {
            for (_, tid) in map.drain() {
                win.clear_timeout_with_handle(tid);
            }
        }
    }

    fn start_global_listeners(&self) {
        // pagehide -> push everything still waiting on a debounce timer
        let s2 = self.clone();
        let pagehide =
            window_event_listener(ev::pagehide, move |_ev: web_sys::PageTransitionEvent| {
                s2.pagehide_flush();
            });
        self._pagehide_handle.set_value(Some(pagehide));
    }

    fn pagehide_flush(&self) {
        self.cancel_all_autosaves();
        for ticket in self.state().store().pending_tickets() {
            self.flush(ticket);
        }
    }
}
