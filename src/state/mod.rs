pub(crate) mod note_sync;

use crate::api::SupabaseClient;
use crate::config::EnvConfig;
use crate::notes::{NoteStore, NotesSnapshot};
use leptos::prelude::*;
use std::rc::Rc;

pub(crate) use note_sync::NoteSyncController;

pub(crate) type AppNoteStore = NoteStore<SupabaseClient, SupabaseClient>;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub config: StoredValue<EnvConfig>,

    /// Shared backend client; the note store holds the same instance.
    pub client: StoredValue<Rc<SupabaseClient>, LocalStorage>,
    pub store: StoredValue<AppNoteStore, LocalStorage>,

    /// Last snapshot published by the store. Rendering reads only this.
    pub notes: RwSignal<NotesSnapshot>,
    pub notes_loading: RwSignal<bool>,
    pub notes_error: RwSignal<Option<String>>,

    /// User id whose notes were loaded; guards the once-per-session initial load.
    pub notes_loaded_for: RwSignal<Option<String>>,

    pub creating: RwSignal<bool>,
    pub create_error: RwSignal<Option<String>>,

    /// Sidebar search box.
    pub search_query: RwSignal<String>,
}

impl AppState {
    pub fn new() -> Self {
        let config = EnvConfig::new();
        let client = Rc::new(SupabaseClient::load_from_storage(&config));
        let store = NoteStore::new(Rc::clone(&client), Rc::clone(&client));

        Self {
            config: StoredValue::new(config),
            client: StoredValue::new_local(client),
            store: StoredValue::new_local(store),
            notes: RwSignal::new(NotesSnapshot::default()),
            // The first load starts as soon as the gate resolves.
            notes_loading: RwSignal::new(true),
            notes_error: RwSignal::new(None),
            notes_loaded_for: RwSignal::new(None),
            creating: RwSignal::new(false),
            create_error: RwSignal::new(None),
            search_query: RwSignal::new(String::new()),
        }
    }

    pub fn client(&self) -> Rc<SupabaseClient> {
        self.client.get_value()
    }

    pub fn store(&self) -> AppNoteStore {
        self.store.get_value()
    }

    /// Copies the store's current state into the `notes` signal.
    pub fn publish(&self) {
        self.notes.set(self.store.with_value(|s| s.snapshot()));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
