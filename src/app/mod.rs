use crate::pages::{LoginPage, NotesPage, SessionGate};
use crate::session::NOTES_ROUTE;
use crate::state::{AppContext, AppState, NoteSyncController};
use leptos::prelude::*;
use leptos_router::components::{Redirect, Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let app_state = AppContext(AppState::new());
    provide_context(app_state.clone());
    provide_context(NoteSyncController::new(app_state));

    // Router hooks (use_navigate in the gate) need to live under <Router>.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("notes") view=move || view! {
                    <SessionGate>
                        <NotesPage />
                    </SessionGate>
                } />
                <Route path=path!("") view=|| view! { <Redirect path=NOTES_ROUTE /> } />
            </Routes>
        </Router>
    }
}
