use crate::api::{AuthApi, NotesApi};
use crate::models::Session;
use crate::notes::NoteStore;
use tracing::{debug, warn};

pub(crate) const LOGIN_ROUTE: &str = "/login";
pub(crate) const NOTES_ROUTE: &str = "/notes";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum GateOutcome {
    Authenticated(Session),
    /// No usable session: send the user to the login route.
    Redirect,
}

/// Precondition guard in front of the notes view. Moves from `Checking` to `Resolved` once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum GateState {
    #[default]
    Checking,
    Resolved(GateOutcome),
}

impl GateState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Resolved(GateOutcome::Authenticated(s)) => Some(s),
            _ => None,
        }
    }
}

/// Asks the auth backend for the active session.
///
/// Failing to reach the backend is indistinguishable from having no session.
pub(crate) async fn check_session<A: AuthApi>(auth: &A) -> GateOutcome {
    match auth.get_session().await {
        Ok(Some(session)) => GateOutcome::Authenticated(session),
        Ok(None) => GateOutcome::Redirect,
        Err(e) => {
            debug!(error = %e, "session check failed; treating as signed out");
            GateOutcome::Redirect
        }
    }
}

/// True when the notes for `session` have not been loaded yet in this app lifetime.
pub(crate) fn needs_initial_load(loaded_for: Option<&str>, session: &Session) -> bool {
    loaded_for != Some(session.user.id.as_str())
}

/// Pushes outstanding edits, clears local notes, then ends the backend session. Local state is
/// dropped even when the backend call fails.
pub(crate) async fn sign_out<A: AuthApi, N: NotesApi>(auth: &A, store: &NoteStore<A, N>) {
    store.flush_all().await;
    store.reset();
    if let Err(e) = auth.sign_out().await {
        warn!(error = %e, "remote sign-out failed");
    }
}
