mod auth;
mod notes;

use crate::config::EnvConfig;
use crate::models::{NewNote, Note, NotePatch, Session, User};
use crate::storage::{clear_session_storage, load_session_from_storage, save_session_to_storage};
use std::cell::RefCell;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    pub(crate) fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    pub(crate) fn http(status: reqwest::StatusCode, body: &str, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {}", backend_error_message(body)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Pulls the human-readable part out of an auth or REST error body.
///
/// Auth errors use `error_description` / `msg`, REST errors use `message`; anything else is
/// returned verbatim.
pub(crate) fn backend_error_message(body: &str) -> String {
    let Ok(v) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
        .map(|s| s.to_string())
        .unwrap_or_else(|| body.trim().to_string())
}

/// Session side of the backend.
pub(crate) trait AuthApi {
    /// Current non-expired session, if any.
    async fn get_session(&self) -> ApiResult<Option<Session>>;
    /// User behind the current session; `None` when the backend no longer accepts it.
    async fn get_user(&self) -> ApiResult<Option<User>>;
    async fn sign_out(&self) -> ApiResult<()>;
}

/// Row operations on the `notes` collection. Row-level access is enforced by the backend.
pub(crate) trait NotesApi {
    /// All notes of the caller, newest first.
    async fn select_notes(&self) -> ApiResult<Vec<Note>>;
    /// Inserts and returns the persisted row (with generated id and timestamp).
    async fn insert_note(&self, row: &NewNote) -> ApiResult<Note>;
    async fn update_note(&self, id: &str, patch: &NotePatch) -> ApiResult<()>;
    async fn delete_note(&self, id: &str) -> ApiResult<()>;
}

/// HTTP client for a Supabase project (`auth/v1` and `rest/v1`).
pub(crate) struct SupabaseClient {
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    session: RefCell<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            session: RefCell::new(None),
        }
    }

    pub fn load_from_storage(config: &EnvConfig) -> Self {
        let client = Self::new(config.supabase_url.clone(), config.supabase_anon_key.clone());
        *client.session.borrow_mut() = load_session_from_storage();
        client
    }

    pub fn save_to_storage(&self) {
        if let Some(session) = self.session.borrow().as_ref() {
            save_session_to_storage(session);
        }
    }

    pub fn set_session(&self, session: Session) {
        *self.session.borrow_mut() = Some(session);
    }

    pub fn stored_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Drops the in-memory and persisted session.
    pub fn clear_session(&self) {
        *self.session.borrow_mut() = None;
        clear_session_storage();
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer for requests: the user's access token, or the anon key before sign-in.
    pub(crate) fn bearer(&self) -> String {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn with_auth_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    pub(crate) async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        ctx: &str,
    ) -> ApiResult<T> {
        let res = self
            .with_auth_headers(req)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, &body, ctx))
        }
    }

    /// Like `request_json` for endpoints that answer with an empty body.
    pub(crate) async fn request_empty(
        &self,
        req: reqwest::RequestBuilder,
        ctx: &str,
    ) -> ApiResult<()> {
        let res = self
            .with_auth_headers(req)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(())
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, &body, ctx))
        }
    }
}
