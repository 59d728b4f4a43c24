//! Client-side note state: the in-memory list, its write sequencing, and search.

#[cfg(test)]
pub(crate) mod fakes;
mod list;
mod search;
mod store;

use crate::api::ApiError;

pub(crate) use list::{NotesSnapshot, WriteOutcome, WriteStatus, WriteTicket};
pub(crate) use search::filter_notes;
pub(crate) use store::NoteStore;

#[derive(Clone, Debug, thiserror::Error)]
pub(crate) enum NoteStoreError {
    #[error("not signed in")]
    Unauthenticated,
    #[error("could not load notes: {0}")]
    LoadFailed(#[source] ApiError),
    #[error("could not create note: {reason}")]
    CreateFailed { reason: String },
    #[error("could not delete note: {source}")]
    DeleteFailed {
        id: String,
        #[source]
        source: ApiError,
    },
}

impl NoteStoreError {
    /// True when the backend no longer accepts the session and the user must sign in again.
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            Self::Unauthenticated => true,
            Self::LoadFailed(e) | Self::DeleteFailed { source: e, .. } => e.is_unauthorized(),
            Self::CreateFailed { .. } => false,
        }
    }
}
