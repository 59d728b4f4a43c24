use super::{ApiError, ApiResult, NotesApi, SupabaseClient};
use crate::models::{NewNote, Note, NotePatch};

const NOTES_PATH: &str = "/rest/v1/notes";

pub(crate) fn select_notes_path() -> String {
    format!("{NOTES_PATH}?select=*&order=created_at.desc")
}

/// Row filter for a single note, e.g. `/rest/v1/notes?id=eq.<id>`.
pub(crate) fn note_row_path(id: &str) -> String {
    format!("{NOTES_PATH}?id=eq.{}", urlencoding::encode(id))
}

impl NotesApi for SupabaseClient {
    async fn select_notes(&self) -> ApiResult<Vec<Note>> {
        let req = reqwest::Client::new().get(self.url(&select_notes_path()));
        self.request_json(req, "Load notes failed").await
    }

    async fn insert_note(&self, row: &NewNote) -> ApiResult<Note> {
        let req = reqwest::Client::new()
            .post(self.url(NOTES_PATH))
            .header("Prefer", "return=representation")
            .json(row);

        let rows: Vec<Note> = self.request_json(req, "Insert note failed").await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::parse("Insert note succeeded but returned no row"))
    }

    async fn update_note(&self, id: &str, patch: &NotePatch) -> ApiResult<()> {
        let req = reqwest::Client::new()
            .patch(self.url(&note_row_path(id)))
            .header("Prefer", "return=minimal")
            .json(patch);
        self.request_empty(req, "Update note failed").await
    }

    async fn delete_note(&self, id: &str) -> ApiResult<()> {
        let req = reqwest::Client::new().delete(self.url(&note_row_path(id)));
        self.request_empty(req, "Delete note failed").await
    }
}
