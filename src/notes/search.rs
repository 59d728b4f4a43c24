use crate::models::Note;

fn field_contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

/// Case-insensitive substring match on title or content.
pub(crate) fn note_matches(note: &Note, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    field_contains(note.title.as_deref(), &needle) || field_contains(note.content.as_deref(), &needle)
}

/// Notes matching `query`, in their original order. An empty query keeps everything.
pub(crate) fn filter_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    notes.iter().filter(|n| note_matches(n, query)).collect()
}
