pub mod note_editor;
pub mod note_list;
pub mod ui;
