use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, ScrollArea, Spinner,
};
use crate::models::Note;
use crate::notes::filter_notes;
use crate::state::{AppContext, NoteSyncController};
use icons::{LogOut, Plus};
use leptos::prelude::*;

/// Placeholder text for list rows whose fields are blank.
pub(crate) fn row_title(note: &Note) -> &str {
    match note.title_str().trim() {
        "" => "Untitled",
        _ => note.title_str(),
    }
}

pub(crate) fn row_preview(note: &Note) -> String {
    let content = note.content_str().trim();
    if content.is_empty() {
        return "Empty note".to_string();
    }
    let first_line = content.lines().next().unwrap_or_default();
    first_line.chars().take(80).collect()
}

/// Sidebar: new note, search box, filtered list and sign out.
#[component]
pub fn NoteList() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let controller = expect_context::<NoteSyncController>();
    let state = app_state.0;

    let controller_new = controller.clone();
    let controller_retry = controller.clone();
    let controller_reload = controller.clone();
    let controller_sign_out = controller.clone();
    let controller_rows = StoredValue::new(controller);

    let visible = Memo::new(move |_| {
        let query = state.search_query.get();
        state.notes.with(|snap| {
            filter_notes(&snap.notes, &query)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
    });
    let selected_id = Memo::new(move |_| state.notes.with(|s| s.selected_id().map(str::to_string)));

    view! {
        <aside class="flex h-full w-72 shrink-0 flex-col border-r bg-background">
            <div class="flex items-center justify-between gap-2 px-3 py-3">
                <span class="text-sm font-medium">"Notes"</span>
                <Button
                    size=ButtonSize::Sm
                    attr:disabled=move || state.creating.get()
                    on:click=move |_| controller_new.create()
                >
                    <Show when=move || state.creating.get() fallback=|| view! { <Plus /> }>
                        <Spinner />
                    </Show>
                    "New Note"
                </Button>
            </div>

            <div class="px-3 pb-2">
                <Input
                    r#type="search"
                    placeholder="Search notes"
                    bind_value=state.search_query
                    class="h-8 text-sm"
                />
            </div>

            {move || {
                state.create_error.get().map(|e| {
                    let c = controller_retry.clone();
                    view! {
                        <div class="px-3 pb-2">
                            <Alert class="border-destructive/30">
                                <AlertDescription class="text-destructive text-xs">
                                    <span>{e}</span>
                                    <Button
                                        variant=ButtonVariant::Link
                                        size=ButtonSize::Sm
                                        class="h-auto px-1"
                                        on:click=move |_| c.create()
                                    >
                                        "Retry"
                                    </Button>
                                </AlertDescription>
                            </Alert>
                        </div>
                    }
                })
            }}

            {move || {
                state.notes_error.get().map(|e| {
                    let c = controller_reload.clone();
                    view! {
                        <div class="px-3 pb-2">
                            <Alert class="border-destructive/30">
                                <AlertDescription class="text-destructive text-xs">
                                    <span>{e}</span>
                                    <Button
                                        variant=ButtonVariant::Link
                                        size=ButtonSize::Sm
                                        class="h-auto px-1"
                                        on:click=move |_| c.load()
                                    >
                                        "Reload"
                                    </Button>
                                </AlertDescription>
                            </Alert>
                        </div>
                    }
                })
            }}

            <ScrollArea class="min-h-0 flex-1">
                <Show
                    when=move || !state.notes_loading.get()
                    fallback=|| view! {
                        <div class="px-3 py-4 text-xs text-muted-foreground">"Loading…"</div>
                    }
                >
                    <Show
                        when=move || !visible.get().is_empty()
                        fallback=move || {
                            let msg = if state.search_query.get().is_empty() {
                                "No notes yet"
                            } else {
                                "No matching notes"
                            };
                            view! { <div class="px-3 py-4 text-xs text-muted-foreground">{msg}</div> }
                        }
                    >
                        <ul class="flex flex-col gap-0.5 px-2 pb-2">
                            <For
                                each=move || visible.get()
                                key=|n| (n.id.clone(), n.title.clone(), n.content.clone())
                                children=move |note: Note| {
                                    let id = note.id.clone();
                                    let id_click = id.clone();
                                    let is_selected = Memo::new(move |_| selected_id.get().as_deref() == Some(id.as_str()));
                                    let title = row_title(&note).to_string();
                                    let preview = row_preview(&note);
                                    view! {
                                        <li>
                                            <button
                                                class="w-full rounded-md px-2 py-1.5 text-left hover:bg-accent"
                                                class:bg-accent=move || is_selected.get()
                                                aria-current=move || is_selected.get().then_some("true")
                                                on:click=move |_| {
                                                    controller_rows.with_value(|c| c.select(&id_click))
                                                }
                                            >
                                                <div class="truncate text-sm">{title}</div>
                                                <div class="truncate text-xs text-muted-foreground">{preview}</div>
                                            </button>
                                        </li>
                                    }
                                }
                            />
                        </ul>
                    </Show>
                </Show>
            </ScrollArea>

            <div class="border-t px-3 py-2">
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    class="w-full justify-start"
                    on:click=move |_| controller_sign_out.sign_out()
                >
                    <LogOut />
                    "Sign out"
                </Button>
            </div>
        </aside>
    }
}
