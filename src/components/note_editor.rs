use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input, Spinner, Textarea};
use crate::models::NotePatch;
use crate::notes::WriteStatus;
use crate::state::{AppContext, NoteSyncController};
use icons::Trash2;
use leptos::prelude::*;

/// Editor for the selected note. Every keystroke goes straight to the store; pushing is debounced
/// by the controller.
#[component]
pub fn NoteEditor() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let state = app_state.0;

    let selected_id = Memo::new(move |_| state.notes.with(|s| s.selected_id().map(str::to_string)));

    view! {
        <section class="flex min-w-0 flex-1 flex-col">
            {move || match selected_id.get() {
                Some(id) => view! { <EditorPane id=id /> }.into_any(),
                None => view! {
                    <div class="flex flex-1 items-center justify-center text-sm text-muted-foreground">
                        "Select a note or create one"
                    </div>
                }
                .into_any(),
            }}
        </section>
    }
}

#[component]
fn EditorPane(id: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let controller = expect_context::<NoteSyncController>();
    let state = app_state.0;
    let id = StoredValue::new(id);

    let title = Signal::derive(move || {
        state.notes.with(|s| s.selected.as_ref().map(|n| n.title_str().to_string()).unwrap_or_default())
    });
    let content = Signal::derive(move || {
        state.notes.with(|s| s.selected.as_ref().map(|n| n.content_str().to_string()).unwrap_or_default())
    });
    let status = Signal::derive(move || state.notes.with(|s| id.with_value(|id| s.write_status(id))));

    let c_title = controller.clone();
    let on_title = Callback::new(move |value: String| {
        id.with_value(|id| c_title.on_note_changed(id, NotePatch::title(value)));
    });

    let c_content = controller.clone();
    let on_content = Callback::new(move |value: String| {
        id.with_value(|id| c_content.on_note_changed(id, NotePatch::content(value)));
    });

    let c_delete = controller.clone();
    let c_retry = controller;

    view! {
        <div class="flex items-center justify-between gap-2 border-b px-4 py-2">
            <SaveBadge status=status on_retry=Callback::new(move |_| id.with_value(|id| c_retry.retry(id))) />
            <Button
                variant=ButtonVariant::Ghost
                size=ButtonSize::Sm
                attr:aria-label="Delete note"
                on:click=move |_| id.with_value(|id| c_delete.delete(id))
            >
                <Trash2 />
                "Delete"
            </Button>
        </div>
        <div class="flex min-h-0 flex-1 flex-col gap-3 px-4 py-4">
            <Input
                class="h-auto border-0 px-0 text-lg font-semibold shadow-none focus-visible:ring-0 md:text-lg"
                placeholder="Title"
                value=title
                on_input=on_title
            />
            <Textarea
                class="flex-1 resize-none border-0 shadow-none focus-visible:ring-0"
                placeholder="Start writing…"
                value=content
                on_input=on_content
            />
        </div>
    }
}

#[component]
fn SaveBadge(status: Signal<WriteStatus>, on_retry: Callback<()>) -> impl IntoView {
    view! {
        <div class="flex items-center gap-2 text-xs text-muted-foreground">
            {move || {
                let s = status.get();
                match &s {
                    WriteStatus::Synced => view! { <span>{s.to_string()}</span> }.into_any(),
                    WriteStatus::Pending => view! {
                        <span class="inline-flex items-center gap-1">
                            <Spinner class="size-3" />
                            {s.to_string()}
                        </span>
                    }
                    .into_any(),
                    WriteStatus::Failed { message } => view! {
                        <span class="text-destructive" title=message.clone()>{s.to_string()}</span>
                        <Button
                            variant=ButtonVariant::Link
                            size=ButtonSize::Sm
                            class="h-auto px-1 text-xs"
                            on:click=move |_| on_retry.run(())
                        >
                            "Retry"
                        </Button>
                    }
                    .into_any(),
                }
            }}
        </div>
    }
}
