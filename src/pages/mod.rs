use crate::components::note_editor::NoteEditor;
use crate::components::note_list::NoteList;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, Card, CardContent, CardDescription, CardHeader,
    CardTitle, Input, Label, Spinner,
};
use crate::session::{check_session, GateOutcome, GateState, LOGIN_ROUTE, NOTES_ROUTE};
use crate::state::{AppContext, NoteSyncController};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use leptos_router::NavigateOptions;
use tracing::info;

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get();
        let password_val = password.get();
        let client = app_state.0.client();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match client.sign_in_with_password(&email_val, &password_val).await {
                Ok(session) => {
                    client.save_to_storage();
                    info!(user = %session.user.id, "signed in");
                    let _ = window().location().set_href(NOTES_ROUTE);
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <span class="text-sm font-medium text-foreground">"QuickNote"</span>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Log in"</CardTitle>
                        <CardDescription class="text-xs">"Use your email and password to continue."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Email"</Label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    placeholder="you@example.com"
                                    bind_value=email
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            {move || {
                                error.get().map(|e| {
                                    view! {
                                        <Alert class="border-destructive/30">
                                            <AlertDescription class="text-destructive text-xs">
                                                {e}
                                            </AlertDescription>
                                        </Alert>
                                    }
                                })
                            }}

                            <Button
                                class="w-full"
                                size=ButtonSize::Sm
                                attr:disabled=move || loading.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Continue" }}
                                </span>
                            </Button>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

/// Guards its children behind an authenticated session.
///
/// Shows a loading state while the session is checked, redirects to the login route when there
/// is none, and kicks off the initial note load when there is.
#[component]
pub fn SessionGate(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let controller = expect_context::<NoteSyncController>();
    let navigate = StoredValue::new(use_navigate());

    let gate: RwSignal<GateState> = RwSignal::new(GateState::Checking);

    // No tracked reads: runs once after mount.
    Effect::new(move |_| {
        let client = app_state.0.client();
        spawn_local(async move {
            let outcome = check_session(client.as_ref()).await;
            gate.set(GateState::Resolved(outcome));
        });
    });

    Effect::new(move |_| match gate.get() {
        GateState::Checking => {}
        GateState::Resolved(GateOutcome::Authenticated(session)) => {
            controller.start_session(&session);
        }
        GateState::Resolved(GateOutcome::Redirect) => {
            navigate.with_value(|nav| {
                nav(
                    LOGIN_ROUTE,
                    NavigateOptions {
                        replace: true,
                        ..Default::default()
                    },
                )
            });
        }
    });

    let children = StoredValue::new(children);

    view! {
        <Show
            when=move || gate.with(|g| g.session().is_some())
            fallback=|| view! {
                <div class="flex min-h-screen items-center justify-center gap-2 text-sm text-muted-foreground">
                    <Spinner />
                    "Loading…"
                </div>
            }
        >
            {move || children.with_value(|c| c())}
        </Show>
    }
}

#[component]
pub fn NotesPage() -> impl IntoView {
    view! {
        <div class="flex h-screen bg-background text-foreground">
            <NoteList />
            <NoteEditor />
        </div>
    }
}
