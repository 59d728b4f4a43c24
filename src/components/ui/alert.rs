use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, div, "flex items-center justify-between gap-2 text-sm [&_p]:leading-relaxed"}
}

pub use components::*;
