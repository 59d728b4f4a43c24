use leptos::prelude::*;
use tw_merge::*;

/// Vertically scrolling region that fills its flex parent.
#[component]
pub fn ScrollArea(children: Children, #[prop(into, optional)] class: String) -> impl IntoView {
    let merged_class = tw_merge!("relative overflow-hidden", class);

    view! {
        <div data-name="ScrollArea" class=merged_class>
            <div
                data-name="ScrollAreaViewport"
                class="size-full overflow-y-auto rounded-[inherit] outline-none focus-visible:ring-[3px] focus-visible:ring-ring/50"
            >
                {children()}
            </div>
        </div>
    }
}
