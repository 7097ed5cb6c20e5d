//! Toast Notification Component
//!
//! Renders the global toast queue, stacked in push order. Removal is driven
//! by the timers started in `GlobalState::flash`.

use leptos::*;

use crate::state::global::GlobalState;

#[component]
pub fn Toast() -> impl IntoView {
    let state = expect_context::<GlobalState>();

    view! {
        <div id="toast-container" class="fixed top-4 right-4 z-50 space-y-2">
            <For
                each=move || state.toasts.get().visible().to_vec()
                key=|toast| toast.id
                children=move |toast| {
                    let id = toast.id;
                    view! {
                        <div
                            class=toast.css_class()
                            on:click=move |_| state.toasts.update(|q| { q.dismiss(id); })
                        >
                            <span class="text-sm font-medium">{toast.message.clone()}</span>
                        </div>
                    }
                }
            />
        </div>
    }
}
