//! Settings Page
//!
//! Lets the API base URL point at another Daya server.

use leptos::*;

use crate::api;
use crate::state::global::GlobalState;

#[component]
pub fn Settings() -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let base = create_rw_signal(api::get_api_base());

    let on_save = move |_| {
        api::set_api_base(&base.get_untracked());
        base.set(api::get_api_base());
        state.show_success("Pengaturan disimpan.");
    };

    view! {
        <div class="max-w-lg bg-white rounded-xl shadow p-6 space-y-4">
            <h1 class="text-2xl font-bold">"Pengaturan"</h1>
            <label class="block">
                <span class="text-sm text-gray-600">"URL API"</span>
                <input
                    type="url"
                    class="w-full border rounded px-3 py-2 mt-1"
                    prop:value=base
                    on:input=move |ev| base.set(event_target_value(&ev))
                />
            </label>
            <button
                class="px-4 py-2 bg-blue-600 hover:bg-blue-700 text-white rounded-lg"
                on:click=on_save
            >
                "Simpan"
            </button>
        </div>
    }
}
