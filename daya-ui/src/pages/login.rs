use leptos::*;
use leptos_router::*;

use crate::api;
use crate::state::global::{GlobalState, Session};

#[component]
pub fn Login() -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let navigate = use_navigate();

    let email = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let navigate = navigate.clone();
        spawn_local(async move {
            state.loading.set(true);
            match api::login(&email.get_untracked(), &password.get_untracked()).await {
                Ok(notice) => {
                    state.sign_in(Session {
                        token: notice.data.token,
                        user: notice.data.user,
                    });
                    state.flash(&notice.flash);
                    navigate("/", Default::default());
                }
                Err(e) => state.show_error(&e),
            }
            state.loading.set(false);
        });
    };

    view! {
        <div class="max-w-sm mx-auto bg-white rounded-xl shadow p-6">
            <h1 class="text-2xl font-bold mb-6">"Masuk"</h1>
            <form on:submit=on_submit class="space-y-4">
                <input
                    type="email"
                    placeholder="Email"
                    class="w-full border rounded px-3 py-2"
                    prop:value=email
                    on:input=move |ev| email.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    class="w-full border rounded px-3 py-2"
                    prop:value=password
                    on:input=move |ev| password.set(event_target_value(&ev))
                />
                <button
                    type="submit"
                    class="w-full py-2 bg-blue-600 hover:bg-blue-700 text-white rounded-lg"
                    prop:disabled=move || state.loading.get()
                >
                    "Masuk"
                </button>
            </form>
        </div>
    }
}
