//! Navigation Component
//!
//! Header bar with the hamburger-driven side drawer and the profile
//! dropdown.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::state::global::GlobalState;

#[component]
pub fn Nav() -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let navigate = use_navigate();

    let user_name = move || {
        state
            .session
            .get()
            .map(|s| s.user.name)
            .unwrap_or_default()
    };

    let on_logout = move |_| {
        if let Some(token) = state.token() {
            spawn_local(async move {
                if let Err(e) = api::logout(&token).await {
                    web_sys::console::warn_1(&format!("Logout request failed: {}", e).into());
                }
            });
        }
        state.sign_out();
        navigate("/login", Default::default());
    };

    view! {
        <nav class="bg-white border-b border-gray-200">
            <div class="container mx-auto px-4">
                <div class="flex items-center justify-between h-16">
                    <div class="flex items-center space-x-3">
                        <button
                            id="hamburger"
                            class="text-2xl px-2"
                            on:click=move |_| state.drawer.update(|d| d.toggle())
                        >
                            "☰"
                        </button>
                        <A href="/" class="text-xl font-bold">"Daya"</A>
                    </div>

                    <Show when=move || state.session.get().is_some()>
                        <div class="relative">
                            <button
                                id="dropdown-toggle"
                                class="px-3 py-2 rounded-lg hover:bg-gray-100"
                                on:click=move |_| state.dropdown.update(|d| d.toggle())
                            >
                                {user_name}
                            </button>
                            <div
                                id="dropdown-menu"
                                class="absolute right-0 mt-2 w-40 bg-white rounded-lg shadow-lg"
                                style:display=move || state.dropdown.get().display()
                            >
                                <A href="/settings" class="block px-4 py-2 hover:bg-gray-100">
                                    "Pengaturan"
                                </A>
                                <button
                                    class="block w-full text-left px-4 py-2 hover:bg-gray-100"
                                    on:click=on_logout.clone()
                                >
                                    "Keluar"
                                </button>
                            </div>
                        </div>
                    </Show>
                </div>
            </div>

            <aside
                id="sidebar"
                class="fixed top-0 h-full w-64 bg-gray-800 text-white z-40 transition-all duration-300"
                style:left=move || state.drawer.get().left_offset()
            >
                <div class="flex justify-end p-4">
                    <button id="close-sidebar" on:click=move |_| state.drawer.update(|d| d.close())>
                        "✕"
                    </button>
                </div>
                <DrawerLink href="/" label="Dashboard" />
                <DrawerLink href="/bills" label="Tagihan" />
                <DrawerLink href="/settings" label="Pengaturan" />
            </aside>
        </nav>
    }
}

#[component]
fn DrawerLink(href: &'static str, label: &'static str) -> impl IntoView {
    let state = expect_context::<GlobalState>();

    view! {
        <div on:click=move |_| state.drawer.update(|d| d.close())>
            <A
                href=href
                class="block px-6 py-3 text-gray-300 hover:text-white hover:bg-gray-700"
                active_class="bg-gray-700 text-white"
            >
                {label}
            </A>
        </div>
    }
}
