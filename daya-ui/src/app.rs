//! App Root Component
//!
//! Routing, global providers and the page chrome.

use leptos::*;
use leptos_router::*;

use crate::components::{Nav, Toast};
use crate::pages::{Bills, Dashboard, Login, Settings};
use crate::state::global::{provide_global_state, GlobalState};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();

    view! {
        <Router>
            <div class="min-h-screen bg-gray-100 text-gray-900 flex flex-col">
                <Nav />

                <main class="flex-1 container mx-auto px-4 py-8">
                    <Routes>
                        <Route path="/" view=Dashboard />
                        <Route path="/login" view=Login />
                        <Route path="/bills" view=Bills />
                        <Route path="/settings" view=Settings />
                        <Route path="/*any" view=NotFound />
                    </Routes>
                </main>

                <Footer />
                <Toast />
            </div>
        </Router>
    }
}

#[component]
fn Footer() -> impl IntoView {
    let state = expect_context::<GlobalState>();

    view! {
        <footer class="bg-white border-t border-gray-200 py-3 px-4">
            <div class="container mx-auto flex items-center justify-between text-sm text-gray-500">
                <span>"Daya"</span>
                {move || {
                    if state.loading.get() {
                        view! {
                            <div class="flex items-center space-x-2 text-blue-500">
                                <div class="loading-spinner w-4 h-4" />
                                <span>"Memuat..."</span>
                            </div>
                        }.into_view()
                    } else {
                        view! {}.into_view()
                    }
                }}
            </div>
        </footer>
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center">
            <h1 class="text-3xl font-bold mb-2">"Halaman tidak ditemukan"</h1>
            <A
                href="/"
                class="px-6 py-3 bg-blue-600 hover:bg-blue-700 text-white rounded-lg font-medium"
            >
                "Kembali ke Dashboard"
            </A>
        </div>
    }
}
