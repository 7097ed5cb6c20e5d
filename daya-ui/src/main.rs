//! Daya Dashboard
//!
//! Room power usage dashboard built with Leptos (WASM).
//!
//! # Features
//!
//! - Usage chart with month and week filters
//! - Toasts for server flash messages
//! - Slide-in navigation and profile dropdown
//! - Owner room overview and tenant bill status
//!
//! # Architecture
//!
//! Client-side rendered (CSR) Leptos application compiled to WebAssembly.
//! Bucketing and filtering run in the browser through the `daya` core; the
//! Daya API only supplies raw usage series and room data.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
