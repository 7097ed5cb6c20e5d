//! Global Application State
//!
//! Reactive state management using Leptos signals.

use daya::{Dropdown, FlashMessage, NavDrawer, Severity, ToastQueue};
use leptos::*;

use crate::api::{Role, UserProfile};

const SESSION_KEY: &str = "daya_session";

/// Signed-in user and their bearer token
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn is_owner(&self) -> bool {
        self.user.role == Role::Owner
    }
}

/// Global application state provided to all components
#[derive(Clone, Copy)]
pub struct GlobalState {
    pub session: RwSignal<Option<Session>>,
    /// Toasts on screen
    pub toasts: RwSignal<ToastQueue>,
    pub drawer: RwSignal<NavDrawer>,
    pub dropdown: RwSignal<Dropdown>,
    /// Global loading state
    pub loading: RwSignal<bool>,
    /// Current `window.innerWidth`
    pub viewport_width: RwSignal<f64>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        session: create_rw_signal(load_session()),
        toasts: create_rw_signal(ToastQueue::default()),
        drawer: create_rw_signal(NavDrawer::default()),
        dropdown: create_rw_signal(Dropdown::default()),
        loading: create_rw_signal(false),
        viewport_width: create_rw_signal(current_width()),
    };

    let width = state.viewport_width;
    window_event_listener(ev::resize, move |_| width.set(current_width()));

    provide_context(state);
}

impl GlobalState {
    pub fn token(&self) -> Option<String> {
        self.session.get_untracked().map(|s| s.token)
    }

    pub fn sign_in(&self, session: Session) {
        store_session(Some(&session));
        self.session.set(Some(session));
    }

    pub fn sign_out(&self) {
        store_session(None);
        self.session.set(None);
        self.dropdown.update(|d| d.hide());
    }

    /// Show a server flash; each toast removes itself after the queue ttl
    pub fn flash(&self, flash: &FlashMessage) {
        self.push_toast(flash.severity(), flash.message.clone());
    }

    pub fn show_success(&self, message: &str) {
        self.push_toast(Severity::Success, message.to_string());
    }

    pub fn show_error(&self, message: &str) {
        self.push_toast(Severity::Error, message.to_string());
    }

    fn push_toast(&self, severity: Severity, message: String) {
        let mut id = 0;
        let mut ttl = 0;
        self.toasts.update(|queue| {
            id = queue.push(severity, message, now_ms());
            ttl = queue.ttl_ms();
        });

        let toasts = self.toasts;
        gloo_timers::callback::Timeout::new(ttl_millis(ttl), move || {
            toasts.update(|queue| {
                queue.dismiss(id);
            });
        })
        .forget();
    }
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Timer delay; a ttl beyond `u32` saturates
fn ttl_millis(ttl_ms: u64) -> u32 {
    u32::try_from(ttl_ms).unwrap_or(u32::MAX)
}

fn current_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|w| w.as_f64())
        .unwrap_or(1024.0)
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

fn load_session() -> Option<Session> {
    let raw = local_storage()?.get_item(SESSION_KEY).ok()??;
    serde_json::from_str(&raw).ok()
}

fn store_session(session: Option<&Session>) {
    let Some(storage) = local_storage() else {
        return;
    };
    let _ = match session.and_then(|s| serde_json::to_string(s).ok()) {
        Some(raw) => storage.set_item(SESSION_KEY, &raw),
        None => storage.remove_item(SESSION_KEY),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_saturates() {
        assert_eq!(ttl_millis(3000), 3000);
        assert_eq!(ttl_millis(u64::MAX), u32::MAX);
    }

    #[test]
    fn test_session_roundtrips_through_storage_format() {
        let session = Session {
            token: "abc".to_string(),
            user: UserProfile {
                uid: "u1".to_string(),
                name: "Budi".to_string(),
                email: "budi@example.com".to_string(),
                role: Role::Tenant,
            },
        };
        let raw = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, session);
        assert!(!back.is_owner());
    }
}
