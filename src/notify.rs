//! Toast Notifications
//!
//! Transient, time-dismissed notices. The queue is unbounded: every pushed
//! toast stays visible until its own ttl runs out.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default time a toast stays on screen
pub const DEFAULT_TOAST_TTL_MS: u64 = 3000;

/// Toast severity
///
/// Parsing never fails: unknown tags keep their text and get the fallback
/// treatment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Success,
    Warning,
    Error,
    Other(String),
}

impl Severity {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "success" => Severity::Success,
            "warning" => Severity::Warning,
            "error" | "danger" => Severity::Error,
            _ => Severity::Other(tag.to_string()),
        }
    }

    /// Background class for the toast element
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Success => "bg-green-500",
            Severity::Warning => "bg-yellow-500",
            Severity::Error => "bg-red-500",
            Severity::Other(_) => "bg-blue-500",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Severity {
    fn from(tag: String) -> Self {
        Severity::parse(&tag)
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

/// A flash message as emitted by the server or pre-rendered in the page
/// (`data-category` / `data-message`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: String,
    pub message: String,
}

impl FlashMessage {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("success", message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new("warning", message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("error", message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new("info", message)
    }

    pub fn severity(&self) -> Severity {
        Severity::parse(&self.category)
    }
}

/// A toast on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub created_at_ms: u64,
}

impl Toast {
    pub fn css_class(&self) -> String {
        format!(
            "{} text-white px-4 py-2 rounded shadow-md animate-slide-in-right",
            self.severity.css_class()
        )
    }

    pub fn expires_at_ms(&self, ttl_ms: u64) -> u64 {
        self.created_at_ms.saturating_add(ttl_ms)
    }
}

/// Toasts currently displayed
#[derive(Debug, Clone, PartialEq)]
pub struct ToastQueue {
    ttl_ms: u64,
    next_id: u64,
    toasts: Vec<Toast>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL_MS)
    }
}

impl ToastQueue {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            ttl_ms,
            next_id: 1,
            toasts: Vec::new(),
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Show a toast, returning its id
    pub fn push(&mut self, severity: Severity, message: impl Into<String>, now_ms: u64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            severity,
            message: message.into(),
            created_at_ms: now_ms,
        });
        id
    }

    /// Replay flash messages in order
    pub fn replay(&mut self, flashes: &[FlashMessage], now_ms: u64) -> Vec<u64> {
        flashes
            .iter()
            .map(|flash| self.push(flash.severity(), flash.message.clone(), now_ms))
            .collect()
    }

    /// Remove and return every toast whose ttl has elapsed by `now_ms`
    pub fn expire(&mut self, now_ms: u64) -> Vec<Toast> {
        let ttl = self.ttl_ms;
        let (expired, live): (Vec<Toast>, Vec<Toast>) = self
            .toasts
            .drain(..)
            .partition(|t| t.expires_at_ms(ttl) <= now_ms);
        self.toasts = live;
        expired
    }

    /// Remove a single toast (its timer fired)
    pub fn dismiss(&mut self, id: u64) -> Option<Toast> {
        let index = self.toasts.iter().position(|t| t.id == id)?;
        Some(self.toasts.remove(index))
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parsing() {
        assert_eq!(Severity::parse("success"), Severity::Success);
        assert_eq!(Severity::parse("WARNING"), Severity::Warning);
        assert_eq!(Severity::parse("danger"), Severity::Error);
        assert_eq!(Severity::parse("info"), Severity::Other("info".to_string()));
        assert_eq!(Severity::parse("info").css_class(), "bg-blue-500");
        assert_eq!(Severity::Error.css_class(), "bg-red-500");
    }

    #[test]
    fn test_unknown_severity_still_shown_then_removed() {
        let mut queue = ToastQueue::default();
        let id = queue.push(Severity::parse("mystery"), "Hello", 1_000);

        assert_eq!(queue.visible().len(), 1);
        assert!(queue.visible()[0].css_class().starts_with("bg-blue-500"));

        assert!(queue.expire(3_999).is_empty());
        let expired = queue.expire(4_000);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, id);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_toasts_accumulate_and_expire_individually() {
        let mut queue = ToastQueue::new(100);
        queue.push(Severity::Success, "first", 0);
        queue.push(Severity::Warning, "second", 50);
        queue.push(Severity::Error, "third", 50);
        assert_eq!(queue.visible().len(), 3);

        let expired = queue.expire(100);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].message, "first");
        assert_eq!(queue.visible().len(), 2);

        assert_eq!(queue.expire(150).len(), 2);
    }

    #[test]
    fn test_replay_flash_messages() {
        let mut queue = ToastQueue::default();
        let flashes = vec![
            FlashMessage::success("Kamar berhasil ditambahkan!"),
            FlashMessage::new("danger", "Email atau password salah!"),
        ];
        let ids = queue.replay(&flashes, 0);

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(queue.visible()[1].severity, Severity::Error);
        assert_eq!(queue.visible()[0].message, "Kamar berhasil ditambahkan!");
    }

    #[test]
    fn test_dismiss() {
        let mut queue = ToastQueue::default();
        let id = queue.push(Severity::Success, "ok", 0);
        assert!(queue.dismiss(id).is_some());
        assert!(queue.dismiss(id).is_none());
    }

    #[test]
    fn test_severity_serde() {
        let flash: FlashMessage =
            serde_json::from_str(r#"{"category":"warning","message":"m"}"#).unwrap();
        assert_eq!(flash.severity(), Severity::Warning);
        assert_eq!(serde_json::to_string(&Severity::Other("info".into())).unwrap(), "\"info\"");
    }
}
