//! Transaction status notifications.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// How long a success toast stays visible.
pub const SUCCESS_TOAST_TTL: Duration = Duration::from_secs(5);

/// Lifecycle of a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastStatus {
    /// Action running.
    Pending,
    /// Transaction confirmed.
    Success,
    /// Action aborted.
    Error,
}

/// A notification about one action.
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    /// Outcome so far.
    pub status: ToastStatus,
    /// Human-readable message.
    pub message: String,
    /// Transaction hash, once broadcast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip)]
    created_at: Instant,
}

impl Toast {
    fn new(status: ToastStatus, message: impl Into<String>, hash: Option<String>) -> Self {
        Self { status, message: message.into(), hash, created_at: Instant::now() }
    }

    /// Pending toast.
    pub fn pending(message: impl Into<String>) -> Self {
        Self::new(ToastStatus::Pending, message, None)
    }

    /// Pending toast for a broadcast transaction.
    pub fn pending_tx(message: impl Into<String>, hash: impl Into<String>) -> Self {
        Self::new(ToastStatus::Pending, message, Some(hash.into()))
    }

    /// Success toast.
    pub fn success(message: impl Into<String>, hash: impl Into<String>) -> Self {
        Self::new(ToastStatus::Success, message, Some(hash.into()))
    }

    /// Error toast.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastStatus::Error, message, None)
    }

    /// Success toasts expire; pending and error toasts stay until replaced.
    pub fn is_expired(&self) -> bool {
        self.status == ToastStatus::Success && self.created_at.elapsed() >= SUCCESS_TOAST_TTL
    }
}

/// Holds at most one toast per session.
#[derive(Debug, Default)]
pub struct ToastSlot {
    current: std::sync::Mutex<Option<Toast>>,
}

impl ToastSlot {
    /// Replace the current toast.
    pub fn show(&self, toast: Toast) {
        tracing::debug!(status = ?toast.status, message = %toast.message, "toast");
        *self.lock() = Some(toast);
    }

    /// The visible toast, dropping an expired success toast.
    pub fn current(&self) -> Option<Toast> {
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(Toast::is_expired) {
            *slot = None;
        }
        slot.clone()
    }

    /// Manual dismissal.
    pub fn dismiss(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Toast>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_success_toast_auto_dismisses() {
        let slot = ToastSlot::default();
        slot.show(Toast::success("done", "0x01"));

        tokio::time::advance(Duration::from_millis(4_900)).await;
        assert_eq!(slot.current().map(|t| t.status), Some(ToastStatus::Success));

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(slot.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_and_pending_toasts_persist() {
        let slot = ToastSlot::default();
        slot.show(Toast::error("boom"));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(slot.current().map(|t| t.status), Some(ToastStatus::Error));

        slot.show(Toast::pending("waiting"));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(slot.current().map(|t| t.status), Some(ToastStatus::Pending));
    }

    #[tokio::test]
    async fn test_dismiss_clears() {
        let slot = ToastSlot::default();
        slot.show(Toast::pending_tx("sent", "0xabc"));
        assert_eq!(slot.current().and_then(|t| t.hash), Some("0xabc".to_string()));
        slot.dismiss();
        assert!(slot.current().is_none());
    }

    #[tokio::test]
    async fn test_toast_serialization() {
        let json = serde_json::to_value(Toast::error("bad")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "bad");
        assert!(json.get("hash").is_none());
        assert!(json.get("created_at").is_none());
    }
}
