//! Port abstraction for blocking user notifications.
//!
//! The default error-handling path raises a modal, dismissible alert.
//! Presentation is infallible from the caller's perspective; any platform
//! trouble stays inside the adapter.

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Which notification affordance to raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Dedicated connectivity-lost affordance for network failures.
    Connectivity,
    /// Generic blocking alert for every other category.
    Generic,
}

/// Blocking alert presentation.
#[async_trait]
pub trait AlertPresenter: Send + Sync {
    /// Show a blocking, dismissible notification with the given copy.
    async fn show(&self, kind: AlertKind, message: String);
}

/// Presenter that records alerts instead of rendering them.
#[derive(Debug, Default)]
pub struct RecordingAlertPresenter {
    shown: Mutex<Vec<(AlertKind, String)>>,
}

impl RecordingAlertPresenter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts shown so far, in order.
    pub async fn shown(&self) -> Vec<(AlertKind, String)> {
        self.shown.lock().await.clone()
    }
}

#[async_trait]
impl AlertPresenter for RecordingAlertPresenter {
    async fn show(&self, kind: AlertKind, message: String) {
        self.shown.lock().await.push((kind, message));
    }
}
