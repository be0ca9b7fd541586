//! Per-view state containers. Each view owns its state; nothing is shared across views.
//!
//! Overlapping operations on one view resolve last-write-wins: every operation takes a
//! fresh ticket when it starts and its completion is only applied while that ticket is
//! still the current one.

pub mod analyzer;
pub mod dashboard;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub use analyzer::AnalyzerView;
pub use dashboard::DashboardView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewStatus<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> ViewStatus<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewStatus::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewStatus::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewStatus::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState<T> {
    #[serde(flatten)]
    pub status: ViewStatus<T>,
    /// Ticket of the operation that owns the state.
    pub ticket: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            status: ViewStatus::Idle,
            ticket: None,
            updated_at: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct StateCell<T> {
    inner: Mutex<ViewState<T>>,
}

impl<T: Clone> StateCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(ViewState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewState<T>> {
        // State is replaced wholesale, so a poisoned lock still holds a consistent value.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts an operation: supersedes whatever is in flight and sets `status`.
    pub(crate) fn begin(&self, status: ViewStatus<T>) -> Uuid {
        let ticket = Uuid::new_v4();
        let mut state = self.lock();
        state.status = status;
        state.ticket = Some(ticket);
        state.updated_at = Some(Utc::now());
        ticket
    }

    /// Applies `status` if `ticket` is still current. Returns whether it was applied.
    pub(crate) fn finish(&self, ticket: Uuid, status: ViewStatus<T>) -> bool {
        let mut state = self.lock();
        if state.ticket != Some(ticket) {
            tracing::info!(%ticket, current = ?state.ticket, "discarding superseded result");
            return false;
        }
        state.status = status;
        state.updated_at = Some(Utc::now());
        true
    }

    pub(crate) fn snapshot(&self) -> ViewState<T> {
        self.lock().clone()
    }
}
