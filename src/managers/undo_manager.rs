//! Undo log for Shelfmark.
//!
//! A plain stack of inverse descriptors plus the toast that advertises the
//! most recent one. Replaying an entry touches the models and is done by
//! [`crate::app::App::undo`].

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::types::undo::UndoEntry;

/// Toast text shown after a successful undo.
pub const UNDONE_MESSAGE: &str = "Undone";

/// Transient notice offering an undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoToast {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Stack of undo entries, newest last.
#[derive(Debug, Clone)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
    capacity: Option<usize>,
    toast_duration: Duration,
    toast: Option<UndoToast>,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(None, 8)
    }
}

impl UndoLog {
    /// `capacity` bounds the stack, dropping the oldest entries first.
    pub fn new(capacity: Option<usize>, toast_seconds: u64) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            toast_duration: Duration::seconds(toast_seconds as i64),
            toast: None,
        }
    }

    /// Applies new limits to a live log. Entries over the new capacity are
    /// dropped oldest first; a visible toast keeps its expiry.
    pub fn configure(&mut self, capacity: Option<usize>, toast_seconds: u64) {
        self.capacity = capacity;
        self.toast_duration = Duration::seconds(toast_seconds as i64);
        self.trim();
    }

    pub fn push(&mut self, entry: UndoEntry, now: DateTime<Utc>) {
        self.show_toast(entry.describe(), now);
        self.entries.push(entry);
        self.trim();
    }

    fn trim(&mut self) {
        if let Some(cap) = self.capacity {
            if self.entries.len() > cap {
                let excess = self.entries.len() - cap;
                self.entries.drain(..excess);
                debug!(dropped = excess, "undo log trimmed to capacity");
            }
        }
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.toast = None;
    }

    /// Replaces the current toast and restarts its timer.
    pub fn show_toast(&mut self, message: &str, now: DateTime<Utc>) {
        self.toast = Some(UndoToast {
            message: message.to_string(),
            expires_at: now + self.toast_duration,
        });
    }

    /// The toast if it has not expired yet. Expiry never touches the stack.
    pub fn visible_toast(&self, now: DateTime<Utc>) -> Option<&UndoToast> {
        self.toast.as_ref().filter(|t| now < t.expires_at)
    }

    pub fn dismiss_toast(&mut self) {
        self.toast = None;
    }
}
