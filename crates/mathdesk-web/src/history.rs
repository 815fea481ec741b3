//! In-memory record of solved questions.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;

use mathdesk_common::HistoryEntry;

/// Insertion-ordered history shared by every handler.
///
/// Clones share the same entries. All access goes through one lock, so an
/// append can never interleave with a clear or a snapshot.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Arc<RwLock<VecDeque<HistoryEntry>>>,
    max_entries: Option<usize>,
}

impl HistoryStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that drops its oldest entry once `max_entries` is exceeded.
    /// A limit of zero is treated as one.
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            entries: Arc::default(),
            max_entries: Some(max_entries.max(1)),
        }
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    pub async fn push(&self, entry: HistoryEntry) {
        let mut entries = self.entries.write().await;
        entries.push_back(entry);
        if let Some(max) = self.max_entries {
            while entries.len() > max {
                entries.pop_front();
            }
        }
    }

    /// Snapshot in insertion order.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Removes everything and returns how many entries were dropped.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
