//! In-memory analysis result store.
//!
//! Thread-safe key→value storage for analysis results, injected into the
//! transport layer. The engine itself never touches it.

use parking_lot::Mutex;
use std::collections::HashMap;

use muleflow_engine::types::{AnalysisResult, AnalysisStatus};

/// One stored analysis: its lifecycle status plus, eventually, the result
/// or the terminal error.
#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    /// Opaque analysis id.
    pub analysis_id: String,
    /// Lifecycle status.
    pub status: AnalysisStatus,
    /// Present once the analysis completes.
    pub result: Option<AnalysisResult>,
    /// Present when the analysis failed.
    pub error: Option<String>,
}

impl StoredAnalysis {
    /// A freshly accepted analysis.
    #[must_use]
    pub fn pending(analysis_id: String) -> Self {
        Self {
            analysis_id,
            status: AnalysisStatus::Pending,
            result: None,
            error: None,
        }
    }
}

/// Mutex-guarded map of analysis id to stored analysis.
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: Mutex<HashMap<String, StoredAnalysis>>,
}

impl ResultStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the entry for `id`.
    pub fn put(&self, id: &str, analysis: StoredAnalysis) {
        self.entries.lock().insert(id.to_string(), analysis);
    }

    /// Atomically update just the status of an existing entry.
    pub fn update_status(&self, id: &str, status: AnalysisStatus) {
        if let Some(entry) = self.entries.lock().get_mut(id) {
            entry.status = status;
        }
    }

    /// Fetch a copy of the entry for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<StoredAnalysis> {
        self.entries.lock().get(id).cloned()
    }

    /// Whether an entry exists for `id`.
    #[must_use]
    pub fn exists(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Number of stored analyses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
