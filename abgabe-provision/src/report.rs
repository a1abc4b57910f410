//! Per-item results of batch operations.
//!
//! Batches (one entry per student, fork or repository) never abort on an
//! item failure: the error is logged and recorded here, and the caller
//! decides what to print or how to exit.

use crate::error::ProvisionError;

/// Result for one item of a batch.
#[derive(Debug)]
pub struct BatchEntry<T> {
    /// What the entry is about: a username, a project path, ...
    pub subject: String,
    pub result: Result<T, ProvisionError>,
}

/// Ordered results of a batch.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub entries: Vec<BatchEntry<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `result`, logging failures.
    pub fn record(&mut self, subject: impl Into<String>, result: Result<T, ProvisionError>) {
        let subject = subject.into();
        if let Err(err) = &result {
            tracing::warn!(subject = %subject, error = %err, "batch item failed");
        }
        self.entries.push(BatchEntry { subject, result });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().ok().map(|v| (e.subject.as_str(), v)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ProvisionError)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().err().map(|err| (e.subject.as_str(), err)))
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }
}
