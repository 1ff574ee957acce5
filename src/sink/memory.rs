//! In-memory sink for tests and dry runs

use crate::extract::PageRecord;
use crate::sink::{Sink, SinkResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Keeps records in a map keyed by title
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<HashMap<String, PageRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, title: &str) -> Option<PageRecord> {
        self.records.lock().unwrap().get(title).cloned()
    }

    /// Titles of every stored record, sorted
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self.records.lock().unwrap().keys().cloned().collect();
        titles.sort();
        titles
    }
}

impl Sink for MemorySink {
    fn store(&self, record: &PageRecord) -> SinkResult<bool> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.title) {
            return Ok(false);
        }
        records.insert(record.title.clone(), record.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(title: &str) -> PageRecord {
        PageRecord {
            title: title.to_string(),
            url: format!("https://catalog.example.com/entry/{}.html", title),
            content: "<p>body</p>".to_string(),
            image: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_and_get() {
        let sink = MemorySink::new();
        assert!(sink.store(&record("Aspirin")).unwrap());
        assert_eq!(sink.len(), 1);
        assert!(sink.get("Aspirin").is_some());
    }

    #[test]
    fn test_duplicate_store_is_skipped_not_failed() {
        let sink = MemorySink::new();
        assert!(sink.store(&record("Aspirin")).unwrap());
        assert!(!sink.store(&record("Aspirin")).unwrap());
        assert_eq!(sink.len(), 1);
    }
}
