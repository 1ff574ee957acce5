//! CSV-backed sink
//!
//! Writes each article body to its own file under the articles directory
//! and appends an index row to a CSV file. Existing titles are loaded on
//! open so the skip-if-exists check holds across runs.

use crate::config::OutputConfig;
use crate::extract::PageRecord;
use crate::sink::{Sink, SinkResult};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

const INDEX_COLUMNS: [&str; 4] = ["title", "url", "article", "image"];

pub struct CsvSink {
    csv_path: PathBuf,
    articles_dir: PathBuf,
    keys: Mutex<HashSet<String>>,
}

impl CsvSink {
    /// Opens the sink, creating the articles directory and loading the
    /// titles already present in the index
    pub fn new(output: &OutputConfig) -> SinkResult<Self> {
        let csv_path = PathBuf::from(&output.csv_path);
        let articles_dir = PathBuf::from(&output.articles_dir);

        fs::create_dir_all(&articles_dir)?;
        if let Some(parent) = csv_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut keys = HashSet::new();
        if csv_path.exists() {
            let mut reader = csv::Reader::from_path(&csv_path)?;
            for row in reader.records() {
                let row = row?;
                if let Some(title) = row.get(0) {
                    keys.insert(title.to_string());
                }
            }
        }

        Ok(Self {
            csv_path,
            articles_dir,
            keys: Mutex::new(keys),
        })
    }

    pub fn stored_count(&self) -> usize {
        self.keys.lock().unwrap().len()
    }
}

impl Sink for CsvSink {
    fn store(&self, record: &PageRecord) -> SinkResult<bool> {
        // Lock held across the writes so concurrent workers cannot
        // interleave rows or double-store a title.
        let mut keys = self.keys.lock().unwrap();
        if keys.contains(&record.title) {
            return Ok(false);
        }

        let article_path = self
            .articles_dir
            .join(format!("{}.md", sanitize_title(&record.title)));
        fs::write(&article_path, &record.content)?;

        let write_header = !self.csv_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(INDEX_COLUMNS)?;
        }

        let article_path_str = article_path.to_string_lossy();
        writer.write_record([
            record.title.as_str(),
            record.url.as_str(),
            article_path_str.as_ref(),
            record.image.as_deref().unwrap_or(""),
        ])?;
        writer.flush()?;

        keys.insert(record.title.clone());
        Ok(true)
    }
}

/// Maps a title to a safe file name
fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
