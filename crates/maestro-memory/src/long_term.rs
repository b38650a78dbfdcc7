//! Long-term memory: a JSON-file store with keyword-overlap retrieval.
//!
//! Relevance is the number of whitespace-separated query words that occur
//! (case-insensitively, as substrings) in a record's content. Records with a
//! score of zero are never returned. Ties keep insertion order.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One stored memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Sequential id, equal to the record's position at insertion
    pub id: u64,
    /// Stored text
    pub content: String,
    /// Free-form annotations
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Insertion time
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Store statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Number of records
    pub total_memories: usize,
    /// Backing file, if persistent
    pub storage_path: Option<PathBuf>,
}

/// Storage interface the orchestrator writes to and reads from
#[async_trait::async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist a record
    async fn store(&self, content: &str, metadata: Map<String, Value>) -> Result<MemoryRecord>;

    /// Most relevant records for `query`, best first
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<MemoryRecord>>;
}

/// Keyword-retrieval store backed by a JSON file
pub struct LongTermMemory {
    path: Option<PathBuf>,
    records: Mutex<Vec<MemoryRecord>>,
}

impl LongTermMemory {
    /// Open (or lazily create) a store at `path`.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str::<Vec<MemoryRecord>>(&text) {
                Ok(records) => records,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt memory file, starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), count = records.len(), "Loaded long-term memory");

        Ok(Self {
            path: Some(path),
            records: Mutex::new(records),
        })
    }

    /// A store that is never written to disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Mutex::new(Vec::new()),
        }
    }

    async fn persist(&self, records: &[MemoryRecord]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Every record, oldest first
    pub async fn get_all(&self) -> Vec<MemoryRecord> {
        self.records.lock().await.clone()
    }

    /// Delete every record; memory is left untouched if the file can't be written
    pub async fn clear(&self) -> Result<()> {
        let mut records = self.records.lock().await;
        self.persist(&[]).await?;
        records.clear();
        Ok(())
    }

    /// Record count and backing path
    pub async fn stats(&self) -> MemoryStats {
        MemoryStats {
            total_memories: self.records.lock().await.len(),
            storage_path: self.path.clone(),
        }
    }
}

fn relevance(query_words: &[String], content: &str) -> usize {
    let content = content.to_lowercase();
    query_words
        .iter()
        .filter(|word| content.contains(word.as_str()))
        .count()
}

#[async_trait::async_trait]
impl MemoryStore for LongTermMemory {
    async fn store(&self, content: &str, metadata: Map<String, Value>) -> Result<MemoryRecord> {
        let mut records = self.records.lock().await;
        let record = MemoryRecord {
            id: records.len() as u64,
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        records.push(record.clone());
        if let Err(e) = self.persist(&records).await {
            records.pop();
            return Err(e);
        }

        debug!(id = record.id, "Stored long-term memory");
        Ok(record)
    }

    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<MemoryRecord>> {
        let query_words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let records = self.records.lock().await;
        let mut scored: Vec<(usize, &MemoryRecord)> = records
            .iter()
            .map(|record| (relevance(&query_words, &record.content), record))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, record)| record.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retrieve_ranks_by_overlap() {
        let memory = LongTermMemory::in_memory();
        memory.store("Rust async runtimes", Map::new()).await.unwrap();
        memory.store("Gardening tips", Map::new()).await.unwrap();
        memory
            .store("Comparing async Rust and Go runtimes", Map::new())
            .await
            .unwrap();

        let hits = memory.retrieve("rust go runtimes", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 2);
        assert_eq!(hits[1].id, 0);

        let top = memory.retrieve("rust", 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, 0);

        assert!(memory.retrieve("cooking", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.json");

        let memory = LongTermMemory::open(&path).await.unwrap();
        let mut metadata = Map::new();
        metadata.insert("query".into(), Value::from("q"));
        memory.store("Task: q\nResult: r", metadata).await.unwrap();

        let reopened = LongTermMemory::open(&path).await.unwrap();
        let all = reopened.get_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].metadata["query"], "q");

        let stats = reopened.stats().await;
        assert_eq!(stats.total_memories, 1);
        assert_eq!(stats.storage_path.as_deref(), Some(path.as_path()));

        reopened.clear().await.unwrap();
        assert!(LongTermMemory::open(&path).await.unwrap().get_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_and_disk_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let memory = LongTermMemory::open(&path).await.unwrap();
        memory.store("first", Map::new()).await.unwrap();

        // A directory where the file should be makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(memory.store("second", Map::new()).await.is_err());
        let all = memory.get_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "first");

        assert!(memory.clear().await.is_err());
        assert_eq!(memory.stats().await.total_memories, 1);

        // Ids stay sequential once writes succeed again
        std::fs::remove_dir(&path).unwrap();
        let record = memory.store("third", Map::new()).await.unwrap();
        assert_eq!(record.id, 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "{ not json").unwrap();

        let memory = LongTermMemory::open(&path).await.unwrap();
        assert_eq!(memory.stats().await.total_memories, 0);
    }
}
