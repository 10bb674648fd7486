//! # Content Store
//!
//! Durable audio storage: one file per payload named `<id>.<ext>`, a JSON
//! metadata index rebuilt at startup, and a bounded LRU cache of fully
//! hydrated records.
//!
//! The index is the source of truth for id existence. A missing file behind
//! a live index entry is a storage inconsistency: it is logged and treated
//! as not-found rather than propagated as a failure.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::format::AudioFormat;
use crate::model::{AudioId, AudioMetadata, AudioRecord};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const INDEX_FILE: &str = "metadata.json";
const AUDIO_DIR: &str = "audio";

/// One durable index entry: everything about a record except its bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub format: AudioFormat,
    pub duration_ms: u64,
    pub bitrate_kbps: u32,
    pub sample_rate_hz: u32,
    pub title: String,
}

impl IndexEntry {
    fn metadata(&self) -> AudioMetadata {
        AudioMetadata {
            format: self.format,
            duration_ms: self.duration_ms,
            bitrate_kbps: self.bitrate_kbps,
            sample_rate_hz: self.sample_rate_hz,
            title: self.title.clone(),
        }
    }
}

/// Durable, cached audio store.
pub struct ContentStore {
    audio_dir: PathBuf,
    index_path: PathBuf,
    index: Mutex<HashMap<AudioId, IndexEntry>>,
    cache: Mutex<LruCache<AudioId, Arc<AudioRecord>>>,
}

impl ContentStore {
    /// Open a store rooted at the configured directory, creating the layout
    /// if needed and rebuilding the index from disk.
    #[instrument(skip(config), fields(dir = %config.storage_dir.display()))]
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let audio_dir = config.storage_dir.join(AUDIO_DIR);
        let index_path = config.storage_dir.join(INDEX_FILE);

        tokio::fs::create_dir_all(&audio_dir).await?;

        let index = Self::load_index(&index_path).await?;
        if !index.is_empty() {
            info!(entries = index.len(), "loaded audio metadata index");
        }

        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            audio_dir,
            index_path,
            index: Mutex::new(index),
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    async fn load_index(path: &Path) -> Result<HashMap<AudioId, IndexEntry>> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => {
                let raw: HashMap<String, IndexEntry> = serde_json::from_str(&json)
                    .map_err(|e| StoreError::IndexCorrupt(e.to_string()))?;
                let mut index = HashMap::with_capacity(raw.len());
                for (key, entry) in raw {
                    let id = AudioId::from_string(&key)
                        .map_err(|e| StoreError::IndexCorrupt(format!("bad id '{}': {}", key, e)))?;
                    index.insert(id, entry);
                }
                Ok(index)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no existing metadata index, starting fresh");
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Serialize the index and write it to disk. The write completes before
    /// any store operation acknowledges success.
    async fn persist_index(&self) -> Result<()> {
        let json = {
            let index = self.index.lock();
            let raw: HashMap<String, &IndexEntry> =
                index.iter().map(|(id, e)| (id.to_string(), e)).collect();
            serde_json::to_string_pretty(&raw)
                .map_err(|e| StoreError::IndexCorrupt(e.to_string()))?
        };
        tokio::fs::write(&self.index_path, json).await?;
        Ok(())
    }

    fn file_path(&self, id: AudioId, format: AudioFormat) -> PathBuf {
        self.audio_dir.join(format!("{}.{}", id, format.extension()))
    }

    /// Store a payload and return its fresh id.
    ///
    /// The file and index entry are written before this returns, so an
    /// acknowledged store survives a crash.
    #[instrument(skip(self, data, metadata), fields(size = data.len(), uploader = %uploaded_by))]
    pub async fn store(
        &self,
        data: Bytes,
        metadata: AudioMetadata,
        uploaded_by: &str,
    ) -> Result<AudioId> {
        let id = AudioId::new();
        let uploaded_at = Utc::now();
        let record = AudioRecord::new(id, data, metadata, uploaded_by, uploaded_at)?;

        let path = self.file_path(id, record.metadata.format);
        tokio::fs::write(&path, &record.data).await?;

        {
            let mut index = self.index.lock();
            index.insert(
                id,
                IndexEntry {
                    uploaded_by: record.uploaded_by.clone(),
                    uploaded_at,
                    format: record.metadata.format,
                    duration_ms: record.metadata.duration_ms,
                    bitrate_kbps: record.metadata.bitrate_kbps,
                    sample_rate_hz: record.metadata.sample_rate_hz,
                    title: record.metadata.title.clone(),
                },
            );
        }
        self.persist_index().await?;

        let title = record.metadata.title.clone();
        self.cache.lock().put(id, Arc::new(record));

        info!(%id, %title, "stored audio file");
        Ok(id)
    }

    /// Retrieve a record, refreshing cache recency on a hit and hydrating
    /// from disk on a miss.
    #[instrument(skip(self), fields(%id))]
    pub async fn get(&self, id: AudioId) -> Result<Option<Arc<AudioRecord>>> {
        if let Some(record) = self.cache.lock().get(&id) {
            return Ok(Some(Arc::clone(record)));
        }

        let entry = match self.index.lock().get(&id) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };

        let path = self.file_path(id, entry.format);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(%id, path = %path.display(), "indexed audio file missing on disk");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let record = Arc::new(AudioRecord::new(
            id,
            data,
            entry.metadata(),
            entry.uploaded_by.clone(),
            entry.uploaded_at,
        )?);

        self.cache.lock().put(id, Arc::clone(&record));
        Ok(Some(record))
    }

    /// Remove every stored payload whose id is not in `live`.
    ///
    /// Deletes files, drops index and cache entries, and persists the index
    /// once after the batch. Safe to call repeatedly.
    #[instrument(skip(self, live), fields(live = live.len()))]
    pub async fn cleanup(&self, live: &HashSet<AudioId>) -> Result<usize> {
        let orphans: Vec<(AudioId, AudioFormat)> = {
            let index = self.index.lock();
            index
                .iter()
                .filter(|(id, _)| !live.contains(id))
                .map(|(id, entry)| (*id, entry.format))
                .collect()
        };

        let mut removed = 0;
        for (id, format) in &orphans {
            match tokio::fs::remove_file(self.file_path(*id, *format)).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            self.index.lock().remove(id);
            self.cache.lock().pop(id);
        }

        if !orphans.is_empty() {
            self.persist_index().await?;
            info!(removed, "cleaned up unused audio files");
        }
        Ok(removed)
    }

    /// Number of indexed payloads.
    pub fn audio_count(&self) -> usize {
        self.index.lock().len()
    }

    /// All indexed ids.
    pub fn all_ids(&self) -> Vec<AudioId> {
        self.index.lock().keys().copied().collect()
    }

    /// Metadata for an id without touching bytes or cache recency.
    pub fn metadata(&self, id: AudioId) -> Option<AudioMetadata> {
        self.index.lock().get(&id).map(IndexEntry::metadata)
    }

    /// Whether a record is currently resident in the cache. Does not
    /// refresh recency.
    pub fn is_cached(&self, id: AudioId) -> bool {
        self.cache.lock().peek(&id).is_some()
    }

    /// Current cache occupancy.
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }
}
