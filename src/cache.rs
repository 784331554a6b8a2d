//! In-memory metadata cache
//!
//! Single source of truth for every other component. The cache holds one
//! *generation* at a time: a complete, atomically-swapped snapshot of all
//! items keyed by id. Readers either see the previous complete generation
//! or the next one, never a partially populated mapping.
//!
//! There is no background refresh and no rebuild lock: staleness is bounded
//! only by explicit [`MetadataCache::bust`] calls or restarts, and
//! concurrent rebuilds are tolerated as redundant work (last writer wins).
//! Wasted extraction is acceptable; stale or torn reads are not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::extractor::{self, Item};

/// One complete, atomically-swapped snapshot of all items
type Generation = Arc<HashMap<String, Arc<Item>>>;

/// Rebuildable in-memory mapping from item id to item record
///
/// Configuration is injected at construction; there is no ambient state.
/// The cache starts empty and is populated lazily on first lookup or
/// explicitly via [`MetadataCache::bust`].
pub struct MetadataCache {
    root: PathBuf,
    extension: String,
    generation: RwLock<Option<Generation>>,
}

impl MetadataCache {
    /// Create an empty cache over the given library root.
    ///
    /// `extension` is matched case-insensitively against file extensions,
    /// without the leading dot (e.g. "mp3").
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            generation: RwLock::new(None),
        }
    }

    /// The library root this cache scans.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a single item by id, populating the cache first if empty.
    ///
    /// Absence is a normal outcome for unknown ids, not an error.
    pub async fn get(&self, id: &str) -> Option<Arc<Item>> {
        self.snapshot().await.get(id).cloned()
    }

    /// Snapshot of all cached items, populating the cache first if empty.
    ///
    /// The returned items are owned by the snapshot: a rebuild happening
    /// after this call cannot be observed through them.
    pub async fn get_all(&self) -> Vec<Arc<Item>> {
        self.snapshot().await.values().cloned().collect()
    }

    /// Force an unconditional rebuild regardless of current cache state.
    pub async fn bust(&self) {
        self.rebuild().await;
    }

    /// Enumerate the library, extract every file concurrently, and swap in
    /// the new generation.
    ///
    /// Never fails as a whole: a file that cannot be extracted is logged
    /// and excluded, and will be retried on the next rebuild. Returns only
    /// after every file has either succeeded or been logged. If the scan
    /// task itself dies, the previous generation is kept rather than
    /// swapped for an empty one.
    pub async fn rebuild(&self) {
        let root = self.root.clone();
        let extension = self.extension.clone();
        let files = match tokio::task::spawn_blocking(move || scan_audio_files(&root, &extension))
            .await
        {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "library scan task failed; keeping previous generation");
                return;
            }
        };

        let total = files.len();
        let tasks = files.into_iter().map(|path| {
            tokio::task::spawn_blocking(move || extractor::extract(&path))
        });

        let mut items: HashMap<String, Arc<Item>> = HashMap::new();
        for result in futures::future::join_all(tasks).await {
            match result {
                Ok(Ok(item)) => {
                    items.insert(item.id.clone(), Arc::new(item));
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "skipping file during rebuild");
                }
                Err(e) => {
                    warn!(error = %e, "extraction task panicked; skipping file");
                }
            }
        }

        info!(
            scanned = total,
            cached = items.len(),
            root = %self.root.display(),
            "metadata cache rebuilt"
        );

        *self.generation.write().await = Some(Arc::new(items));
    }

    /// Current generation, rebuilding first when the cache is empty.
    async fn snapshot(&self) -> Generation {
        if let Some(generation) = self.generation.read().await.as_ref() {
            return Arc::clone(generation);
        }

        // Concurrent callers may race here and trigger redundant rebuilds;
        // the atomic swap keeps every reader on a complete generation.
        self.rebuild().await;
        self.generation
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .unwrap_or_default()
    }

    /// Replace the current generation with the given items, bypassing
    /// extraction. Serving-path tests use this to avoid needing real
    /// tagged audio fixtures.
    #[cfg(test)]
    pub(crate) async fn seed(&self, items: Vec<Item>) {
        let map: HashMap<String, Arc<Item>> = items
            .into_iter()
            .map(|item| (item.id.clone(), Arc::new(item)))
            .collect();
        *self.generation.write().await = Some(Arc::new(map));
    }
}

/// Recursively enumerate audio files under `root` with the configured
/// extension. Unreadable directory entries are logged and skipped.
fn scan_audio_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable library entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    files
}
