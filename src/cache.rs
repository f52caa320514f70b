// Copyright 2025 The Stitchfont Project Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
//! Two-tier memoization of rasterizer outputs.
//!
//! L1 is a process-local map, L2 a JSON file per request under the cache
//! root, written via temp file and atomic rename so no partial entry is
//! ever observed. The cache is opportunistic: every disk failure is
//! swallowed and the conversion recomputes.

use std::fs;
use std::hash::Hasher;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fnv::{FnvHashMap, FnvHashSet, FnvHasher};
use log::debug;
use parking_lot::{Condvar, Mutex};
use tempfile::NamedTempFile;

use crate::raster::Strategy;
use crate::schema::Font;
use crate::Result;

/// Identity of one rasterization request. Equality is structural and
/// exact; distinct keys denote distinct outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Base name of the font file.
    pub font_file: String,
    pub height: u32,
    pub bold: u32,
    pub strategy: Strategy,
}

impl RequestKey {
    fn digest_input(&self) -> String {
        format!("{}|{}|{}|{}", self.font_file, self.height, self.bold, self.strategy)
    }
}

/// The cache service. Owned by the front end for the process lifetime and
/// passed to the rasterizer; there is no ambient global state.
pub struct RasterCache {
    root: PathBuf,
    entries: Mutex<FnvHashMap<RequestKey, Arc<String>>>,
    inflight: Mutex<FnvHashSet<RequestKey>>,
    inflight_done: Condvar,
}

/// Removes its key from the in-flight set on every exit path, including
/// compute panics, and wakes the waiters.
struct InflightGuard<'a> {
    cache: &'a RasterCache,
    key: &'a RequestKey,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.cache.inflight.lock().remove(self.key);
        self.cache.inflight_done.notify_all();
    }
}

impl RasterCache {
    pub fn new<P: Into<PathBuf>>(root: P) -> RasterCache {
        RasterCache {
            root: root.into(),
            entries: Mutex::new(FnvHashMap::default()),
            inflight: Mutex::new(FnvHashSet::default()),
            inflight_done: Condvar::new(),
        }
    }

    /// Default cache root: a `.cache/rasterize` sibling of the executable,
    /// or the user cache directory when that location is unknown.
    pub fn default_root() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| {
                dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("stitchfont")
            })
            .join(".cache")
            .join("rasterize")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the serialized font record for `key`, computing it at most
    /// once per process. A second caller for the same key blocks until the
    /// first finishes, then reads the freshly cached entry.
    pub fn get_or_compute<F>(&self, key: &RequestKey, compute: F) -> Result<Arc<String>>
    where
        F: FnOnce() -> Result<Font>,
    {
        loop {
            if let Some(hit) = self.entries.lock().get(key) {
                return Ok(hit.clone());
            }

            if let Some(disk) = self.read_disk(key) {
                let entry = Arc::new(disk);
                self.entries.lock().insert(key.clone(), entry.clone());
                return Ok(entry);
            }

            let mut inflight = self.inflight.lock();
            if inflight.insert(key.clone()) {
                break;
            }
            // The same key is being computed elsewhere; wait for it and
            // re-check both tiers.
            self.inflight_done.wait(&mut inflight);
        }

        let _guard = InflightGuard { cache: self, key };

        let font = compute()?;
        // A record of strings and integers always serializes.
        let serialized = serde_json::to_string(&font).expect("font record serializes");
        let entry = Arc::new(serialized);
        self.entries.lock().insert(key.clone(), entry.clone());
        self.write_disk(key, &entry);
        Ok(entry)
    }

    fn cache_path(&self, key: &RequestKey) -> PathBuf {
        let digest = fnv_digest(key.digest_input().as_bytes());
        self.root.join(format!(
            "{}_{}_{}_{}_{}.json",
            key.font_file.replace('.', "_"),
            key.height,
            key.bold,
            key.strategy,
            &digest[..12]
        ))
    }

    /// Reads and canonicalizes an L2 entry, so both tiers hand out
    /// byte-identical records. Anything unreadable is treated as a miss.
    fn read_disk(&self, key: &RequestKey) -> Option<String> {
        let path = self.cache_path(key);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Font>(&raw) {
            Ok(font) => Some(serde_json::to_string(&font).expect("font record serializes")),
            Err(err) => {
                debug!("discarding unreadable cache entry {}: {}", path.display(), err);
                None
            },
        }
    }

    fn write_disk(&self, key: &RequestKey, serialized: &str) {
        let path = self.cache_path(key);
        if let Err(err) = self.try_write(&path, serialized) {
            debug!("skipping cache write to {}: {}", path.display(), err);
        }
    }

    fn try_write(&self, path: &Path, serialized: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)?;
        // The temp file lives in the cache directory so the rename stays on
        // one filesystem; it is unlinked on drop if anything fails.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(serialized.as_bytes())?;
        tmp.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

/// FNV-1a 64 digest of `bytes` as 16 hex digits.
fn fnv_digest(bytes: &[u8]) -> String {
    let mut hasher = FnvHasher::default();
    hasher.write(bytes);
    format!("{:016x}", hasher.finish())
}

/// A short validator for HTTP caching: the digest of the record's
/// sorted-key JSON form, stable across field ordering.
pub fn etag(serialized: &str) -> String {
    let canonical = serde_json::from_str::<serde_json::Value>(serialized)
        .and_then(|value| serde_json::to_string(&value))
        .unwrap_or_else(|_| serialized.to_owned());
    fnv_digest(canonical.as_bytes())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::meta::ResolvedMetadata;
    use crate::schema::Glyph;

    fn sample_font() -> Font {
        let mut glyphs = BTreeMap::new();
        glyphs.insert('A', Glyph { width: 2, bitmap: vec!["11".to_owned(), "10".to_owned()] });
        Font::assemble(
            ResolvedMetadata {
                display_name: "Cache Test".to_owned(),
                slug: "cache-test".to_owned(),
                category: "sans-serif".to_owned(),
                tags: vec!["cross-stitch".to_owned()],
                source: String::new(),
                license: String::new(),
                letter_spacing: 1,
            },
            2,
            "basic".to_owned(),
            3,
            glyphs,
        )
    }

    fn sample_key() -> RequestKey {
        RequestKey {
            font_file: "Test.ttf".to_owned(),
            height: 12,
            bold: 1,
            strategy: Strategy::Average,
        }
    }

    #[test]
    fn second_call_reuses_the_first_result() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RasterCache::new(dir.path());
        let key = sample_key();
        let computed = AtomicUsize::new(0);

        let compute = || {
            computed.fetch_add(1, Ordering::SeqCst);
            Ok(sample_font())
        };
        let first = cache.get_or_compute(&key, compute).unwrap();
        let second = cache
            .get_or_compute(&key, || panic!("second call must not recompute"))
            .unwrap();

        assert_eq!(computed.load(Ordering::SeqCst), 1);
        assert_eq!(*first, *second);
    }

    #[test]
    fn disk_entries_survive_a_fresh_cache() {
        let dir = tempfile::tempdir().unwrap();
        let key = sample_key();

        let warm = RasterCache::new(dir.path());
        let first = warm.get_or_compute(&key, || Ok(sample_font())).unwrap();

        // A new service over the same root sees only the L2 tier.
        let cold = RasterCache::new(dir.path());
        let second = cold
            .get_or_compute(&key, || panic!("L2 hit must not recompute"))
            .unwrap();

        assert_eq!(*first, *second);
    }

    #[test]
    fn cache_path_embeds_the_request_parameters() {
        let cache = RasterCache::new("/tmp/stitchfont-test");
        let path = cache.cache_path(&sample_key());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Test_ttf_12_1_average_"));
        assert!(name.ends_with(".json"));
        // 12 hex digits between the last underscore and the extension.
        let digest = name.rsplit('_').next().unwrap().trim_end_matches(".json");
        assert_eq!(digest.len(), 12);
        assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_keys_get_distinct_paths() {
        let cache = RasterCache::new("/tmp/stitchfont-test");
        let average = cache.cache_path(&sample_key());
        let max_ink =
            cache.cache_path(&RequestKey { strategy: Strategy::MaxInk, ..sample_key() });
        assert_ne!(average, max_ink);
    }

    #[test]
    fn etag_is_stable_across_key_order() {
        let a = r#"{"name":"x","height":8}"#;
        let b = r#"{"height":8,"name":"x"}"#;
        assert_eq!(etag(a), etag(b));
        assert_eq!(etag(a).len(), 16);
        assert!(etag(a).bytes().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn compute_failure_leaves_the_key_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RasterCache::new(dir.path());
        let key = sample_key();

        let failed = cache.get_or_compute(&key, || {
            Err(crate::Error::BadFont("broken".to_owned()))
        });
        assert!(failed.is_err());

        // The in-flight entry must be gone so a retry can run.
        let retried = cache.get_or_compute(&key, || Ok(sample_font()));
        assert!(retried.is_ok());
    }
}
