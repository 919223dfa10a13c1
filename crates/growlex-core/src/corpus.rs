//! Corpus index: enumerates audio files grouped by dataset path
//!
//! A dataset path is the file's parent directory relative to the audio
//! root, joined with `/` regardless of platform (e.g. `songs/death`,
//! `vocals_demucs_mdx_extra/black`). The index is rebuilt fresh on every
//! scan and never persisted.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{GrowlexError, Result};

#[derive(Debug, Clone)]
pub struct CorpusIndex {
    audio_root: PathBuf,
    datasets: BTreeMap<String, Vec<String>>,
}

impl CorpusIndex {
    /// Recursively scan the audio tree. `filter` narrows the walk to one
    /// dataset-path prefix (e.g. `songs` or `songs/death`); dataset paths
    /// stay relative to the audio root either way.
    ///
    /// Two files sharing a stem within one dataset (same name, different
    /// extension) are a hard error: the stem is the corpus key and must be
    /// unique.
    pub fn scan(audio_root: &Path, filter: Option<&str>) -> Result<Self> {
        let walk_root = match filter {
            Some(prefix) => audio_root.join(prefix),
            None => audio_root.to_path_buf(),
        };

        let mut files = Vec::new();
        walk(&walk_root, &mut files)?;

        let mut datasets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for file in &files {
            let rel = match file.strip_prefix(audio_root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let Some(parent) = rel.parent() else { continue };
            let dataset = dataset_path_of(parent);
            if dataset.is_empty() {
                // File directly under the audio root, outside any dataset
                continue;
            }

            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !datasets.entry(dataset.clone()).or_default().insert(stem.clone()) {
                return Err(GrowlexError::DuplicateStem { dataset, stem });
            }
        }

        tracing::debug!(
            "Indexed {} files across {} datasets under {:?}",
            files.len(),
            datasets.len(),
            audio_root
        );

        Ok(Self {
            audio_root: audio_root.to_path_buf(),
            datasets: datasets
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
        })
    }

    /// Datasets with their sorted file stems, in lexicographic dataset order
    pub fn datasets(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.datasets
            .iter()
            .map(|(path, stems)| (path.as_str(), stems.as_slice()))
    }

    pub fn stems(&self, dataset_path: &str) -> Option<&[String]> {
        self.datasets.get(dataset_path).map(|s| s.as_slice())
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    pub fn file_count(&self) -> usize {
        self.datasets.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Resolve the on-disk path for a (dataset, stem) pair by probing the
    /// dataset directory for a file with that exact stem. Ambiguity is the
    /// same duplicate-stem error the scan raises; absence is fatal.
    pub fn audio_path(&self, dataset_path: &str, stem: &str) -> Result<PathBuf> {
        let dir = self.audio_root.join(dataset_path);
        let entries = std::fs::read_dir(&dir).map_err(|e| GrowlexError::io(&dir, e))?;

        let mut found = None;
        for entry in entries {
            let path = entry.map_err(|e| GrowlexError::io(&dir, e))?.path();
            if !path.is_file() {
                continue;
            }
            if path.file_stem().is_some_and(|s| s.to_string_lossy() == stem) {
                if found.is_some() {
                    return Err(GrowlexError::DuplicateStem {
                        dataset: dataset_path.to_string(),
                        stem: stem.to_string(),
                    });
                }
                found = Some(path);
            }
        }

        found.ok_or_else(|| GrowlexError::AudioNotFound {
            dataset: dataset_path.to_string(),
            stem: stem.to_string(),
        })
    }
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).map_err(|e| GrowlexError::io(dir, e))? {
        let path = entry.map_err(|e| GrowlexError::io(dir, e))?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Join path components with `/` so dataset paths are platform-independent
fn dataset_path_of(rel_parent: &Path) -> String {
    rel_parent
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn sample_corpus() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("songs/death/Bloodbath - Like Fire.wav"));
        touch(&root.join("songs/death/Demilich - Emptiness of Vanishing.wav"));
        touch(&root.join("songs/black/Mayhem - Freezing Moon.wav"));
        touch(&root.join("vocals_demucs_mdx_extra/black/Mayhem - Freezing Moon.wav"));
        dir
    }

    // ========================================================================
    // Scanning and grouping
    // ========================================================================

    #[test]
    fn test_scan_groups_by_parent_path() {
        let dir = sample_corpus();
        let index = CorpusIndex::scan(dir.path(), None).unwrap();

        let datasets: Vec<_> = index.datasets().map(|(d, _)| d).collect();
        assert_eq!(
            datasets,
            vec!["songs/black", "songs/death", "vocals_demucs_mdx_extra/black"]
        );
        assert_eq!(
            index.stems("songs/death").unwrap(),
            &[
                "Bloodbath - Like Fire".to_string(),
                "Demilich - Emptiness of Vanishing".to_string()
            ]
        );
        assert_eq!(index.file_count(), 4);
    }

    #[test]
    fn test_scan_with_filter_keeps_full_dataset_paths() {
        let dir = sample_corpus();
        let index = CorpusIndex::scan(dir.path(), Some("songs")).unwrap();

        let datasets: Vec<_> = index.datasets().map(|(d, _)| d).collect();
        assert_eq!(datasets, vec!["songs/black", "songs/death"]);
    }

    #[test]
    fn test_duplicate_stem_is_hard_error() {
        let dir = tempfile::TempDir::new().unwrap();
        touch(&dir.path().join("songs/doom/track.wav"));
        touch(&dir.path().join("songs/doom/track.flac"));

        let err = CorpusIndex::scan(dir.path(), None).unwrap_err();
        assert!(matches!(err, GrowlexError::DuplicateStem { .. }));
    }

    // ========================================================================
    // Path resolution
    // ========================================================================

    #[test]
    fn test_audio_path_resolves_extension() {
        let dir = sample_corpus();
        let index = CorpusIndex::scan(dir.path(), None).unwrap();

        let path = index
            .audio_path("songs/death", "Bloodbath - Like Fire")
            .unwrap();
        assert!(path.ends_with("songs/death/Bloodbath - Like Fire.wav"));
    }

    #[test]
    fn test_audio_path_missing_is_not_found() {
        let dir = sample_corpus();
        let index = CorpusIndex::scan(dir.path(), None).unwrap();

        let err = index.audio_path("songs/death", "absent").unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, GrowlexError::AudioNotFound { .. }));
    }
}
