//! Incremental store of raw transcripts, one file per model

use std::path::{Path, PathBuf};

use crate::error::{GrowlexError, Result};
use crate::workbook::{sheet_name_for, Workbook, FILE_COLUMN};

use super::Transcriber;

/// Column holding the raw transcript text.
const TEXT_COLUMN: &str = "Lyrics";

/// On-disk cache of everything one model has transcribed so far.
///
/// Sheets are keyed by the full dataset path, rows by audio stem. Text
/// is stored exactly as the transcriber produced it; normalization is
/// the scorer's business. `flush` rewrites the whole file, so partial
/// runs keep every entry written before the interruption.
pub struct TranscriptionCache {
    model_id: String,
    path: PathBuf,
    book: Workbook,
}

impl TranscriptionCache {
    /// File name for a model's cache, with path separators flattened
    /// so ids like `openai/whisper-large-v3` stay a single file.
    pub fn file_name(model_id: &str) -> String {
        format!("{}.json", model_id.replace(['/', '\\'], "-"))
    }

    /// Opens the cache for `model_id` under `dir`. With `force` the
    /// existing contents are discarded and every file will be redone.
    pub fn load(dir: &Path, model_id: &str, force: bool) -> Result<Self> {
        let path = dir.join(Self::file_name(model_id));
        let book = if force {
            if path.exists() {
                tracing::info!("Discarding cached transcriptions for {}", model_id);
            }
            Workbook::default()
        } else {
            Workbook::load_or_default(&path)?
        };
        Ok(Self {
            model_id: model_id.to_string(),
            path,
            book,
        })
    }

    /// Number of cached transcripts across all datasets.
    pub fn entry_count(&self) -> usize {
        self.book.sheets().map(|(_, sheet)| sheet.row_count()).sum()
    }

    pub fn contains(&self, dataset_path: &str, stem: &str) -> bool {
        self.book
            .sheet(&sheet_name_for(dataset_path))
            .map(|sheet| sheet.contains_row(stem))
            .unwrap_or(false)
    }

    /// Cached transcript for one audio file.
    pub fn get(&self, dataset_path: &str, stem: &str) -> Result<&str> {
        let missing = || GrowlexError::TranscriptionNotFound {
            model: self.model_id.clone(),
            dataset: dataset_path.to_string(),
            stem: stem.to_string(),
        };
        let sheet = self
            .book
            .sheet(&sheet_name_for(dataset_path))
            .ok_or_else(missing)?;
        let column = sheet.column_index(TEXT_COLUMN).ok_or_else(missing)?;
        let row = sheet.find_row(stem).ok_or_else(missing)?;
        row.get(column).map(String::as_str).ok_or_else(missing)
    }

    /// Returns the cached transcript, running `transcriber` only when
    /// the (dataset, stem) pair has never been transcribed.
    pub fn get_or_run(
        &mut self,
        dataset_path: &str,
        stem: &str,
        audio: &Path,
        language_hint: Option<&str>,
        transcriber: &mut dyn Transcriber,
    ) -> Result<&str> {
        if !self.contains(dataset_path, stem) {
            tracing::info!("Transcribing \"{}\" with {}", stem, self.model_id);
            let text = transcriber
                .transcribe(audio, language_hint)
                .map_err(|source| GrowlexError::Transcriber {
                    model: self.model_id.clone(),
                    stem: stem.to_string(),
                    source,
                })?;
            tracing::debug!("{} -> {:?}", stem, text);
            let sheet = self
                .book
                .sheet_mut_or_insert(&sheet_name_for(dataset_path), [FILE_COLUMN, TEXT_COLUMN]);
            sheet.push_row(vec![stem.to_string(), text]);
        }
        self.get(dataset_path, stem)
    }

    /// Writes the whole cache back to disk.
    pub fn flush(&self) -> Result<()> {
        self.book.save(&self.path)
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct StubTranscriber {
        reply: String,
        calls: usize,
    }

    impl StubTranscriber {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: 0,
            }
        }
    }

    impl Transcriber for StubTranscriber {
        fn transcribe(
            &mut self,
            _audio: &Path,
            _language_hint: Option<&str>,
        ) -> anyhow::Result<String> {
            self.calls += 1;
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_file_name_flattens_model_id() {
        assert_eq!(
            TranscriptionCache::file_name("openai/whisper-large-v3"),
            "openai-whisper-large-v3.json"
        );
        assert_eq!(TranscriptionCache::file_name("canary-1b"), "canary-1b.json");
    }

    #[test]
    fn test_get_or_run_transcribes_each_file_once() {
        let dir = TempDir::new().unwrap();
        let mut cache = TranscriptionCache::load(dir.path(), "stub", false).unwrap();
        let mut stub = StubTranscriber::new("kill the light");

        let audio = PathBuf::from("track.wav");
        let text = cache
            .get_or_run("songs/death", "track", &audio, None, &mut stub)
            .unwrap();
        assert_eq!(text, "kill the light");

        // Second call must come from the cache.
        let text = cache
            .get_or_run("songs/death", "track", &audio, None, &mut stub)
            .unwrap();
        assert_eq!(text, "kill the light");
        assert_eq!(stub.calls, 1);
    }

    #[test]
    fn test_flush_then_reload_skips_transcriber_entirely() {
        let dir = TempDir::new().unwrap();
        let audio = PathBuf::from("track.wav");
        {
            let mut cache = TranscriptionCache::load(dir.path(), "stub", false).unwrap();
            let mut stub = StubTranscriber::new("kill the light");
            cache
                .get_or_run("songs/death", "track", &audio, None, &mut stub)
                .unwrap();
            cache.flush().unwrap();
        }

        let mut cache = TranscriptionCache::load(dir.path(), "stub", false).unwrap();
        assert_eq!(cache.entry_count(), 1);
        let mut stub = StubTranscriber::new("should never run");
        let text = cache
            .get_or_run("songs/death", "track", &audio, None, &mut stub)
            .unwrap();
        assert_eq!(text, "kill the light");
        assert_eq!(stub.calls, 0);
    }

    #[test]
    fn test_force_discards_previous_contents() {
        let dir = TempDir::new().unwrap();
        let audio = PathBuf::from("track.wav");
        {
            let mut cache = TranscriptionCache::load(dir.path(), "stub", false).unwrap();
            let mut stub = StubTranscriber::new("old transcript");
            cache
                .get_or_run("songs/death", "track", &audio, None, &mut stub)
                .unwrap();
            cache.flush().unwrap();
        }

        let mut cache = TranscriptionCache::load(dir.path(), "stub", true).unwrap();
        assert_eq!(cache.entry_count(), 0);
        let mut stub = StubTranscriber::new("new transcript");
        let text = cache
            .get_or_run("songs/death", "track", &audio, None, &mut stub)
            .unwrap();
        assert_eq!(text, "new transcript");
        assert_eq!(stub.calls, 1);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let cache = TranscriptionCache::load(dir.path(), "stub", false).unwrap();
        let err = cache.get("songs/death", "track").unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, GrowlexError::TranscriptionNotFound { .. }));
    }

    #[test]
    fn test_raw_text_keeps_casing_and_punctuation() {
        let dir = TempDir::new().unwrap();
        let mut cache = TranscriptionCache::load(dir.path(), "stub", false).unwrap();
        let mut stub = StubTranscriber::new("Kill! The LIGHT!!");
        let audio = PathBuf::from("track.wav");
        cache
            .get_or_run("songs/death", "track", &audio, None, &mut stub)
            .unwrap();
        assert_eq!(cache.get("songs/death", "track").unwrap(), "Kill! The LIGHT!!");
    }
}
