//! Ground-truth lyrics store
//!
//! Annotated lyrics live in one workbook with a sheet per style. Each row
//! is a song; every column whose name starts with `Lyrics` is one
//! annotator's version of that song's lyrics. Versions are kept separate,
//! never merged: downstream scoring picks whichever version is most
//! favorable per metric.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{GrowlexError, Result};
use crate::workbook::{sheet_name_for, Workbook};

/// Columns with this prefix are annotation versions
pub const LYRICS_PREFIX: &str = "Lyrics";

/// The sheet key for a dataset is its final path segment: `songs/death`
/// and `vocals_demucs_mdx_extra/death` share one annotation sheet.
pub fn sheet_key_for(dataset_path: &str) -> &str {
    dataset_path.rsplit('/').next().unwrap_or(dataset_path)
}

/// Normalize lyrics for comparison: case-fold, strip all but alphanumeric /
/// whitespace / apostrophe / hyphen, drop garbage tokens of 25+ characters,
/// collapse immediately-repeated words. Idempotent.
pub fn normalize_lyrics(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '\'' || *c == '-')
        .collect();

    let mut words: Vec<&str> = Vec::new();
    for word in kept.split_whitespace() {
        if word.chars().count() >= 25 {
            continue;
        }
        if words.last() == Some(&word) {
            continue;
        }
        words.push(word);
    }
    words.join(" ")
}

/// Read-through store for annotation workbooks, memoized by workbook path
/// for the store's lifetime (one pipeline run).
#[derive(Debug, Default)]
pub struct GroundTruthStore {
    loaded: HashMap<PathBuf, Workbook>,
}

impl GroundTruthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All annotation versions for one song, in column order:
    /// `(version_id, normalized_text)` per `Lyrics*` column.
    ///
    /// Row lookup is tolerant (case-insensitive, unicode dashes folded) to
    /// absorb annotation-time typos. Missing sheet or row is fatal: ground
    /// truth is assumed complete for every indexed file.
    pub fn annotations(
        &mut self,
        source: &Path,
        sheet_key: &str,
        stem: &str,
    ) -> Result<Vec<(String, String)>> {
        let book = match self.loaded.entry(source.to_path_buf()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(v) => v.insert(Workbook::load(source)?),
        };

        let sheet_name = sheet_name_for(sheet_key);
        let sheet = book.sheet(&sheet_name).ok_or_else(|| GrowlexError::SheetNotFound {
            sheet: sheet_name.clone(),
            path: source.to_path_buf(),
        })?;

        let row = sheet.find_row(stem).ok_or_else(|| GrowlexError::LyricsNotFound {
            sheet: sheet_name.clone(),
            stem: stem.to_string(),
        })?;

        let versions: Vec<(String, String)> = sheet
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.starts_with(LYRICS_PREFIX))
            .map(|(idx, name)| {
                let cell = row.get(idx).map(String::as_str).unwrap_or("");
                (name.clone(), normalize_lyrics(cell))
            })
            .collect();

        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Normalization
    // ========================================================================

    #[test]
    fn test_normalize_strips_and_folds() {
        assert_eq!(normalize_lyrics("Kill! Kill!! kill"), "kill");
        assert_eq!(normalize_lyrics("THE Sun... no longer RISES"), "the sun no longer rises");
    }

    #[test]
    fn test_normalize_keeps_apostrophe_and_hyphen() {
        assert_eq!(normalize_lyrics("don't re-animate"), "don't re-animate");
    }

    #[test]
    fn test_normalize_drops_garbage_tokens() {
        let growl = "a".repeat(30);
        assert_eq!(
            normalize_lyrics(&format!("scream {growl} scream")),
            "scream scream"
        );
        // 24 chars is still a word
        let long_word = "b".repeat(24);
        assert_eq!(normalize_lyrics(&long_word), long_word);
    }

    #[test]
    fn test_normalize_collapses_consecutive_repeats_only() {
        assert_eq!(normalize_lyrics("die die die die"), "die");
        assert_eq!(normalize_lyrics("die live die"), "die live die");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["Kill! Kill!! kill", "No   MERCY, no mercy", "", "  ", "a-b c'd"] {
            let once = normalize_lyrics(input);
            assert_eq!(normalize_lyrics(&once), once);
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    fn write_lyrics_workbook(path: &Path) {
        let mut book = Workbook::default();
        let sheet = book.sheet_mut_or_insert("death", ["File", "Lyrics", "Lyrics2"]);
        sheet.push_row(vec![
            "Bloodbath – Like Fire".to_string(),
            "Like fire! Fire!".to_string(),
            "like FIRE".to_string(),
        ]);
        book.save(path).unwrap();
    }

    #[test]
    fn test_annotations_returns_versions_in_column_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lyrics.json");
        write_lyrics_workbook(&path);

        let mut store = GroundTruthStore::new();
        // Stem on disk uses a plain hyphen, the annotator typed an en dash
        let versions = store
            .annotations(&path, "death", "Bloodbath - Like Fire")
            .unwrap();

        assert_eq!(
            versions,
            vec![
                ("Lyrics".to_string(), "like fire".to_string()),
                ("Lyrics2".to_string(), "like fire".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_row_is_lyrics_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lyrics.json");
        write_lyrics_workbook(&path);

        let mut store = GroundTruthStore::new();
        let err = store.annotations(&path, "death", "Unknown Song").unwrap_err();
        assert!(matches!(err, GrowlexError::LyricsNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_sheet_is_sheet_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lyrics.json");
        write_lyrics_workbook(&path);

        let mut store = GroundTruthStore::new();
        let err = store
            .annotations(&path, "doom", "Bloodbath - Like Fire")
            .unwrap_err();
        assert!(matches!(err, GrowlexError::SheetNotFound { .. }));
    }

    #[test]
    fn test_workbook_is_memoized_per_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lyrics.json");
        write_lyrics_workbook(&path);

        let mut store = GroundTruthStore::new();
        let first = store
            .annotations(&path, "death", "Bloodbath - Like Fire")
            .unwrap();

        // Rewriting the file is invisible to an already-loaded store
        let mut book = Workbook::default();
        let sheet = book.sheet_mut_or_insert("death", ["File", "Lyrics"]);
        sheet.push_row(vec!["Bloodbath - Like Fire".to_string(), "changed".to_string()]);
        book.save(&path).unwrap();

        let second = store
            .annotations(&path, "death", "Bloodbath - Like Fire")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sheet_key_is_final_segment() {
        assert_eq!(sheet_key_for("songs/death"), "death");
        assert_eq!(sheet_key_for("vocals_demucs_mdx_extra/black"), "black");
        assert_eq!(sheet_key_for("emvd"), "emvd");
    }
}
