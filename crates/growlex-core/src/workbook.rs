//! JSON-backed workbook model shared by the lyrics and transcription stores
//!
//! The persisted layout mirrors a spreadsheet: named sheets, each an ordered
//! list of columns plus string rows. Sheet names encode dataset paths with
//! the path separator replaced by a joining token, since sheet names cannot
//! contain separators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{GrowlexError, Result};

/// Joining token substituted for `/` in sheet names
pub const SHEET_JOIN: &str = "___";

/// Key column present in every sheet
pub const FILE_COLUMN: &str = "File";

/// Encode a dataset path as a sheet name
pub fn sheet_name_for(dataset_path: &str) -> String {
    dataset_path.replace('/', SHEET_JOIN)
}

/// Canonical row key for file-stem lookups: case-folded, with en/em dashes
/// folded to ASCII hyphens. Annotators type both dash variants; stems on
/// disk use the plain hyphen.
pub fn row_key(stem: &str) -> String {
    stem.replace(['\u{2013}', '\u{2014}'], "-").to_lowercase()
}

/// One sheet: ordered columns and string-valued rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Find the row whose `File` cell matches `stem` under the tolerant
    /// [`row_key`] policy
    pub fn find_row(&self, stem: &str) -> Option<&[String]> {
        let file_idx = self.column_index(FILE_COLUMN)?;
        let wanted = row_key(stem);
        self.rows
            .iter()
            .find(|row| row.get(file_idx).is_some_and(|cell| row_key(cell) == wanted))
            .map(|row| row.as_slice())
    }

    pub fn contains_row(&self, stem: &str) -> bool {
        self.find_row(stem).is_some()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A set of named sheets persisted as one JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: BTreeMap<String, Sheet>,
}

impl Workbook {
    /// Load a workbook; the file must exist
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| GrowlexError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| GrowlexError::MalformedStore {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load a workbook, starting empty when the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the whole workbook back. All-or-nothing per call: the file is
    /// replaced in one write, never appended to.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GrowlexError::io(parent, e))?;
        }
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| GrowlexError::MalformedStore {
                path: path.to_path_buf(),
                source: e,
            })?;
        std::fs::write(path, contents).map_err(|e| GrowlexError::io(path, e))
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Sheets in stable (sorted) name order
    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(name, sheet)| (name.as_str(), sheet))
    }

    /// Get a sheet, creating it with the given columns when absent
    pub fn sheet_mut_or_insert<S: Into<String>>(
        &mut self,
        name: &str,
        columns: impl IntoIterator<Item = S>,
    ) -> &mut Sheet {
        self.sheets
            .entry(name.to_string())
            .or_insert_with(|| Sheet::new(columns))
    }
}
