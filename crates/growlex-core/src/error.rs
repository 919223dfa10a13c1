//! Error types shared across the benchmark pipeline

use std::path::PathBuf;

/// Pipeline error with actionable context
///
/// Variants fall into three classes: precondition violations (missing
/// audio/lyrics/transcriptions and unknown names, see [`is_not_found`]),
/// storage failures, and external-collaborator failures. All of them
/// abort the run; resume happens by re-running against the persisted
/// caches.
///
/// [`is_not_found`]: GrowlexError::is_not_found
#[derive(Debug, thiserror::Error)]
pub enum GrowlexError {
    #[error("audio file not found for \"{stem}\" in dataset {dataset}")]
    AudioNotFound { dataset: String, stem: String },

    #[error("duplicate file stem \"{stem}\" in dataset {dataset}: stems must be unique per dataset")]
    DuplicateStem { dataset: String, stem: String },

    #[error("sheet \"{sheet}\" not found in workbook {path:?}")]
    SheetNotFound { sheet: String, path: PathBuf },

    #[error("lyrics not found for \"{stem}\" in sheet \"{sheet}\"")]
    LyricsNotFound { sheet: String, stem: String },

    #[error("no transcription for \"{stem}\" ({dataset}) in the {model} cache. Run 'growlex transcribe' first")]
    TranscriptionNotFound {
        model: String,
        dataset: String,
        stem: String,
    },

    #[error("no scores for {dataset}/{stem}/{model}/{metric}")]
    ScoreNotFound {
        dataset: String,
        stem: String,
        model: String,
        metric: String,
    },

    #[error("unknown metric \"{name}\". Valid: wer, bleu, rouge-l, embedding:<backend-id>")]
    UnknownMetric { name: String },

    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed store {path:?}")]
    MalformedStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("transcriber \"{model}\" failed on \"{stem}\"")]
    Transcriber {
        model: String,
        stem: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("embedding backend \"{backend}\" failed")]
    Embedder {
        backend: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{tool} failed: {detail}")]
    Tool { tool: String, detail: String },
}

impl GrowlexError {
    /// Whether this is an expected-absence error (data/config precondition
    /// violation) rather than an I/O or external failure. The pipeline
    /// treats both as fatal, but callers embedding the engine may choose
    /// to skip NotFound entries instead.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AudioNotFound { .. }
                | Self::SheetNotFound { .. }
                | Self::LyricsNotFound { .. }
                | Self::TranscriptionNotFound { .. }
                | Self::ScoreNotFound { .. }
                | Self::UnknownMetric { .. }
        )
    }

    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GrowlexError>;
