//! Growlex Core - ASR benchmarking pipeline for sung (and growled) vocals
//!
//! This library provides the core functionality for:
//! - Corpus acquisition: song download and vocal separation
//! - Incremental per-model transcription caching
//! - Multi-metric scoring against versioned ground-truth lyrics
//! - Best-version reconciliation and per-style aggregation
//!
//! Every stage is resumable: transcripts and scores are persisted as
//! they are produced and never recomputed unless forced.

pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod ground_truth;
pub mod media;
pub mod metrics;
pub mod report;
pub mod transcribe;

mod workbook;

pub use config::{AsrModel, Config, EmbedderEntry};
pub use corpus::CorpusIndex;
pub use engine::{reduce_best, MetricsCache, ScoreKey, ScoreOutcome, ScoringEngine};
pub use error::{GrowlexError, Result};
pub use ground_truth::{normalize_lyrics, GroundTruthStore};
pub use metrics::{Best, Metric, MetricRegistry, MetricSpec};
pub use report::{JsonPlotSink, PlotSink, StyleRule, StyleSummary};
pub use transcribe::{CommandTranscriber, Transcriber, TranscriptionCache};
