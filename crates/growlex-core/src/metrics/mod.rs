//! Scoring metrics and the registry that instantiates them
//!
//! Every metric compares a normalized ground-truth annotation against a
//! normalized transcript and declares which direction is better, so the
//! engine can reconcile scores across annotation versions without
//! knowing what each metric measures.

pub mod embedding;

mod bleu;
mod rouge;
mod wer;

pub use embedding::{
    CommandEmbedder, CommandEmbedderProvider, EmbedderProvider, EmbeddingMetric, TextEmbedder,
};

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::{GrowlexError, Result};

/// Whisper's token for audio it considers speech-free.
const NO_SPEECH_TOKEN: &str = "<|nospeech|>";
/// What that token becomes once lyrics normalization strips the markup.
const NO_SPEECH_RESIDUE: &str = "nospeech";
/// Placeholder (already normalized) for annotation cells left unfilled.
const MISSING_LYRICS: &str = "lyrics not provided";

/// True when a text carries no comparable content, so any comparison
/// against it is meaningless and must score as bad as possible.
pub fn is_degenerate(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty()
        || trimmed.contains(NO_SPEECH_TOKEN)
        || trimmed == NO_SPEECH_RESIDUE
        || trimmed == MISSING_LYRICS
}

/// Direction in which a metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Best {
    Minimize,
    Maximize,
}

impl Best {
    /// The worst value a metric can take, used for degenerate input.
    pub fn worst(self) -> f64 {
        match self {
            Best::Minimize => 1.0,
            Best::Maximize => 0.0,
        }
    }

    /// Reduce the scores of all annotation versions to the single best
    /// one. `None` only when `values` is empty.
    pub fn reduce(self, values: &[f64]) -> Option<f64> {
        match self {
            Best::Minimize => values.iter().copied().min_by(f64::total_cmp),
            Best::Maximize => values.iter().copied().max_by(f64::total_cmp),
        }
    }

    /// How the reduction reads in reports.
    pub fn label(self) -> &'static str {
        match self {
            Best::Minimize => "min",
            Best::Maximize => "max",
        }
    }
}

/// A metric identifier as written in config and stored in score keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricSpec {
    Wer,
    Bleu,
    RougeL,
    Embedding { backend: String },
}

impl MetricSpec {
    /// Parse a config identifier: `wer`, `bleu`, `rouge-l`, or
    /// `embedding:<backend-id>`.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "wer" => Ok(Self::Wer),
            "bleu" => Ok(Self::Bleu),
            "rouge-l" => Ok(Self::RougeL),
            other => match other.strip_prefix("embedding:") {
                Some(backend) if !backend.is_empty() => Ok(Self::Embedding {
                    backend: backend.to_string(),
                }),
                _ => Err(GrowlexError::UnknownMetric {
                    name: other.to_string(),
                }),
            },
        }
    }

    /// Canonical identifier; the inverse of [`MetricSpec::parse`].
    pub fn name(&self) -> String {
        match self {
            Self::Wer => "wer".to_string(),
            Self::Bleu => "bleu".to_string(),
            Self::RougeL => "rouge-l".to_string(),
            Self::Embedding { backend } => format!("embedding:{backend}"),
        }
    }

    pub fn best(&self) -> Best {
        match self {
            Self::Wer => Best::Minimize,
            Self::Bleu | Self::RougeL | Self::Embedding { .. } => Best::Maximize,
        }
    }
}

/// An instantiated metric, owning whatever state its backend needs.
pub enum Metric {
    Wer,
    Bleu,
    RougeL,
    Embedding(EmbeddingMetric),
}

impl std::fmt::Debug for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Wer => f.write_str("Wer"),
            Metric::Bleu => f.write_str("Bleu"),
            Metric::RougeL => f.write_str("RougeL"),
            Metric::Embedding(_) => f.write_str("Embedding(..)"),
        }
    }
}

impl Metric {
    pub fn best(&self) -> Best {
        match self {
            Metric::Wer => Best::Minimize,
            Metric::Bleu | Metric::RougeL | Metric::Embedding(_) => Best::Maximize,
        }
    }

    /// Score `hypothesis` against `reference`, both already normalized.
    ///
    /// Degenerate input on either side short-circuits to the worst
    /// possible score without touching any backend.
    pub fn compute(&mut self, reference: &str, hypothesis: &str) -> Result<f64> {
        if is_degenerate(reference) || is_degenerate(hypothesis) {
            return Ok(self.best().worst());
        }
        match self {
            Metric::Wer => Ok(wer::word_error_rate(reference, hypothesis)),
            Metric::Bleu => Ok(bleu::bleu_score(reference, hypothesis)),
            Metric::RougeL => Ok(rouge::rouge_l_f1(reference, hypothesis)),
            Metric::Embedding(metric) => metric.compute(reference, hypothesis),
        }
    }
}

/// Builds metric instances on first use and keeps them alive for the
/// rest of the run, so embedding backends spin up at most once.
pub struct MetricRegistry {
    provider: Box<dyn EmbedderProvider>,
    instances: BTreeMap<String, Metric>,
}

impl MetricRegistry {
    pub fn new(provider: Box<dyn EmbedderProvider>) -> Self {
        Self {
            provider,
            instances: BTreeMap::new(),
        }
    }

    /// The live instance for `spec`, created on first request.
    pub fn get(&mut self, spec: &MetricSpec) -> Result<&mut Metric> {
        match self.instances.entry(spec.name()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let metric = match spec {
                    MetricSpec::Wer => Metric::Wer,
                    MetricSpec::Bleu => Metric::Bleu,
                    MetricSpec::RougeL => Metric::RougeL,
                    MetricSpec::Embedding { backend } => {
                        let embedder = self.provider.create(backend).ok_or_else(|| {
                            GrowlexError::UnknownMetric { name: spec.name() }
                        })?;
                        Metric::Embedding(EmbeddingMetric::new(backend, embedder))
                    }
                };
                Ok(slot.insert(metric))
            }
        }
    }
}

// ============================================================
// Tests
// ============================================================
