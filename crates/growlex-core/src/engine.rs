//! Score matrix: memoized metric computation across every axis
//!
//! The matrix is keyed by (dataset, stem, model, annotation version,
//! metric). Every run walks the full key space in a fixed order and
//! computes only the cells that are absent, so an interrupted or
//! partially-extended run resumes exactly where it left off. Cells are
//! never overwritten; `force` empties the whole matrix up front.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus::CorpusIndex;
use crate::error::{GrowlexError, Result};
use crate::ground_truth::{normalize_lyrics, sheet_key_for, GroundTruthStore};
use crate::metrics::{EmbedderProvider, MetricRegistry, MetricSpec};
use crate::transcribe::TranscriptionCache;

/// Full coordinates of one score cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScoreKey {
    pub dataset: String,
    pub stem: String,
    pub model: String,
    pub version: String,
    pub metric: String,
}

#[derive(Serialize, Deserialize)]
struct ScoreRecord {
    #[serde(flatten)]
    key: ScoreKey,
    value: f64,
}

#[derive(Serialize, Deserialize, Default)]
struct ScoreFile {
    scores: Vec<ScoreRecord>,
}

/// Persistent map from [`ScoreKey`] to metric value.
pub struct MetricsCache {
    path: PathBuf,
    scores: BTreeMap<ScoreKey, f64>,
}

impl MetricsCache {
    pub const FILE_NAME: &'static str = "metrics.json";

    /// Opens the score matrix stored under `dir`. With `force` any
    /// existing scores are discarded and everything will be recomputed.
    pub fn load(dir: &Path, force: bool) -> Result<Self> {
        let path = dir.join(Self::FILE_NAME);
        if force {
            if path.exists() {
                tracing::info!("Discarding cached metric scores");
            }
            return Ok(Self {
                path,
                scores: BTreeMap::new(),
            });
        }
        if !path.exists() {
            return Ok(Self {
                path,
                scores: BTreeMap::new(),
            });
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| GrowlexError::io(&path, e))?;
        let file: ScoreFile =
            serde_json::from_str(&contents).map_err(|e| GrowlexError::MalformedStore {
                path: path.clone(),
                source: e,
            })?;
        Ok(Self {
            path,
            scores: file.scores.into_iter().map(|r| (r.key, r.value)).collect(),
        })
    }

    pub fn contains(&self, key: &ScoreKey) -> bool {
        self.scores.contains_key(key)
    }

    pub fn get(&self, key: &ScoreKey) -> Option<f64> {
        self.scores.get(key).copied()
    }

    /// Records a freshly computed cell. Existing cells are left alone;
    /// the only way to replace a value is a `force` reload.
    pub fn insert(&mut self, key: ScoreKey, value: f64) {
        self.scores.entry(key).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Every version's score for one (dataset, stem, model, metric),
    /// in version order.
    pub fn version_scores(
        &self,
        dataset: &str,
        stem: &str,
        model: &str,
        metric: &str,
    ) -> Vec<(&str, f64)> {
        self.scores
            .iter()
            .filter(|(key, _)| {
                key.dataset == dataset
                    && key.stem == stem
                    && key.model == model
                    && key.metric == metric
            })
            .map(|(key, value)| (key.version.as_str(), *value))
            .collect()
    }

    /// Writes the whole matrix back to disk, sorted by key.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GrowlexError::io(parent, e))?;
        }
        let file = ScoreFile {
            scores: self
                .scores
                .iter()
                .map(|(key, value)| ScoreRecord {
                    key: key.clone(),
                    value: *value,
                })
                .collect(),
        };
        let contents =
            serde_json::to_string_pretty(&file).map_err(|e| GrowlexError::MalformedStore {
                path: self.path.clone(),
                source: e,
            })?;
        std::fs::write(&self.path, contents).map_err(|e| GrowlexError::io(&self.path, e))
    }
}

/// Best score across annotation versions, in the metric's own
/// direction. `None` when no version has been scored yet.
pub fn reduce_best(
    cache: &MetricsCache,
    dataset: &str,
    stem: &str,
    model: &str,
    spec: &MetricSpec,
) -> Option<f64> {
    let values: Vec<f64> = cache
        .version_scores(dataset, stem, model, &spec.name())
        .into_iter()
        .map(|(_, value)| value)
        .collect();
    spec.best().reduce(&values)
}

/// What a scoring pass did: cells computed now vs. already present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreOutcome {
    pub computed: usize,
    pub reused: usize,
}

/// Walks the corpus and fills every absent cell of the score matrix.
///
/// Ground truth and transcripts are read through their own caches;
/// transcripts must already exist, so scoring never runs an ASR model.
pub struct ScoringEngine {
    lyrics_path: PathBuf,
    data_dir: PathBuf,
    ground_truth: GroundTruthStore,
    registry: MetricRegistry,
}

impl ScoringEngine {
    pub fn new(lyrics_path: PathBuf, data_dir: PathBuf, provider: Box<dyn EmbedderProvider>) -> Self {
        Self {
            lyrics_path,
            data_dir,
            ground_truth: GroundTruthStore::new(),
            registry: MetricRegistry::new(provider),
        }
    }

    /// One scoring pass over `corpus` x `models` x annotation versions
    /// x `metrics`.
    ///
    /// Iteration order is fixed: datasets and stems sorted, models and
    /// metrics in the given order, versions in annotation column order.
    /// The matrix is flushed after each dataset group, so a crash loses
    /// at most one group of fresh cells.
    pub fn score(
        &mut self,
        corpus: &CorpusIndex,
        models: &[String],
        metrics: &[MetricSpec],
        cache: &mut MetricsCache,
    ) -> Result<ScoreOutcome> {
        let mut transcripts: Vec<(&str, TranscriptionCache)> = Vec::with_capacity(models.len());
        for model in models {
            transcripts.push((
                model.as_str(),
                TranscriptionCache::load(&self.data_dir, model, false)?,
            ));
        }

        let mut outcome = ScoreOutcome::default();
        for (dataset, stems) in corpus.datasets() {
            for stem in stems {
                let annotations =
                    self.ground_truth
                        .annotations(&self.lyrics_path, sheet_key_for(dataset), stem)?;

                for (model, transcript_cache) in &transcripts {
                    let hypothesis = normalize_lyrics(transcript_cache.get(dataset, stem)?);

                    for (version, reference) in &annotations {
                        for spec in metrics {
                            let key = ScoreKey {
                                dataset: dataset.to_string(),
                                stem: stem.to_string(),
                                model: model.to_string(),
                                version: version.clone(),
                                metric: spec.name(),
                            };
                            if cache.contains(&key) {
                                outcome.reused += 1;
                                continue;
                            }
                            tracing::info!(
                                "Scoring {} for \"{}\" with {} ({})",
                                key.metric,
                                stem,
                                model,
                                version
                            );
                            let value = self.registry.get(spec)?.compute(reference, &hypothesis)?;
                            cache.insert(key, value);
                            outcome.computed += 1;
                        }
                    }
                }
            }
            // Flush per dataset group so interrupted runs keep their work.
            cache.save()?;
        }
        cache.save()?;
        Ok(outcome)
    }
}

// ============================================================
// Tests
// ============================================================
