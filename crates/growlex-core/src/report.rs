//! Per-style aggregation of reconciled scores
//!
//! Takes the score matrix, reconciles each song's annotation versions
//! down to its best value, groups songs by style and reports mean and
//! spread per (style, model, metric).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::corpus::CorpusIndex;
use crate::engine::{reduce_best, MetricsCache};
use crate::error::{GrowlexError, Result};
use crate::metrics::MetricSpec;

/// How a song's style is derived from its identity.
///
/// Curated corpora put the style in the dataset path (`songs/death`);
/// corpora like EMVD encode it as a token of the file name
/// (`male1_clear_high_01`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum StyleRule {
    DatasetLeaf,
    StemToken { delimiter: String, index: usize },
}

impl StyleRule {
    pub fn style_of<'a>(&self, dataset: &'a str, stem: &'a str) -> &'a str {
        match self {
            StyleRule::DatasetLeaf => dataset.rsplit('/').next().unwrap_or(dataset),
            StyleRule::StemToken { delimiter, index } => {
                stem.split(delimiter.as_str()).nth(*index).unwrap_or(stem)
            }
        }
    }
}

/// Aggregated result for one (style, model, metric) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSummary {
    pub style: String,
    pub model: String,
    pub metric: String,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

/// Aggregates best-per-song scores by style.
///
/// Every (song, model, metric) combination must already be scored;
/// a hole in the matrix is a precondition violation, not a zero.
pub fn summarize(
    cache: &MetricsCache,
    corpus: &CorpusIndex,
    models: &[String],
    metrics: &[MetricSpec],
    rule: &StyleRule,
) -> Result<Vec<StyleSummary>> {
    let mut grouped: BTreeMap<(String, String, String), Vec<f64>> = BTreeMap::new();
    for (dataset, stems) in corpus.datasets() {
        for stem in stems {
            for model in models {
                for spec in metrics {
                    let best = reduce_best(cache, dataset, stem, model, spec).ok_or_else(|| {
                        GrowlexError::ScoreNotFound {
                            dataset: dataset.to_string(),
                            stem: stem.to_string(),
                            model: model.clone(),
                            metric: spec.name(),
                        }
                    })?;
                    let style = rule.style_of(dataset, stem).to_string();
                    grouped
                        .entry((style, model.clone(), spec.name()))
                        .or_default()
                        .push(best);
                }
            }
        }
    }

    Ok(grouped
        .into_iter()
        .map(|((style, model, metric), values)| StyleSummary {
            style,
            model,
            metric,
            mean: mean(&values),
            std: sample_std(&values),
            count: values.len(),
        })
        .collect())
}

/// Consumes summary rows and produces an artifact. Chart drawing
/// itself lives outside this crate; sinks only hand the rows over.
pub trait PlotSink {
    fn render(&mut self, summaries: &[StyleSummary]) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct SummaryFile {
    summaries: Vec<StyleSummary>,
}

/// Sink that writes the rows as one pretty-printed JSON report.
pub struct JsonPlotSink {
    path: PathBuf,
}

impl JsonPlotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PlotSink for JsonPlotSink {
    fn render(&mut self, summaries: &[StyleSummary]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GrowlexError::io(parent, e))?;
        }
        let file = SummaryFile {
            summaries: summaries.to_vec(),
        };
        let contents =
            serde_json::to_string_pretty(&file).map_err(|e| GrowlexError::MalformedStore {
                path: self.path.clone(),
                source: e,
            })?;
        std::fs::write(&self.path, contents).map_err(|e| GrowlexError::io(&self.path, e))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0.0 for fewer than
/// two values so single-song styles stay representable in JSON.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

// ============================================================
// Tests
// ============================================================
