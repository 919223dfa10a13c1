//! Score command - fill the metric matrix and print the per-file tree

use anyhow::Result;
use console::{style, Term};
use growlex_core::{reduce_best, Config, CorpusIndex, MetricsCache, ScoringEngine};

pub fn run(config: &Config, dataset: Option<&str>, force: bool) -> Result<()> {
    let term = Term::stdout();

    let corpus = CorpusIndex::scan(&config.audio_root(), dataset)?;
    if corpus.is_empty() {
        term.write_line(&format!(
            "{} No audio found under {:?}. Run {} first.",
            style("⚠").yellow(),
            config.audio_root(),
            style("growlex fetch").cyan()
        ))?;
        return Ok(());
    }

    let models = config.model_ids();
    if models.is_empty() {
        anyhow::bail!("No models configured; add [[models]] entries to the config");
    }
    let metrics = config.metric_specs()?;

    let mut cache = MetricsCache::load(&config.data_dir(), force)?;
    let mut engine = ScoringEngine::new(
        config.lyrics_path(),
        config.data_dir(),
        Box::new(config.embedder_provider()?),
    );

    let outcome = engine.score(&corpus, &models, &metrics, &mut cache)?;

    for (dataset_path, stems) in corpus.datasets() {
        term.write_line(&format!("[SOURCE] {}", style(dataset_path).bold()))?;
        for stem in stems {
            term.write_line(&format!("|__ [FILE] {stem}"))?;
            for model in &models {
                term.write_line(&format!("|   |__ [MODEL] {model}"))?;
                for spec in &metrics {
                    let name = spec.name();
                    let versions = cache
                        .version_scores(dataset_path, stem, model, &name)
                        .iter()
                        .map(|(_, v)| format!("{v:.4}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    if let Some(best) = reduce_best(&cache, dataset_path, stem, model, spec) {
                        term.write_line(&format!(
                            "|   |   |__ [METRIC] {} -- {}([{}]) = {:.4}",
                            name,
                            spec.best().label(),
                            versions,
                            best
                        ))?;
                    }
                }
            }
        }
    }

    term.write_line("")?;
    term.write_line(&format!(
        "{} {} fresh scores, {} reused, {} cells in the matrix",
        style("✓").green(),
        outcome.computed,
        outcome.reused,
        cache.len()
    ))?;

    Ok(())
}
