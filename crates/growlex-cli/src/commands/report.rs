//! Report command - per-style aggregation of best scores

use anyhow::Result;
use console::{style, Term};
use growlex_core::report::summarize;
use growlex_core::{Config, CorpusIndex, JsonPlotSink, MetricsCache, PlotSink};

pub fn run(config: &Config, dataset: Option<&str>) -> Result<()> {
    let term = Term::stdout();

    let corpus = CorpusIndex::scan(&config.audio_root(), dataset)?;
    if corpus.is_empty() {
        term.write_line(&format!(
            "{} No audio found under {:?}. Nothing to report on.",
            style("⚠").yellow(),
            config.audio_root()
        ))?;
        return Ok(());
    }

    let models = config.model_ids();
    if models.is_empty() {
        anyhow::bail!("No models configured; add [[models]] entries to the config");
    }
    let metrics = config.metric_specs()?;
    let cache = MetricsCache::load(&config.data_dir(), false)?;

    let summaries = summarize(&cache, &corpus, &models, &metrics, &config.style_rule)?;

    // Rows arrive sorted by (style, model, metric); print headers on change.
    let mut last: Option<(&str, &str)> = None;
    for row in &summaries {
        let group = (row.style.as_str(), row.model.as_str());
        if last.map(|(s, _)| s) != Some(group.0) {
            term.write_line(&format!("[STYLE] {}", style(group.0).bold()))?;
        }
        if last != Some(group) {
            term.write_line(&format!("|__ [MODEL] {}", group.1))?;
        }
        term.write_line(&format!(
            "|   |__ [METRIC] {} -- mean = {:.4} -- std = {:.4}",
            row.metric, row.mean, row.std
        ))?;
        last = Some(group);
    }

    let path = config.summary_path();
    JsonPlotSink::new(&path).render(&summaries)?;

    term.write_line("")?;
    term.write_line(&format!(
        "{} {} summary rows written to {:?}",
        style("✓").green(),
        summaries.len(),
        path
    ))?;

    Ok(())
}
