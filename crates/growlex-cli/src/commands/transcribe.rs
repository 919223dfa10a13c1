//! Transcribe command - populate the per-model transcription caches

use anyhow::Result;
use console::{style, Term};
use growlex_core::{CommandTranscriber, Config, CorpusIndex, TranscriptionCache};
use indicatif::{ProgressBar, ProgressStyle};

pub fn run(
    config: &Config,
    dataset: Option<&str>,
    model_filter: Option<&str>,
    force: bool,
) -> Result<()> {
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

    let models: Vec<_> = config
        .models
        .iter()
        .filter(|m| model_filter.map_or(true, |f| m.id == f))
        .collect();
    if models.is_empty() {
        match model_filter {
            Some(f) => anyhow::bail!("No configured model matches '{}'", f),
            None => anyhow::bail!("No models configured; add [[models]] entries to the config"),
        }
    }

    term.write_line(&format!(
        "{} Transcribing {} files across {} datasets with {} models",
        style("🎤").cyan(),
        style(corpus.file_count()).cyan(),
        style(corpus.dataset_count()).cyan(),
        style(models.len()).cyan()
    ))?;

    for model in models {
        term.write_line("")?;
        term.write_line(&format!("{}", style(&model.id).bold()))?;

        let mut cache = TranscriptionCache::load(&config.data_dir(), &model.id, force)?;
        let mut transcriber = CommandTranscriber::new(&model.command)?;

        let pb = ProgressBar::new(corpus.file_count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                .progress_chars("#>-"),
        );

        let mut fresh = 0usize;
        for (dataset_path, stems) in corpus.datasets() {
            for stem in stems {
                pb.set_message(stem.clone());
                if !cache.contains(dataset_path, stem) {
                    let audio = corpus.audio_path(dataset_path, stem)?;
                    cache.get_or_run(
                        dataset_path,
                        stem,
                        &audio,
                        model.language.as_deref(),
                        &mut transcriber,
                    )?;
                    fresh += 1;
                }
                pb.inc(1);
            }
            // A crash mid-model loses at most one dataset of work.
            cache.flush()?;
        }
        pb.finish_and_clear();

        term.write_line(&format!(
            "{} {} new transcripts, {} cached in total",
            style("✓").green(),
            fresh,
            cache.entry_count()
        ))?;
    }

    Ok(())
}
