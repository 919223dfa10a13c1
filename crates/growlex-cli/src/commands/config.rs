//! Config command - manage configuration

use anyhow::Result;
use console::{style, Term};
use growlex_core::Config;

pub fn show(config: &Config) -> Result<()> {
    let term = Term::stdout();

    term.write_line(&format!("{}", style("Growlex Configuration").bold()))?;
    term.write_line("")?;

    term.write_line(&format!(
        "Dataset dir:      {}",
        style(config.dataset_dir.display()).cyan()
    ))?;
    term.write_line(&format!(
        "Output dir:       {}",
        style(config.output_dir.display()).cyan()
    ))?;
    term.write_line(&format!(
        "Fetch tool:       {}",
        style(&config.fetch_tool).cyan()
    ))?;
    term.write_line(&format!(
        "Separator:        {}",
        style(format!(
            "{} ({})",
            config.separator_tool, config.separator_model
        ))
        .cyan()
    ))?;
    term.write_line(&format!(
        "Style rule:       {}",
        style(format!("{:?}", config.style_rule)).cyan()
    ))?;
    term.write_line(&format!(
        "Metrics:          {}",
        style(config.metrics.join(", ")).cyan()
    ))?;

    term.write_line("")?;
    term.write_line(&format!("{}", style("Models:").dim()))?;
    if config.models.is_empty() {
        term.write_line("  (none)")?;
    }
    for model in &config.models {
        term.write_line(&format!("  - {} ({})", model.id, model.command.join(" ")))?;
    }

    if !config.embedders.is_empty() {
        term.write_line("")?;
        term.write_line(&format!("{}", style("Embedders:").dim()))?;
        for embedder in &config.embedders {
            term.write_line(&format!(
                "  - {} (max {} chars)",
                embedder.id, embedder.max_input_chars
            ))?;
        }
    }

    Ok(())
}

pub fn init(config: &Config) -> Result<()> {
    let term = Term::stdout();

    config.save(None)?;

    term.write_line(&format!(
        "{} Wrote {:?}",
        style("✓").green(),
        Config::default_config_path()?
    ))?;

    Ok(())
}

pub fn show_path() -> Result<()> {
    let term = Term::stdout();
    let config_path = Config::default_config_path()?;

    term.write_line(&format!("Config file: {:?}", config_path))?;

    if config_path.exists() {
        term.write_line(&format!("{} File exists", style("✓").green()))?;
    } else {
        term.write_line(&format!(
            "{} File does not exist (using defaults)",
            style("ℹ").blue()
        ))?;
    }

    Ok(())
}
