//! Fetch command - download the corpus and separate vocals

use anyhow::Result;
use console::{style, Term};
use growlex_core::media::{download_audio, separate_vocals, Manifest};
use growlex_core::Config;

pub fn run(config: &Config, force: bool, no_vocals: bool) -> Result<()> {
    let term = Term::stdout();

    let manifest = Manifest::load(&config.manifest_path())?;
    let audio_root = config.audio_root();

    term.write_line(&format!(
        "{} Fetching {} songs into {:?}",
        style("⬇").cyan(),
        style(manifest.songs.len()).cyan(),
        audio_root
    ))?;
    term.write_line("")?;

    let mut downloaded = 0usize;
    let mut separated = 0usize;
    let mut skipped = 0usize;

    for entry in &manifest.songs {
        let song = entry.song_path(&audio_root);
        if download_audio(&config.fetch_tool, entry, &song, force)? {
            term.write_line(&format!("{} {}", style("✓").green(), entry.file_stem()))?;
            downloaded += 1;
        } else {
            skipped += 1;
        }

        if no_vocals {
            continue;
        }
        let vocals = entry.vocals_path(&audio_root, &config.separator_model);
        if separate_vocals(
            &config.separator_tool,
            &config.separator_model,
            &song,
            &vocals,
            force,
        )? {
            term.write_line(&format!(
                "{} {} (vocals)",
                style("✓").green(),
                entry.file_stem()
            ))?;
            separated += 1;
        }
    }

    term.write_line("")?;
    term.write_line(&format!(
        "{} {} downloaded, {} separated, {} already present",
        style("✓").green(),
        downloaded,
        separated,
        skipped
    ))?;

    Ok(())
}
