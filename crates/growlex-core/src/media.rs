//! Corpus acquisition: song download and vocal separation
//!
//! Both steps shell out (yt-dlp and demucs by default) and are
//! idempotent on the target path, so re-running fetch after adding
//! songs to the manifest only touches the new entries.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::{GrowlexError, Result};

/// One song the corpus should contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongEntry {
    pub style: String,
    pub artist: String,
    pub title: String,
    pub url: String,
}

impl SongEntry {
    /// `"{artist} - {title}"`, the stem shared by every store.
    pub fn file_stem(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    /// Where the full mix lands under the audio root.
    pub fn song_path(&self, audio_root: &Path) -> PathBuf {
        audio_root
            .join("songs")
            .join(&self.style)
            .join(format!("{}.wav", self.file_stem()))
    }

    /// Where the separated vocal track lands under the audio root.
    pub fn vocals_path(&self, audio_root: &Path, separator_model: &str) -> PathBuf {
        audio_root
            .join(format!("vocals_demucs_{separator_model}"))
            .join(&self.style)
            .join(format!("{}.wav", self.file_stem()))
    }
}

/// The list of songs a dataset is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub songs: Vec<SongEntry>,
}

impl Manifest {
    pub const FILE_NAME: &'static str = "manifest.json";

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GrowlexError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| GrowlexError::MalformedStore {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Downloads one song as wav via `tool` (yt-dlp compatible flags).
///
/// Returns `false` when the target already exists and `force` is off.
pub fn download_audio(tool: &str, entry: &SongEntry, target: &Path, force: bool) -> Result<bool> {
    if target.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GrowlexError::io(parent, e))?;
    }

    // yt-dlp appends the postprocessed extension to the output template.
    let template = target.with_extension("");
    let status = Command::new(tool)
        .arg("-f")
        .arg("m4a/bestaudio/best")
        .arg("--extract-audio")
        .arg("--audio-format")
        .arg("wav")
        .arg("-o")
        .arg(&template)
        .arg(&entry.url)
        .status()
        .map_err(|e| GrowlexError::Tool {
            tool: tool.to_string(),
            detail: e.to_string(),
        })?;
    if !status.success() {
        return Err(GrowlexError::Tool {
            tool: tool.to_string(),
            detail: format!("exited with {} while downloading {}", status, entry.url),
        });
    }
    if !target.exists() {
        return Err(GrowlexError::Tool {
            tool: tool.to_string(),
            detail: format!("did not produce {}", target.display()),
        });
    }
    Ok(true)
}

/// Separates the vocal stem of `source` into `target` via `tool`
/// (demucs compatible flags).
///
/// Returns `false` when the target already exists and `force` is off.
pub fn separate_vocals(
    tool: &str,
    separator_model: &str,
    source: &Path,
    target: &Path,
    force: bool,
) -> Result<bool> {
    if target.exists() && !force {
        return Ok(false);
    }
    let parent = target.parent().ok_or_else(|| GrowlexError::Tool {
        tool: tool.to_string(),
        detail: format!("target {} has no parent directory", target.display()),
    })?;
    std::fs::create_dir_all(parent).map_err(|e| GrowlexError::io(parent, e))?;

    // demucs writes <out>/<model>/<track>/vocals.wav; use a scratch
    // directory next to the target and move the stem into place.
    let scratch = parent.join(".demucs-work");
    std::fs::create_dir_all(&scratch).map_err(|e| GrowlexError::io(&scratch, e))?;

    let status = Command::new(tool)
        .arg("--two-stems")
        .arg("vocals")
        .arg("-n")
        .arg(separator_model)
        .arg("-o")
        .arg(&scratch)
        .arg(source)
        .status()
        .map_err(|e| GrowlexError::Tool {
            tool: tool.to_string(),
            detail: e.to_string(),
        })?;
    if !status.success() {
        return Err(GrowlexError::Tool {
            tool: tool.to_string(),
            detail: format!("exited with {} while separating {}", status, source.display()),
        });
    }

    let track = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let produced = scratch.join(separator_model).join(track).join("vocals.wav");
    if !produced.exists() {
        return Err(GrowlexError::Tool {
            tool: tool.to_string(),
            detail: format!("did not produce {}", produced.display()),
        });
    }
    std::fs::rename(&produced, target).map_err(|e| GrowlexError::io(target, e))?;
    let _ = std::fs::remove_dir_all(&scratch);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry() -> SongEntry {
        SongEntry {
            style: "death".to_string(),
            artist: "Bloodbath".to_string(),
            title: "Like Fire".to_string(),
            url: "https://example.invalid/watch?v=x".to_string(),
        }
    }

    #[test]
    fn test_song_paths_follow_the_layout() {
        let e = entry();
        let root = Path::new("/data/audio");
        assert_eq!(
            e.song_path(root),
            Path::new("/data/audio/songs/death/Bloodbath - Like Fire.wav")
        );
        assert_eq!(
            e.vocals_path(root, "htdemucs_ft"),
            Path::new("/data/audio/vocals_demucs_htdemucs_ft/death/Bloodbath - Like Fire.wav")
        );
    }

    #[test]
    fn test_manifest_parses() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(Manifest::FILE_NAME);
        std::fs::write(
            &path,
            r#"{"songs": [{"style": "black", "artist": "Mayhem", "title": "Freezing Moon", "url": "https://example.invalid/y"}]}"#,
        )
        .unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.songs.len(), 1);
        assert_eq!(manifest.songs[0].file_stem(), "Mayhem - Freezing Moon");
    }

    #[test]
    fn test_manifest_missing_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = Manifest::load(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, GrowlexError::Io { .. }));
    }

    #[test]
    fn test_download_skips_existing_target() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("songs/death/x.wav");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"audio").unwrap();
        // Tool name is bogus on purpose; it must never be spawned.
        let ran = download_audio("no-such-tool-anywhere", &entry(), &target, false).unwrap();
        assert!(!ran);
    }

    #[test]
    fn test_separation_skips_existing_target() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("songs/death/x.wav");
        let target = tmp.path().join("vocals_demucs_htdemucs_ft/death/x.wav");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"vocals").unwrap();
        let ran =
            separate_vocals("no-such-tool-anywhere", "htdemucs_ft", &source, &target, false)
                .unwrap();
        assert!(!ran);
    }

    #[test]
    fn test_missing_tool_is_a_tool_error() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("songs/death/x.wav");
        let err = download_audio("no-such-tool-anywhere", &entry(), &target, false).unwrap_err();
        assert!(matches!(err, GrowlexError::Tool { .. }));
    }
}
