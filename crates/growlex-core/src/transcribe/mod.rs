//! ASR transcriber seam and the per-model transcription cache
//!
//! Model inference itself lives outside this crate. The pipeline only
//! needs an audio-path-to-text capability; the shipped implementation
//! shells out to whatever command the model's config entry declares.

mod cache;

pub use cache::TranscriptionCache;

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

/// External ASR capability: one audio file in, raw transcript out.
///
/// Errors are fatal for the run; the caller does not retry.
pub trait Transcriber {
    fn transcribe(&mut self, audio: &Path, language_hint: Option<&str>) -> Result<String>;
}

/// Transcriber that runs an external command per file.
///
/// The argv template uses `{audio}` for the audio path and `{lang}` for
/// the language hint; stdout (trimmed) is the transcript.
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriber {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("transcriber command template is empty")?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&mut self, audio: &Path, language_hint: Option<&str>) -> Result<String> {
        let mut rendered = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            if arg.contains("{lang}") && language_hint.is_none() {
                anyhow::bail!(
                    "command template for this model uses {{lang}} but no language is configured"
                );
            }
            let mut arg = arg.replace("{audio}", &audio.to_string_lossy());
            if let Some(lang) = language_hint {
                arg = arg.replace("{lang}", lang);
            }
            rendered.push(arg);
        }

        let output = Command::new(&self.program)
            .args(&rendered)
            .output()
            .with_context(|| format!("failed to spawn transcriber '{}'", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "transcriber '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_command_transcriber_captures_stdout() {
        let command = vec!["echo".to_string(), "kill the light".to_string()];
        let mut transcriber = CommandTranscriber::new(&command).unwrap();
        let text = transcriber
            .transcribe(&PathBuf::from("track.wav"), None)
            .unwrap();
        assert_eq!(text, "kill the light");
    }

    #[test]
    fn test_command_transcriber_substitutes_audio_path() {
        let command = vec!["echo".to_string(), "{audio}".to_string()];
        let mut transcriber = CommandTranscriber::new(&command).unwrap();
        let text = transcriber
            .transcribe(&PathBuf::from("songs/death/track.wav"), None)
            .unwrap();
        assert_eq!(text, "songs/death/track.wav");
    }

    #[test]
    fn test_lang_placeholder_requires_hint() {
        let command = vec![
            "echo".to_string(),
            "--language".to_string(),
            "{lang}".to_string(),
        ];
        let mut transcriber = CommandTranscriber::new(&command).unwrap();
        assert!(transcriber
            .transcribe(&PathBuf::from("track.wav"), None)
            .is_err());
        let text = transcriber
            .transcribe(&PathBuf::from("track.wav"), Some("en"))
            .unwrap();
        assert_eq!(text, "--language en");
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(CommandTranscriber::new(&[]).is_err());
    }
}
