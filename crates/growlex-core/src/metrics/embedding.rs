//! Embedding-based similarity between ground truth and transcript
//!
//! Embedding models are external collaborators, same as the ASR models.
//! The crate defines the seam ([`TextEmbedder`]) plus a subprocess
//! implementation that feeds text on stdin and expects a JSON float
//! array on stdout.

use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::Context;

use crate::error::{GrowlexError, Result};

/// Maps a text to a fixed-size vector.
///
/// Implementations declare how many characters they accept; longer
/// input is truncated before `embed` is called.
pub trait TextEmbedder {
    fn max_input_chars(&self) -> usize;
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Instantiates embedding backends by id.
pub trait EmbedderProvider {
    /// A fresh backend for `backend_id`, or `None` when the id is not
    /// declared anywhere.
    fn create(&self, backend_id: &str) -> Option<Box<dyn TextEmbedder>>;
}

/// Cosine similarity between the embeddings of two texts.
pub struct EmbeddingMetric {
    backend_id: String,
    backend: Box<dyn TextEmbedder>,
}

impl EmbeddingMetric {
    pub fn new(backend_id: &str, backend: Box<dyn TextEmbedder>) -> Self {
        Self {
            backend_id: backend_id.to_string(),
            backend,
        }
    }

    pub(crate) fn compute(&mut self, reference: &str, hypothesis: &str) -> Result<f64> {
        let limit = self.backend.max_input_chars();
        let reference = truncate_chars(reference, limit);
        let hypothesis = truncate_chars(hypothesis, limit);
        let a = self.embed(reference)?;
        let b = self.embed(hypothesis)?;
        Ok(cosine_similarity(&a, &b))
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        self.backend
            .embed(text)
            .map_err(|source| GrowlexError::Embedder {
                backend: self.backend_id.clone(),
                source,
            })
    }
}

/// Longest prefix of `text` holding at most `limit` characters.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Embedder that runs an external command per text: input on stdin,
/// JSON array of floats on stdout.
pub struct CommandEmbedder {
    program: String,
    args: Vec<String>,
    max_input_chars: usize,
}

impl TextEmbedder for CommandEmbedder {
    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn embedder '{}'", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .context("failed to write text to embedder stdin")?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to read embedder '{}'", self.program))?;
        if !output.status.success() {
            anyhow::bail!(
                "embedder '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let vector: Vec<f32> = serde_json::from_slice(&output.stdout)
            .context("embedder stdout is not a JSON float array")?;
        anyhow::ensure!(!vector.is_empty(), "embedder returned an empty vector");
        Ok(vector)
    }
}

/// Provider over the embedding backends declared in config.
#[derive(Default)]
pub struct CommandEmbedderProvider {
    backends: BTreeMap<String, (Vec<String>, usize)>,
}

impl CommandEmbedderProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        backend_id: &str,
        command: &[String],
        max_input_chars: usize,
    ) -> anyhow::Result<()> {
        anyhow::ensure!(
            !command.is_empty(),
            "embedder '{}' has an empty command template",
            backend_id
        );
        anyhow::ensure!(
            max_input_chars > 0,
            "embedder '{}' must accept at least one character",
            backend_id
        );
        self.backends
            .insert(backend_id.to_string(), (command.to_vec(), max_input_chars));
        Ok(())
    }
}

impl EmbedderProvider for CommandEmbedderProvider {
    fn create(&self, backend_id: &str) -> Option<Box<dyn TextEmbedder>> {
        let (command, max_input_chars) = self.backends.get(backend_id)?;
        let (program, args) = command.split_first()?;
        Some(Box::new(CommandEmbedder {
            program: program.clone(),
            args: args.to_vec(),
            max_input_chars: *max_input_chars,
        }))
    }
}

// ============================================================
// Tests
// ============================================================
