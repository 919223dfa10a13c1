//! Configuration management for Growlex

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::metrics::{CommandEmbedderProvider, MetricSpec};
use crate::report::StyleRule;

/// One ASR model the benchmark runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AsrModel {
    /// Identifier used in cache file names, score keys and reports.
    pub id: String,
    /// Command template producing the transcript on stdout; `{audio}`
    /// and `{lang}` are substituted per file.
    pub command: Vec<String>,
    /// Fixed language hint for models that want one.
    #[serde(default)]
    pub language: Option<String>,
}

/// One embedding backend, addressable as `embedding:<id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedderEntry {
    pub id: String,
    /// Command template: text on stdin, JSON float array on stdout.
    pub command: Vec<String>,
    /// Longest input the backend accepts; longer text is truncated.
    pub max_input_chars: usize,
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dataset root: audio/, lyrics.json and manifest.json live here.
    pub dataset_dir: PathBuf,
    /// Output root: data/ caches and reports/ land here.
    pub output_dir: PathBuf,
    /// Tool used to download songs (yt-dlp compatible).
    pub fetch_tool: String,
    /// Tool used to separate vocals (demucs compatible).
    pub separator_tool: String,
    /// Separation model; names the vocals directory.
    pub separator_model: String,
    /// ASR models to benchmark, in evaluation order.
    pub models: Vec<AsrModel>,
    /// Metric identifiers, in evaluation order.
    pub metrics: Vec<String>,
    /// Embedding backends referenced by `embedding:<id>` metrics.
    pub embedders: Vec<EmbedderEntry>,
    /// How a song's style is derived for reports.
    pub style_rule: StyleRule,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("dataset"),
            output_dir: PathBuf::from("output"),
            fetch_tool: "yt-dlp".to_string(),
            separator_tool: "demucs".to_string(),
            separator_model: "htdemucs_ft".to_string(),
            models: vec![],
            metrics: vec![
                "wer".to_string(),
                "bleu".to_string(),
                "rouge-l".to_string(),
            ],
            embedders: vec![],
            style_rule: StyleRule::DatasetLeaf,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        let config: Self = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "growlex", "growlex")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Reject configurations that would fail halfway through a run.
    pub fn validate(&self) -> Result<()> {
        for model in &self.models {
            anyhow::ensure!(!model.id.is_empty(), "a model entry has an empty id");
            anyhow::ensure!(
                !model.command.is_empty(),
                "model '{}' has an empty command template",
                model.id
            );
        }
        for (i, model) in self.models.iter().enumerate() {
            if self.models[..i].iter().any(|m| m.id == model.id) {
                anyhow::bail!("model '{}' is listed twice", model.id);
            }
        }

        for entry in &self.embedders {
            anyhow::ensure!(!entry.id.is_empty(), "an embedder entry has an empty id");
            anyhow::ensure!(
                !entry.command.is_empty(),
                "embedder '{}' has an empty command template",
                entry.id
            );
            anyhow::ensure!(
                entry.max_input_chars > 0,
                "embedder '{}' must accept at least one character",
                entry.id
            );
        }

        for name in &self.metrics {
            let spec = MetricSpec::parse(name)
                .with_context(|| format!("config lists metric '{name}'"))?;
            if let MetricSpec::Embedding { backend } = &spec {
                anyhow::ensure!(
                    self.embedders.iter().any(|e| &e.id == backend),
                    "metric '{}' references embedder '{}' which is not declared",
                    name,
                    backend
                );
            }
        }
        Ok(())
    }

    /// Parsed metric list, in config order.
    pub fn metric_specs(&self) -> crate::error::Result<Vec<MetricSpec>> {
        self.metrics.iter().map(|name| MetricSpec::parse(name)).collect()
    }

    /// Model ids, in config order.
    pub fn model_ids(&self) -> Vec<String> {
        self.models.iter().map(|m| m.id.clone()).collect()
    }

    /// Provider over the configured embedding backends.
    pub fn embedder_provider(&self) -> Result<CommandEmbedderProvider> {
        let mut provider = CommandEmbedderProvider::new();
        for entry in &self.embedders {
            provider.register(&entry.id, &entry.command, entry.max_input_chars)?;
        }
        Ok(provider)
    }

    pub fn audio_root(&self) -> PathBuf {
        self.dataset_dir.join("audio")
    }

    pub fn lyrics_path(&self) -> PathBuf {
        self.dataset_dir.join("lyrics.json")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dataset_dir.join(crate::media::Manifest::FILE_NAME)
    }

    /// Where transcription caches and the score matrix live.
    pub fn data_dir(&self) -> PathBuf {
        self.output_dir.join("data")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join("reports").join("summary.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_model(mut config: Config) -> Config {
        config.models.push(AsrModel {
            id: "openai/whisper-large-v3".to_string(),
            command: vec!["whisper-cli".to_string(), "{audio}".to_string()],
            language: None,
        });
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = with_model(Config::default());
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.models, config.models);
        assert_eq!(back.metrics, config.metrics);
        assert_eq!(back.style_rule, config.style_rule);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let mut config = with_model(Config::default());
        config.separator_model = "mdx_extra".to_string();
        config.save(Some(path_str)).unwrap();

        let loaded = Config::load(Some(path_str)).unwrap();
        assert_eq!(loaded.separator_model, "mdx_extra");
        assert_eq!(loaded.models.len(), 1);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let loaded = Config::load(Some("/definitely/not/here.toml")).unwrap();
        assert_eq!(loaded.metrics, Config::default().metrics);
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let mut config = Config::default();
        config.metrics.push("cer".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_embedding_metric_requires_declared_backend() {
        let mut config = Config::default();
        config.metrics.push("embedding:all-minilm-l6-v2".to_string());
        assert!(config.validate().is_err());

        config.embedders.push(EmbedderEntry {
            id: "all-minilm-l6-v2".to_string(),
            command: vec!["embed-cli".to_string()],
            max_input_chars: 256,
        });
        config.validate().unwrap();
    }

    #[test]
    fn test_duplicate_model_ids_rejected() {
        let config = with_model(with_model(Config::default()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_paths() {
        let config = Config::default();
        assert_eq!(config.lyrics_path(), PathBuf::from("dataset/lyrics.json"));
        assert_eq!(config.data_dir(), PathBuf::from("output/data"));
        assert_eq!(
            config.summary_path(),
            PathBuf::from("output/reports/summary.json")
        );
    }
}
