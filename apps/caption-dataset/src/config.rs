use crate::prompt::DEFAULT_PROMPT_TEMPLATE;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use strum_macros::{AsRefStr, EnumString};
use svbrdf_stats::RangeMode;

#[derive(Serialize, Deserialize, AsRefStr, EnumString, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptionProvider {
    #[default]
    #[serde(rename = "ollama")]
    #[strum(serialize = "ollama")]
    Ollama,
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAI,
    #[serde(rename = "azure_openai")]
    #[strum(serialize = "azure_openai")]
    AzureOpenAI,
}

/// What to do when one image fails.
#[derive(Serialize, Deserialize, AsRefStr, EnumString, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run and return the error.
    #[default]
    Abort,
    /// Log, record in the summary and go on with the next image.
    Continue,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default, rename_all = "snake_case")]
pub struct DatasetConfig {
    /// Holds the `diffuse`, `normals`, `roughness` and `specular` directories.
    pub dataset_root: PathBuf,
    pub output_dir: PathBuf,
    pub model: String,
    /// Placeholders: `{descriptors}`, `{specular}`, `{roughness}`, `{normals}`.
    pub prompt_template: String,
    pub provider: CaptionProvider,
    pub api_base: String,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub temperature: Option<f64>,
    pub seed: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub range_mode: RangeMode,
    pub progress_interval: usize,
    pub on_error: FailurePolicy,
    pub checkpoint: Option<PathBuf>,
    pub resume: bool,
    pub create_output_dir: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from("matfusion/datasets/cc0_svbrdfs"),
            output_dir: PathBuf::from("training_dataset"),
            model: "llava:7b-v1.6".to_string(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            provider: CaptionProvider::Ollama,
            api_base: "http://localhost:11434".to_string(),
            api_key: None,
            api_version: None,
            temperature: None,
            seed: None,
            request_timeout_secs: None,
            range_mode: RangeMode::IntegerRange,
            progress_interval: 1000,
            on_error: FailurePolicy::Abort,
            checkpoint: None,
            resume: false,
            create_output_dir: false,
            log_dir: None,
        }
    }
}

impl DatasetConfig {
    /// `.env`, then the JSON file (argument or `CAPTION_DATASET_CONFIG`), then
    /// environment overrides.
    pub fn load(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = config_path.or_else(|| {
            std::env::var("CAPTION_DATASET_CONFIG")
                .ok()
                .map(PathBuf::from)
        });

        let mut config = match config_path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DATASET_ROOT") {
            self.dataset_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CAPTION_MODEL") {
            self.model = v;
        }
        if let Some(v) = lookup("CAPTION_PROVIDER") {
            self.provider = CaptionProvider::from_str(&v)
                .map_err(|_| anyhow::anyhow!("unknown caption provider: {}", v))?;
        }
        if let Some(v) = lookup("CAPTION_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = lookup("CAPTION_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("CAPTION_API_VERSION") {
            self.api_version = Some(v);
        }
        if let Some(v) = lookup("PROMPT_TEMPLATE") {
            self.prompt_template = v;
        }
        if let Some(v) = lookup("LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.progress_interval == 0 {
            bail!("progress_interval must be greater than 0");
        }
        if self.model.is_empty() {
            bail!("model must not be empty");
        }
        if self.resume && self.checkpoint.is_none() {
            bail!("resume requires a checkpoint file");
        }
        if self.provider == CaptionProvider::AzureOpenAI {
            if self.api_version.is_none() {
                bail!("azure_openai requires api_version");
            }
            if self.api_key.is_none() {
                bail!("azure_openai requires api_key");
            }
        }
        Ok(())
    }
}
