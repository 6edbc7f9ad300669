pub mod ollama;
pub mod openai;

use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;

#[derive(Debug, Clone)]
pub enum LLMMessage {
    System(String),
    User(Vec<LLMUserMessage>),
    Assistant(String),
}

#[derive(Debug, Clone)]
pub enum LLMUserMessage {
    Text(String),
    Image(LLMImageContent),
}

/// Base64 encoded image attached to a user turn.
#[derive(Debug, Clone)]
pub struct LLMImageContent {
    pub mime_type: String,
    pub data: String,
}

impl LLMImageContent {
    pub async fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image {}", path.display()))?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            mime_type,
            data: STANDARD.encode(bytes),
        })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Sampling options, `None` leaves the server default in place.
#[derive(Debug, Clone, Default)]
pub struct LLMInferenceParams {
    pub temperature: Option<f64>,
    pub seed: Option<u64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<usize>,
}

#[async_trait]
pub trait LLMModel: Send + Sync {
    async fn get_completion(
        &self,
        history: &[LLMMessage],
        params: &LLMInferenceParams,
    ) -> anyhow::Result<String>;

    fn model_id(&self) -> &str;
}

pub(crate) fn build_http_client(
    timeout: Option<std::time::Duration>,
) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

pub(crate) fn with_trailing_slash(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_image_content_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img1_diffuse.png");
        tokio::fs::write(&path, b"abc").await.unwrap();

        let content = LLMImageContent::from_path(&path).await.unwrap();
        assert_eq!(content.mime_type, "image/png");
        assert_eq!(content.data, "YWJj");
        assert_eq!(content.data_url(), "data:image/png;base64,YWJj");
    }

    #[test_log::test(tokio::test)]
    async fn test_image_content_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = LLMImageContent::from_path(dir.path().join("missing.png")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(with_trailing_slash("http://a/v1"), "http://a/v1/");
        assert_eq!(with_trailing_slash("http://a/v1/"), "http://a/v1/");
    }
}
