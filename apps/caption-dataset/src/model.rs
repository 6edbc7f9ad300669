use crate::config::{CaptionProvider, DatasetConfig};
use ai::{
    llm::{ollama::Ollama, openai::OpenAI, LLMInferenceParams},
    CaptionModel, ImageCaption,
};
use std::time::Duration;

/// Instantiates the captioning client selected by `config.provider`.
pub fn create_caption_model(config: &DatasetConfig) -> anyhow::Result<Box<dyn ImageCaption>> {
    let params = LLMInferenceParams {
        temperature: config.temperature,
        seed: config.seed,
        ..Default::default()
    };
    let timeout = config.request_timeout_secs.map(Duration::from_secs);

    let model: Box<dyn ImageCaption> = match config.provider {
        CaptionProvider::Ollama => {
            let mut llm = Ollama::new(&config.api_base, &config.model)?;
            if let Some(timeout) = timeout {
                llm = llm.with_timeout(timeout)?;
            }
            Box::new(CaptionModel::new(llm, params))
        }
        CaptionProvider::OpenAI => {
            let api_key = config.api_key.as_deref().unwrap_or_default();
            let mut llm = OpenAI::new(&config.api_base, api_key, &config.model)?;
            if let Some(timeout) = timeout {
                llm = llm.with_timeout(timeout)?;
            }
            Box::new(CaptionModel::new(llm, params))
        }
        CaptionProvider::AzureOpenAI => {
            let api_key = config
                .api_key
                .as_deref()
                .ok_or(anyhow::anyhow!("azure_openai requires api_key"))?;
            let api_version = config
                .api_version
                .as_deref()
                .ok_or(anyhow::anyhow!("azure_openai requires api_version"))?;
            let mut llm = OpenAI::new_azure(&config.api_base, api_key, &config.model, api_version)?;
            if let Some(timeout) = timeout {
                llm = llm.with_timeout(timeout)?;
            }
            Box::new(CaptionModel::new(llm, params))
        }
    };

    tracing::debug!(
        "caption model {} via {}",
        model.model_id(),
        config.provider.as_ref()
    );

    Ok(model)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_create_each_provider() {
        let model = create_caption_model(&DatasetConfig::default()).unwrap();
        assert_eq!(model.model_id(), "llava:7b-v1.6");

        let config = DatasetConfig {
            provider: CaptionProvider::OpenAI,
            api_base: "https://api.openai.com/v1".into(),
            api_key: Some("sk-test".into()),
            model: "gpt-4o".into(),
            request_timeout_secs: Some(30),
            ..Default::default()
        };
        assert_eq!(create_caption_model(&config).unwrap().model_id(), "gpt-4o");

        let config = DatasetConfig {
            provider: CaptionProvider::AzureOpenAI,
            api_base: "https://example.openai.azure.com".into(),
            api_key: Some("azure-key".into()),
            api_version: Some("2024-02-01".into()),
            model: "vision".into(),
            ..Default::default()
        };
        assert_eq!(create_caption_model(&config).unwrap().model_id(), "vision");
    }

    #[test]
    fn test_azure_without_version() {
        let config = DatasetConfig {
            provider: CaptionProvider::AzureOpenAI,
            api_key: Some("azure-key".into()),
            ..Default::default()
        };
        assert!(create_caption_model(&config).is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let config = DatasetConfig {
            api_base: "not a url".into(),
            ..Default::default()
        };
        assert!(create_caption_model(&config).is_err());
    }
}
