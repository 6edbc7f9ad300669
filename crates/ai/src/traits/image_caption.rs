use crate::llm::{LLMImageContent, LLMInferenceParams, LLMMessage, LLMModel, LLMUserMessage};
use async_trait::async_trait;
use std::path::PathBuf;

pub const DEFAULT_CAPTION_PROMPT: &str = "Please use one sentence to describe this image.";

#[derive(Debug, Clone)]
pub struct ImageCaptionInput {
    pub image_file_paths: Vec<PathBuf>,
    pub prompt: Option<String>,
}

pub type ImageCaptionOutput = String;

#[async_trait]
pub trait ImageCaption: Send + Sync {
    async fn caption(&self, input: ImageCaptionInput) -> anyhow::Result<ImageCaptionOutput>;

    /// Model name, for logging.
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ImageCaption + ?Sized> ImageCaption for Box<T> {
    async fn caption(&self, input: ImageCaptionInput) -> anyhow::Result<ImageCaptionOutput> {
        (**self).caption(input).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Captions images with a multi-modal chat model: one user turn holding the
/// prompt and every image.
pub struct CaptionModel<M> {
    llm: M,
    params: LLMInferenceParams,
}

impl<M: LLMModel> CaptionModel<M> {
    pub fn new(llm: M, params: LLMInferenceParams) -> Self {
        Self { llm, params }
    }
}

#[async_trait]
impl<M: LLMModel> ImageCaption for CaptionModel<M> {
    #[tracing::instrument(name = "CaptionModel::caption", err(Debug), skip_all, fields(model_id = %self.llm.model_id()))]
    async fn caption(&self, input: ImageCaptionInput) -> anyhow::Result<ImageCaptionOutput> {
        if input.image_file_paths.is_empty() {
            anyhow::bail!("no image to caption");
        }

        let prompt = input
            .prompt
            .unwrap_or_else(|| DEFAULT_CAPTION_PROMPT.to_string());
        let mut parts = vec![LLMUserMessage::Text(prompt)];
        for path in &input.image_file_paths {
            parts.push(LLMUserMessage::Image(LLMImageContent::from_path(path).await?));
        }

        let output = self
            .llm
            .get_completion(&[LLMMessage::User(parts)], &self.params)
            .await?;

        Ok(output.trim().to_string())
    }

    fn model_id(&self) -> &str {
        self.llm.model_id()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLLM {
        history: Mutex<Vec<LLMMessage>>,
    }

    #[async_trait]
    impl LLMModel for RecordingLLM {
        async fn get_completion(
            &self,
            history: &[LLMMessage],
            _params: &LLMInferenceParams,
        ) -> anyhow::Result<String> {
            self.history.lock().unwrap().extend_from_slice(history);
            Ok("  A weathered oak plank under soft light.\n".into())
        }

        fn model_id(&self) -> &str {
            "recording"
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_caption_sends_prompt_and_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oak_diffuse.png");
        tokio::fs::write(&path, b"png").await.unwrap();

        let model = CaptionModel::new(RecordingLLM::default(), LLMInferenceParams::default());
        let output = model
            .caption(ImageCaptionInput {
                image_file_paths: vec![path],
                prompt: Some("describe the wood".into()),
            })
            .await
            .unwrap();

        assert_eq!(output, "A weathered oak plank under soft light.");
        assert_eq!(model.model_id(), "recording");

        let history = model.llm.history.lock().unwrap();
        assert_eq!(history.len(), 1);
        match &history[0] {
            LLMMessage::User(parts) => {
                assert!(matches!(&parts[0], LLMUserMessage::Text(t) if t == "describe the wood"));
                assert!(matches!(&parts[1], LLMUserMessage::Image(i) if i.data == "cG5n"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_caption_without_images() {
        let model = CaptionModel::new(RecordingLLM::default(), LLMInferenceParams::default());
        let result = model
            .caption(ImageCaptionInput {
                image_file_paths: vec![],
                prompt: None,
            })
            .await;
        assert!(result.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_boxed_caption_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        tokio::fs::write(&path, b"png").await.unwrap();

        let model: Box<dyn ImageCaption> = Box::new(CaptionModel::new(
            RecordingLLM::default(),
            LLMInferenceParams::default(),
        ));
        let output = model
            .caption(ImageCaptionInput {
                image_file_paths: vec![path],
                prompt: None,
            })
            .await
            .unwrap();
        assert!(output.starts_with("A weathered"));
    }
}
