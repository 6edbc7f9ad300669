use super::{
    build_http_client, with_trailing_slash, LLMInferenceParams, LLMMessage, LLMModel,
    LLMUserMessage,
};
use anyhow::bail;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Client for the chat endpoint of an Ollama server.
pub struct Ollama {
    base_url: Url,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaChatResponse {
    model: Option<String>,
    message: OllamaResponseMessage,
    done: Option<bool>,
}

impl Ollama {
    pub fn new(base_url: &str, model: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: Url::parse(&with_trailing_slash(base_url))?,
            model: model.to_string(),
            client: build_http_client(None)?,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> anyhow::Result<Self> {
        self.client = build_http_client(Some(timeout))?;
        Ok(self)
    }

    fn request_body(&self, history: &[LLMMessage], params: &LLMInferenceParams) -> Value {
        let messages = history
            .iter()
            .map(|v| match v {
                LLMMessage::System(text) => json!({"role": "system", "content": text}),
                LLMMessage::Assistant(text) => json!({"role": "assistant", "content": text}),
                LLMMessage::User(parts) => {
                    let mut texts = vec![];
                    let mut images = vec![];
                    for part in parts {
                        match part {
                            LLMUserMessage::Text(text) => texts.push(text.as_str()),
                            LLMUserMessage::Image(image) => images.push(image.data.as_str()),
                        }
                    }

                    let mut message = json!({"role": "user", "content": texts.join("\n")});
                    if !images.is_empty() {
                        message["images"] = json!(images);
                    }
                    message
                }
            })
            .collect::<Vec<Value>>();

        let mut options = Map::new();
        if let Some(temperature) = params.temperature {
            options.insert("temperature".into(), json!(temperature));
        }
        if let Some(seed) = params.seed {
            options.insert("seed".into(), json!(seed));
        }
        if let Some(top_p) = params.top_p {
            options.insert("top_p".into(), json!(top_p));
        }
        if let Some(max_tokens) = params.max_tokens {
            options.insert("num_predict".into(), json!(max_tokens));
        }

        let mut body = json!({
            "model": &self.model,
            "messages": messages,
            "stream": false,
        });
        if !options.is_empty() {
            body["options"] = Value::Object(options);
        }
        body
    }
}

#[async_trait]
impl LLMModel for Ollama {
    async fn get_completion(
        &self,
        history: &[LLMMessage],
        params: &LLMInferenceParams,
    ) -> anyhow::Result<String> {
        let url = self.base_url.join("api/chat")?;
        tracing::debug!("ollama url: {:?}", url);

        let resp = self
            .client
            .post(url)
            .json(&self.request_body(history, params))
            .send()
            .await?;

        if !resp.status().is_success() {
            bail!(
                "error from ollama server ({}): {}",
                resp.status(),
                resp.text().await?
            );
        }

        let resp = resp.json::<OllamaChatResponse>().await?;
        tracing::debug!(
            "ollama response from {:?}, done: {:?}",
            resp.model,
            resp.done
        );

        Ok(resp.message.content)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
