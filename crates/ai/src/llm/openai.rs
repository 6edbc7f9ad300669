use super::{
    build_http_client, with_trailing_slash, LLMInferenceParams, LLMMessage, LLMModel,
    LLMUserMessage,
};
use anyhow::bail;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, AUTHORIZATION},
    Url,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{str::FromStr, time::Duration};

pub struct OpenAI {
    base_url: String,
    model: String,
    headers: HeaderMap,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIResponseChoice {
    message: Option<OpenAIResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIResponse {
    model: Option<String>,
    choices: Vec<OpenAIResponseChoice>,
}

#[async_trait]
impl LLMModel for OpenAI {
    async fn get_completion(
        &self,
        history: &[LLMMessage],
        params: &LLMInferenceParams,
    ) -> anyhow::Result<String> {
        let url = Url::parse(&self.base_url)?;
        let query = url.query().map(|v| v.to_string());
        let mut url = url.join("chat/completions")?;
        url.set_query(query.as_deref());

        tracing::debug!("openai url: {:?}", url);

        let resp = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(&self.request_body(history, params))
            .send()
            .await?;

        if !resp.status().is_success() {
            bail!(
                "error from openai server ({}): {}",
                resp.status(),
                resp.text().await?
            );
        }

        let resp = resp.json::<OpenAIResponse>().await?;
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or(anyhow::anyhow!("no choice in openai response"))?;

        tracing::debug!(
            "LLM finish reason from {:?}: {:?}",
            resp.model,
            choice.finish_reason
        );

        choice
            .message
            .and_then(|v| v.content)
            .ok_or(anyhow::anyhow!("no content in openai response"))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

impl OpenAI {
    /// Create a new OpenAI compatible chat completion client.
    pub fn new(base_url: &str, api_key: &str, model: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", api_key).parse()?);

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            model: model.to_string(),
            headers,
            client: build_http_client(None)?,
        })
    }

    pub fn new_azure(
        azure_endpoint: &str,
        api_key: &str,
        deployment_name: &str,
        api_version: &str,
    ) -> anyhow::Result<Self> {
        let base_url = Url::from_str(azure_endpoint)?;
        let mut base_url = base_url.join(&format!("openai/deployments/{}/", deployment_name))?;
        base_url.set_query(Some(&format!("api-version={}", api_version)));

        let mut headers = HeaderMap::new();
        headers.insert("api-key", api_key.parse()?);

        Ok(Self {
            base_url: base_url.to_string(),
            model: deployment_name.to_string(),
            headers,
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
            .map(|v| {
                let (role, content) = match v {
                    LLMMessage::System(v) => ("system", json!(v)),
                    LLMMessage::User(v) => (
                        "user",
                        match v.as_slice() {
                            [LLMUserMessage::Text(text)] => json!(text),
                            parts => json!(parts
                                .iter()
                                .map(|t| match t {
                                    LLMUserMessage::Image(image) => {
                                        json!({"type": "image_url", "image_url": {"url": image.data_url()}})
                                    }
                                    LLMUserMessage::Text(text) => {
                                        json!({"type": "text", "text": text})
                                    }
                                })
                                .collect::<Vec<_>>()),
                        },
                    ),
                    LLMMessage::Assistant(v) => ("assistant", json!(v)),
                };

                json!({
                    "role": role,
                    "content": content
                })
            })
            .collect::<Vec<Value>>();

        json!({
            "model": &self.model,
            "messages": messages,
            "stream": false,
            "temperature": params.temperature,
            "seed": params.seed,
            "top_p": params.top_p,
            "max_tokens": params.max_tokens
        })
    }
}
