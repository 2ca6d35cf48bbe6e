use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::{Result, TarjumaError};
use super::{GenerationParams, ModelLoader, Seq2SeqModel, TokenIds};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeRequest {
    pub model: String,
    pub text: String,
    pub src_lang: String,
    pub tgt_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub input_ids: TokenIds,
    #[serde(flatten)]
    pub params: GenerationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeRequest {
    pub model: String,
    pub output_ids: TokenIds,
    pub skip_special_tokens: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensResponse {
    pub ids: TokenIds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
}

/// Client for a model server hosting seq2seq translation models.
///
/// The server owns weights and tokenizers; loading a model id makes it
/// resident there and returns a handle bound to that id.
pub struct HttpModelServer {
    client: Client,
    endpoint: String,
}

impl HttpModelServer {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("tarjuma/0.1.0")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(TarjumaError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelLoader for HttpModelServer {
    async fn load(&self, model_id: &str) -> anyhow::Result<Arc<dyn Seq2SeqModel>> {
        let url = format!("{}/api/load", self.endpoint);
        debug!("Sending model load request to: {}", url);

        post_json(&self.client, &url, &json!({ "model": model_id }))
            .await
            .with_context(|| format!("failed to load model '{}'", model_id))?;

        Ok(Arc::new(RemoteModel {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            model_id: model_id.to_string(),
        }))
    }
}

/// A model resident on the server
pub struct RemoteModel {
    client: Client,
    endpoint: String,
    model_id: String,
}

#[async_trait]
impl Seq2SeqModel for RemoteModel {
    async fn encode(&self, text: &str, source: &str, target: &str) -> anyhow::Result<TokenIds> {
        let request = EncodeRequest {
            model: self.model_id.clone(),
            text: text.to_string(),
            src_lang: source.to_string(),
            tgt_lang: target.to_string(),
        };
        let url = format!("{}/api/encode", self.endpoint);
        let response: TokensResponse = post_json(&self.client, &url, &request).await?.json().await?;
        Ok(response.ids)
    }

    async fn generate(&self, input: &TokenIds, params: &GenerationParams) -> anyhow::Result<TokenIds> {
        let request = GenerateRequest {
            model: self.model_id.clone(),
            input_ids: input.clone(),
            params: params.clone(),
        };
        let url = format!("{}/api/generate", self.endpoint);
        let response: TokensResponse = post_json(&self.client, &url, &request).await?.json().await?;
        Ok(response.ids)
    }

    async fn decode(&self, output: &TokenIds) -> anyhow::Result<String> {
        let request = DecodeRequest {
            model: self.model_id.clone(),
            output_ids: output.clone(),
            skip_special_tokens: true,
        };
        let url = format!("{}/api/decode", self.endpoint);
        let response: TextResponse = post_json(&self.client, &url, &request).await?.json().await?;
        Ok(response.text)
    }
}

async fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &T,
) -> anyhow::Result<reqwest::Response> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("HTTP request to {} failed", url))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow!("Model server error {}: {}", status, error_text));
    }

    Ok(response)
}

/// Check that the model server is reachable
pub async fn check_server_availability(config: &ServerConfig) -> Result<()> {
    let server = HttpModelServer::new(config)?;
    let url = format!("{}/api/health", server.endpoint());

    let response = server
        .client
        .get(&url)
        .send()
        .await
        .map_err(|e| TarjumaError::Config(format!("Failed to connect to model server: {}", e)))?;

    if response.status().is_success() {
        info!("Model server at {} is available", server.endpoint());
        Ok(())
    } else {
        Err(TarjumaError::Config(format!(
            "Model server at {} returned {}",
            server.endpoint(),
            response.status()
        )))
    }
}
