//! Upstream text generation for the AI stream endpoint.

use markpad_core::ai::{FrameDecoder, GenerateRequest, StreamFrame};
use markpad_core::config::AiConfig;
use markpad_core::AppError;
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Frames buffered between the provider task and the HTTP response.
const FRAME_BUFFER: usize = 32;
const UPSTREAM_DONE: &str = "[DONE]";

/// Source of streamed generation frames.
///
/// Implementations spawn their own producer and hand back the receiving end;
/// a dropped receiver means the client went away and production stops.
pub trait TextGenerator: Send + Sync {
    /// Start a generation.
    ///
    /// # Errors
    /// Returns an error when generation cannot start at all.
    fn generate(&self, request: GenerateRequest) -> Result<mpsc::Receiver<StreamFrame>, AppError>;
}

/// Generator used when no provider key is configured.
pub struct DisabledGenerator;

impl TextGenerator for DisabledGenerator {
    fn generate(&self, _request: GenerateRequest) -> Result<mpsc::Receiver<StreamFrame>, AppError> {
        Err(AppError::Unavailable(
            "AI generation is not configured on this server".to_string(),
        ))
    }
}

/// OpenAI-compatible streaming chat completion provider.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: AiConfig,
}

impl OpenAiGenerator {
    pub fn new(config: AiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

impl TextGenerator for OpenAiGenerator {
    fn generate(&self, request: GenerateRequest) -> Result<mpsc::Receiver<StreamFrame>, AppError> {
        let Some(api_key) = self.config.api_key.clone() else {
            return DisabledGenerator.generate(request);
        };
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let client = self.client.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            if let Err(err) = stream_completion(&client, &config, &api_key, &request, &tx).await {
                tracing::warn!("AI generation failed: {}", err);
                let _ = tx.send(StreamFrame::error(err.to_string())).await;
            }
        });
        Ok(rx)
    }
}

/// Extract the text delta from one upstream chunk.
pub fn delta_content(payload: &Value) -> Option<&str> {
    payload
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
}

async fn stream_completion(
    client: &reqwest::Client,
    config: &AiConfig,
    api_key: &str,
    request: &GenerateRequest,
    tx: &mpsc::Sender<StreamFrame>,
) -> Result<(), AppError> {
    let body = json!({
        "model": config.model,
        "stream": true,
        "messages": request.prompt_messages(),
    });
    let mut response = client
        .post(&config.api_url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| AppError::Upstream(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "provider responded with {}",
            status
        )));
    }

    let mut decoder = FrameDecoder::new();
    loop {
        let chunk = response
            .chunk()
            .await
            .map_err(|err| AppError::Upstream(err.to_string()))?;
        let finished = chunk.is_none();
        let payloads = match chunk {
            Some(bytes) => decoder.push(&bytes),
            None => decoder.finish().into_iter().collect(),
        };
        for payload in payloads {
            if payload.trim() == UPSTREAM_DONE {
                let _ = tx.send(StreamFrame::done()).await;
                return Ok(());
            }
            let value: Value = serde_json::from_str(&payload)?;
            if let Some(content) = delta_content(&value).filter(|text| !text.is_empty()) {
                if tx.send(StreamFrame::content(content)).await.is_err() {
                    tracing::debug!("Client disconnected; stopping generation");
                    return Ok(());
                }
            }
        }
        if finished {
            break;
        }
    }
    let _ = tx.send(StreamFrame::done()).await;
    Ok(())
}
