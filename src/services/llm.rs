use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Returned when the provider answered but produced no usable text.
pub const TEXT_FALLBACK_NO_CONTENT: &str =
    "Oh no, the magic words got lost on their way! Let's imagine what happens next together.";
/// Returned on transport, status, parse and timeout failures.
pub const TEXT_FALLBACK_ERROR: &str =
    "The storyteller is sleeping right now. Let's try again in a little while!";

#[async_trait]
pub trait TextGenerationClient: Send + Sync + Debug {
    /// Never fails: degrades to one of the fallback strings above.
    async fn generate(&self, prompt: &str) -> String;
}

// --- Config ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextConfig {
    pub provider: String, // "gemini", "ollama" or "openai"
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    pub gemini: Option<GeminiConfig>,
    pub ollama: Option<OllamaConfig>,
    pub openai: Option<OpenAIConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

pub(crate) fn default_timeout() -> u64 {
    60
}
fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}
pub(crate) fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// A zero timeout would fail every call, so it means "use the default".
pub(crate) fn request_timeout(timeout_seconds: u64) -> Duration {
    if timeout_seconds == 0 {
        warn!("timeout_seconds is 0, using {}s", default_timeout());
        Duration::from_secs(default_timeout())
    } else {
        Duration::from_secs(timeout_seconds)
    }
}

pub(crate) fn build_http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout(timeout_seconds))
        .build()
        .context("Failed to build HTTP client")
}

pub fn create_text_client(config: &TextConfig) -> Result<Arc<dyn TextGenerationClient>> {
    let client = build_http_client(config.timeout_seconds)?;
    match config.provider.as_str() {
        "gemini" => {
            let cfg = config.gemini.as_ref().context("Gemini config missing")?;
            Ok(Arc::new(GeminiClient::new(cfg, client)))
        }
        "ollama" => {
            let cfg = config.ollama.as_ref().context("Ollama config missing")?;
            Ok(Arc::new(OllamaClient::new(&cfg.base_url, &cfg.model, client)))
        }
        "openai" => {
            let cfg = config.openai.as_ref().context("OpenAI config missing")?;
            Ok(Arc::new(OpenAIClient::new(
                &cfg.api_key,
                &cfg.model,
                cfg.base_url.as_deref(),
                client,
            )))
        }
        _ => Err(anyhow!("Unknown text provider: {}", config.provider)),
    }
}

/// `Ok(None)` means the provider returned nothing usable.
fn text_or_fallback(provider: &str, result: Result<Option<String>>) -> String {
    match result {
        Ok(Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!("{} returned no text content", provider);
            TEXT_FALLBACK_NO_CONTENT.to_string()
        }
        Err(e) => {
            warn!("{} text generation failed: {:#}", provider, e);
            TEXT_FALLBACK_ERROR.to_string()
        }
    }
}

// --- Gemini ---
#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn request(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
        };

        // Key travels in a header; request errors embed the URL and get logged.
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        let response_text = resp.text().await?;
        let result: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            anyhow!("Failed to parse Gemini response: {}. Body: {}", e, response_text)
        })?;
        extract_gemini_text(result)
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

fn extract_gemini_text(result: GeminiResponse) -> Result<Option<String>> {
    if let Some(err) = result.error {
        return Err(anyhow!("Gemini API returned error: {}", err.message));
    }

    let Some(first) = result.candidates.as_ref().and_then(|c| c.first()) else {
        return Ok(None);
    };

    let text = first
        .content
        .as_ref()
        .and_then(|content| content.parts.first())
        .and_then(|part| part.text.clone());

    if text.is_none() {
        let reason = first.finish_reason.as_deref().unwrap_or("UNKNOWN");
        debug!("Gemini candidate had no text. Finish reason: {}", reason);
    }
    Ok(text)
}

#[async_trait]
impl TextGenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> String {
        text_or_fallback("Gemini", self.request(prompt).await)
    }
}

// --- Ollama ---
#[derive(Debug)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        }
    }

    async fn request(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!("{}/api/chat", self.base_url);

        let request_body = OllamaRequest {
            model: self.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Ollama API error: {}", error_text));
        }

        let result: OllamaResponse = resp.json().await?;
        Ok(result.message.and_then(|m| m.content))
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: Option<OllamaMessageResponse>,
}

#[derive(Deserialize)]
struct OllamaMessageResponse {
    content: Option<String>,
}

#[async_trait]
impl TextGenerationClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> String {
        text_or_fallback("Ollama", self.request(prompt).await)
    }
}

// --- OpenAI ---

#[derive(Debug)]
pub struct OpenAIClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            client,
        }
    }

    async fn request(&self, prompt: &str) -> Result<Option<String>> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("OpenAI API error: {}", error_text));
        }

        let result: OpenAIResponse = resp.json().await?;
        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

#[async_trait]
impl TextGenerationClient for OpenAIClient {
    async fn generate(&self, prompt: &str) -> String {
        text_or_fallback("OpenAI", self.request(prompt).await)
    }
}
