use crate::core::story::ImageRef;
use crate::services::llm::{build_http_client, default_gemini_base_url, default_timeout};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

pub const PLACEHOLDER_BASE: &str = "https://placehold.co/1024x1024/png?text=";
pub const NOT_FOUND_MARKER: &str = "Image+Not+Found";
pub const ERROR_MARKER: &str = "Image+Error";

/// Placeholder for a response that carried no image payload.
pub fn image_not_found() -> ImageRef {
    ImageRef::new(format!("{}{}", PLACEHOLDER_BASE, NOT_FOUND_MARKER))
}

/// Placeholder for a failed request.
pub fn image_error() -> ImageRef {
    ImageRef::new(format!("{}{}", PLACEHOLDER_BASE, ERROR_MARKER))
}

#[async_trait]
pub trait ImageGenerationClient: Send + Sync + Debug {
    /// Never fails: degrades to one of the placeholders above.
    async fn generate(&self, prompt: &str) -> ImageRef;
}

// --- Config ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    pub provider: String, // "imagen" or "openai"
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    pub imagen: Option<ImagenConfig>,
    pub openai: Option<OpenAIImageConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImagenConfig {
    pub api_key: String,
    #[serde(default = "default_imagen_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIImageConfig {
    pub api_key: String,
    #[serde(default = "default_openai_image_model")]
    pub model: String,
    #[serde(default = "default_openai_image_size")]
    pub size: String,
    pub base_url: Option<String>,
}

fn default_imagen_model() -> String {
    "imagen-3.0-generate-002".to_string()
}
fn default_openai_image_model() -> String {
    "dall-e-3".to_string()
}
fn default_openai_image_size() -> String {
    "1024x1024".to_string()
}

pub fn create_image_client(config: &ImageConfig) -> Result<Arc<dyn ImageGenerationClient>> {
    let client = build_http_client(config.timeout_seconds)?;
    match config.provider.as_str() {
        "imagen" => {
            let cfg = config.imagen.as_ref().context("Imagen config missing")?;
            Ok(Arc::new(ImagenClient::new(cfg, client)))
        }
        "openai" => {
            let cfg = config.openai.as_ref().context("OpenAI image config missing")?;
            Ok(Arc::new(OpenAIImageClient::new(cfg, client)))
        }
        _ => Err(anyhow!("Unknown image provider: {}", config.provider)),
    }
}

/// `Ok(None)` means the provider answered without an image payload.
fn image_or_placeholder(provider: &str, result: Result<Option<ImageRef>>) -> ImageRef {
    match result {
        Ok(Some(image)) => image,
        Ok(None) => {
            warn!("{} returned no image payload", provider);
            image_not_found()
        }
        Err(e) => {
            warn!("{} image generation failed: {:#}", provider, e);
            image_error()
        }
    }
}

// --- Imagen ---

#[derive(Debug)]
pub struct ImagenClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl ImagenClient {
    pub fn new(config: &ImagenConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn request(&self, prompt: &str) -> Result<Option<ImageRef>> {
        let url = format!("{}/models/{}:predict", self.base_url, self.model);

        let request_body = ImagenRequest {
            instances: vec![ImagenInstance { prompt: prompt.to_string() }],
            parameters: ImagenParameters { sample_count: 1 },
        };

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
            return Err(anyhow!("Imagen API error ({}): {}", status, error_text));
        }

        let result: ImagenResponse = resp.json().await?;
        Ok(extract_imagen_image(result))
    }
}

#[derive(Serialize)]
struct ImagenRequest {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters,
}

#[derive(Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
    sample_count: u32,
}

#[derive(Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

fn extract_imagen_image(result: ImagenResponse) -> Option<ImageRef> {
    let prediction = result.predictions.into_iter().next()?;
    let payload = prediction.bytes_base64_encoded.filter(|p| !p.is_empty())?;
    let mime_type = prediction.mime_type.as_deref().unwrap_or("image/png");
    Some(ImageRef::inline(mime_type, &payload))
}

#[async_trait]
impl ImageGenerationClient for ImagenClient {
    async fn generate(&self, prompt: &str) -> ImageRef {
        image_or_placeholder("Imagen", self.request(prompt).await)
    }
}

// --- OpenAI ---

#[derive(Debug)]
pub struct OpenAIImageClient {
    api_key: String,
    model: String,
    size: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIImageClient {
    pub fn new(config: &OpenAIImageConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            size: config.size.clone(),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            client,
        }
    }

    async fn request(&self, prompt: &str) -> Result<Option<ImageRef>> {
        let url = format!("{}/images/generations", self.base_url);

        let request_body = OpenAIImageRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.size.clone(),
            response_format: "b64_json".to_string(),
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
            return Err(anyhow!("OpenAI image API error: {}", error_text));
        }

        let result: OpenAIImageResponse = resp.json().await?;
        Ok(result
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .filter(|p| !p.is_empty())
            .map(|payload| ImageRef::inline("image/png", &payload)))
    }
}

#[derive(Serialize)]
struct OpenAIImageRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    response_format: String,
}

#[derive(Deserialize)]
struct OpenAIImageResponse {
    #[serde(default)]
    data: Vec<OpenAIImageData>,
}

#[derive(Deserialize)]
struct OpenAIImageData {
    b64_json: Option<String>,
}

#[async_trait]
impl ImageGenerationClient for OpenAIImageClient {
    async fn generate(&self, prompt: &str) -> ImageRef {
        image_or_placeholder("OpenAI", self.request(prompt).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNREACHABLE: &str = "http://127.0.0.1:1";

    #[test]
    fn test_placeholders() {
        assert_eq!(
            image_not_found().as_str(),
            "https://placehold.co/1024x1024/png?text=Image+Not+Found"
        );
        assert_eq!(
            image_error().as_str(),
            "https://placehold.co/1024x1024/png?text=Image+Error"
        );
        assert!(image_error().is_placeholder());
    }

    #[test]
    fn test_imagen_request_shape() {
        let body = ImagenRequest {
            instances: vec![ImagenInstance { prompt: "a rocket".to_string() }],
            parameters: ImagenParameters { sample_count: 1 },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"instances": [{"prompt": "a rocket"}], "parameters": {"sampleCount": 1}})
        );
    }

    #[test]
    fn test_imagen_response_parsing_success() {
        let json = r#"{
            "predictions": [
                { "bytesBase64Encoded": "iVBORw0KGgo=", "mimeType": "image/png" }
            ]
        }"#;
        let result: ImagenResponse = serde_json::from_str(json).unwrap();
        let image = extract_imagen_image(result).unwrap();
        assert_eq!(image.as_str(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_imagen_response_defaults_mime_type() {
        let json = r#"{ "predictions": [ { "bytesBase64Encoded": "AAAA" } ] }"#;
        let result: ImagenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            extract_imagen_image(result).unwrap().as_str(),
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn test_imagen_response_filtered() {
        // Safety-filtered prompts come back with no predictions at all.
        let result: ImagenResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_imagen_image(result).is_none());

        let json = r#"{ "predictions": [ { "raiFilteredReason": "blocked" } ] }"#;
        let result: ImagenResponse = serde_json::from_str(json).unwrap();
        assert!(extract_imagen_image(result).is_none());
    }

    #[test]
    fn test_image_or_placeholder_mapping() {
        let inline = ImageRef::inline("image/png", "AAAA");
        assert_eq!(image_or_placeholder("Test", Ok(Some(inline.clone()))), inline);
        assert_eq!(image_or_placeholder("Test", Ok(None)), image_not_found());
        assert_eq!(
            image_or_placeholder("Test", Err(anyhow!("timed out"))),
            image_error()
        );
    }

    #[tokio::test]
    async fn test_imagen_transport_failure_returns_error_placeholder() {
        let client = ImagenClient::new(
            &ImagenConfig {
                api_key: "dummy".to_string(),
                model: "dummy".to_string(),
                base_url: UNREACHABLE.to_string(),
            },
            build_http_client(5).unwrap(),
        );
        assert_eq!(client.generate("").await, image_error());
        assert_eq!(client.generate("a castle").await, image_error());
    }

    #[tokio::test]
    async fn test_imagen_error_does_not_expose_api_key() {
        let client = ImagenClient::new(
            &ImagenConfig {
                api_key: "SUPERSECRETKEY".to_string(),
                model: "m".to_string(),
                base_url: UNREACHABLE.to_string(),
            },
            build_http_client(5).unwrap(),
        );

        let err = client.request("a castle").await.unwrap_err();
        let logged = format!("{:#}", err);
        assert!(logged.contains("127.0.0.1"), "{}", logged);
        assert!(!logged.contains("SUPERSECRETKEY"), "{}", logged);
    }

    #[tokio::test]
    async fn test_openai_transport_failure_returns_error_placeholder() {
        let client = OpenAIImageClient::new(
            &OpenAIImageConfig {
                api_key: "dummy".to_string(),
                model: default_openai_image_model(),
                size: default_openai_image_size(),
                base_url: Some(UNREACHABLE.to_string()),
            },
            build_http_client(5).unwrap(),
        );
        assert_eq!(client.generate("a jungle").await, image_error());
    }

    #[test]
    fn test_create_image_client_unknown_provider() {
        let config = ImageConfig {
            provider: "crayons".to_string(),
            timeout_seconds: 5,
            imagen: None,
            openai: None,
        };
        assert!(create_image_client(&config).is_err());
    }
}
