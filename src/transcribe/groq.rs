//! Groq vision client (OpenAI-compatible chat completions).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::domain::Mode;
use crate::transcribe::{ImageUpload, Table, TableTranscriber, TranscribeError, build_prompt, parse_table_response};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
const TEMPERATURE: f64 = 0.1;
const MAX_COMPLETION_TOKENS: u32 = 2048;

pub struct VisionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl VisionClient {
    /// Build from `GROQ_API_KEY` (required), `GROQ_MODEL` and `GROQ_BASE_URL`,
    /// loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, TranscribeError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty() && !k.starts_with("your_"))
            .ok_or(TranscribeError::MissingApiKey)?;
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url = std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(api_key, base_url, model))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// `data:` URL carrying the image inline.
pub fn image_data_url(image: &ImageUpload) -> String {
    format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.bytes))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

fn chat_request<'a>(model: &'a str, prompt: &'a str, data_url: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ContentPart::Text { text: prompt },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ],
        }],
        temperature: TEMPERATURE,
        max_completion_tokens: MAX_COMPLETION_TOKENS,
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl TableTranscriber for VisionClient {
    fn transcribe(&self, image: &ImageUpload, mode: Mode) -> Result<Table, TranscribeError> {
        image.validate()?;

        let prompt = build_prompt(mode);
        let data_url = image_data_url(image);
        let body = chat_request(&self.model, &prompt, &data_url);

        log::info!("transcribe: {} bytes ({}) via {}", image.bytes.len(), image.mime_type, self.model);
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| TranscribeError::Service(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscribeError::RateLimited);
        }
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(TranscribeError::Service(format!("status {status}: {detail}")));
        }

        let body: ChatResponse = resp
            .json()
            .map_err(|e| TranscribeError::InvalidResponse(format!("Failed to parse service response: {e}")))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TranscribeError::InvalidResponse("Vision model returned an empty response.".into()))?;

        log::debug!("transcribe: raw reply {content:?}");
        parse_table_response(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_is_base64_encoded() {
        let image = ImageUpload::new(b"abc".to_vec(), "image/png");
        assert_eq!(image_data_url(&image), "data:image/png;base64,YWJj");
    }

    #[test]
    fn request_body_matches_chat_completions_shape() {
        let body = chat_request("m", "prompt", "data:image/png;base64,AA==");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["temperature"], 0.1);
        assert_eq!(v["max_completion_tokens"], 2048);
        assert_eq!(v["messages"][0]["content"][0]["type"], "text");
        assert_eq!(v["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(v["messages"][0]["content"][1]["image_url"]["url"], "data:image/png;base64,AA==");
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let client = VisionClient::new("key", "http://localhost:8080/v1/", "m");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(client.model(), "m");
    }

    #[test]
    fn invalid_upload_fails_without_network() {
        let client = VisionClient::new("key", "http://127.0.0.1:9", "m");
        let err = client
            .transcribe(&ImageUpload::new(Vec::new(), "image/png"), Mode::Cmc)
            .unwrap_err();
        assert!(matches!(err, TranscribeError::InvalidUpload(_)));
    }
}
