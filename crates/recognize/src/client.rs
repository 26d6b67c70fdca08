//! OpenAI-compatible vision client.
//!
//! Blocking reqwest client (no Tokio runtime required). One request per
//! page: the image goes inline as a base64 data URL, the model answers with
//! a JSON object that [`document_from_text`] normalizes.

use std::time::Duration;

use base64::Engine as _;
use serde::Deserialize;

use crate::error::RecognitionError;
use crate::normalize::document_from_text;
use crate::recognizer::{PageImage, RecognitionConfig, RecognizedDocument, Recognizer};

const PROMPT: &str = "You read Chinese expense documents. Classify the image as either an \
invoice or a trip sheet (a ride-hailing itinerary) and reply with one JSON object only.\n\
Common fields: type (\"invoice\" or \"trip_sheet\"), date (YYYY-MM-DD or MM/DD), amount \
(total in yuan), description, confidence (0-100).\n\
Invoice fields: category (one of consumables, hotel, taxi, shipping, toll, train, other), \
invoice_number, vendor, tax.\n\
Trip sheet fields: platform, origin, destination, departure_time, distance (km).";

/// Vision recognition client (blocking).
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl VisionClient {
    pub fn new() -> Result<Self, RecognitionError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("expensor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RecognitionError::Network(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    fn request_body(page: &PageImage, model: &str) -> serde_json::Value {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&page.bytes);
        let data_url = format!("data:{};base64,{}", page.media_type, encoded);
        serde_json::json!({
            "model": model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": "Extract the document fields." },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ]
        })
    }
}

impl Recognizer for VisionClient {
    fn recognize(
        &self,
        page: &PageImage,
        config: &RecognitionConfig,
        timeout: Duration,
    ) -> Result<RecognizedDocument, RecognitionError> {
        let url = completions_url(&config.endpoint);
        log::debug!(
            "recognize: POST {} ({} bytes, {})",
            url,
            page.bytes.len(),
            page.media_type
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&config.api_key)
            .timeout(timeout)
            .json(&Self::request_body(page, &config.model))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    RecognitionError::Timeout(format!("no response within {}s", timeout.as_secs()))
                } else {
                    RecognitionError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_else(|e| {
                log::debug!("recognize: could not read HTTP {} body: {}", status, e);
                String::new()
            });
            return Err(classify_status(status, body));
        }

        // The request timeout also covers the body read.
        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                RecognitionError::Timeout(format!(
                    "response body not received within {}s",
                    timeout.as_secs()
                ))
            } else {
                RecognitionError::Network(format!("failed to read response body: {}", e))
            }
        })?;
        let chat: ChatResponse =
            serde_json::from_str(&body).map_err(|e| RecognitionError::Malformed(e.to_string()))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RecognitionError::Malformed("response has no message content".into()))?;

        document_from_text(&content)
    }
}

/// Accepts either a base URL (`.../v1`) or the full completions URL.
fn completions_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

fn classify_status(status: u16, body: String) -> RecognitionError {
    match status {
        401 | 403 => RecognitionError::InvalidCredential(body),
        429 => RecognitionError::RateLimited(body),
        _ => RecognitionError::Upstream {
            status,
            message: body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completions_url_forms() {
        assert_eq!(
            completions_url("https://api.example.com/v1/"),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://api.example.com/v1/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn status_classes() {
        assert!(matches!(
            classify_status(401, String::new()),
            RecognitionError::InvalidCredential(_)
        ));
        assert!(matches!(
            classify_status(403, String::new()),
            RecognitionError::InvalidCredential(_)
        ));
        assert!(classify_status(429, String::new()).is_retryable());
        assert!(classify_status(502, String::new()).is_retryable());
        assert!(!classify_status(400, String::new()).is_retryable());
    }

    #[test]
    fn body_carries_data_url() {
        let page = PageImage::new(vec![1, 2, 3], "image/png");
        let body = VisionClient::request_body(&page, "qwen-vl-max");
        assert_eq!(body["model"], "qwen-vl-max");
        let url = body["messages"][1]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap();
        assert_eq!(url, "data:image/png;base64,AQID");
    }
}
