//! Raw Gemini API calls.
//!
//! One function per concern: build the client, send a generateContent
//! request, unwrap the response envelope. Everything network-shaped maps to
//! `UpstreamUnavailable`; the parse/validate layer never sees transport
//! detail.

use std::time::Duration;

use serde_json;
use tracing::error;

use crate::config::Task;
use crate::error::ClassifyError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Build a reqwest client with a 60-second timeout for API calls.
pub fn build_api_client() -> Result<reqwest::Client, ClassifyError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| ClassifyError::UpstreamUnavailable(format!("failed to build HTTP client: {}", e)))
}

/// Send a generateContent request and return the model's text output.
///
/// `image_base64` attaches an inline JPEG part after the prompt text.
/// Temperature comes from the task kind; top_p/top_k are fixed at the values
/// tuned for classification (0.95 / 40).
pub async fn generate_content(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    prompt: &str,
    image_base64: Option<&str>,
    task: Task,
    max_output_tokens: u32,
) -> Result<String, ClassifyError> {
    let mut parts = vec![serde_json::json!({ "text": prompt })];
    if let Some(data) = image_base64 {
        parts.push(serde_json::json!({
            "inline_data": {
                "mime_type": super::image_prep::image_media_type(),
                "data": data
            }
        }));
    }

    let body = serde_json::json!({
        "contents": [{ "parts": parts }],
        "generationConfig": {
            "temperature": task.temperature(),
            "topP": 0.95,
            "topK": 40,
            "maxOutputTokens": max_output_tokens
        }
    });

    let url = format!("{}/{}:generateContent", API_BASE, model);
    let response = client
        .post(&url)
        .header("x-goog-api-key", api_key)
        .header("content-type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            let msg = if e.is_timeout() {
                "Gemini API timeout after 60s".to_string()
            } else {
                format!("Gemini API request failed: {}", e)
            };
            error!("{}", msg);
            ClassifyError::UpstreamUnavailable(msg)
        })?;

    let body_text = handle_api_response(response).await?;

    // Envelope: { "candidates": [{"content": {"parts": [{"text": "..."}]}}] }
    let envelope: serde_json::Value = serde_json::from_str(&body_text).map_err(|e| {
        let msg = format!("failed to parse Gemini API response envelope: {}", e);
        error!("{}", msg);
        ClassifyError::UpstreamUnavailable(msg)
    })?;

    let text = envelope["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or("");
    if text.is_empty() {
        let msg = "empty response from Gemini".to_string();
        error!("{}", msg);
        return Err(ClassifyError::UpstreamUnavailable(msg));
    }

    Ok(text.to_string())
}

/// Check status and extract the body text.
async fn handle_api_response(response: reqwest::Response) -> Result<String, ClassifyError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        let truncated = if body.len() > 1024 {
            format!("{}...", truncate_chars(&body, 1024))
        } else {
            body
        };
        let msg = format!("Gemini API error: {} - {}", status, truncated);
        error!("{}", msg);
        return Err(ClassifyError::UpstreamUnavailable(msg));
    }
    response
        .text()
        .await
        .map_err(|e| ClassifyError::UpstreamUnavailable(format!("failed to read API response body: {}", e)))
}

/// Truncate to at most `max` characters, never splitting a multi-byte
/// character. Error bodies are arbitrary text and a byte slice can land
/// mid-character.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Whether an upstream failure looks like a quota/rate-limit rejection.
/// The API signals this as HTTP 429 / RESOURCE_EXHAUSTED.
pub fn is_quota_error(err: &ClassifyError) -> bool {
    match err {
        ClassifyError::UpstreamUnavailable(msg) => {
            msg.contains("429") || msg.to_lowercase().contains("quota")
                || msg.contains("RESOURCE_EXHAUSTED")
        }
        _ => false,
    }
}
