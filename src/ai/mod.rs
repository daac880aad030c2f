use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod meal;
pub mod recipe;

/// Net carbs per serving above which a dish stops being keto.
pub const KETO_MAX_CARBS_PER_SERVING: i32 = 20;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI service not configured")]
    NotConfigured,
    #[error("AI request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI provider rejected the request: {0}")]
    Rejected(String),
    #[error("could not parse AI reply: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Thin client for the Gemini `generateContent` endpoint. A missing API key
/// degrades every call to [`AiError::NotConfigured`] rather than preventing
/// the rest of the app from starting.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            http: Client::new(),
            base_url: API_BASE_URL.to_string(),
            api_key,
            model,
        }
    }

    pub async fn generate(&self, prompt: &str, temperature: Option<f32>) -> Result<String, AiError> {
        self.generate_parts(vec![Part::Text { text: prompt.to_string() }], temperature)
            .await
    }

    /// Single-turn request with an inline image, for vision prompts.
    pub async fn generate_with_image(
        &self,
        prompt: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> Result<String, AiError> {
        self.generate_parts(
            vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: image_base64.to_string(),
                    },
                },
                Part::Text { text: prompt.to_string() },
            ],
            None,
        )
        .await
    }

    async fn generate_parts(
        &self,
        parts: Vec<Part>,
        temperature: Option<f32>,
    ) -> Result<String, AiError> {
        let api_key = self.api_key.as_ref().ok_or(AiError::NotConfigured)?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let request = GenerateRequest {
            contents: vec![Content { role: Some("user".to_string()), parts }],
            generation_config: temperature.map(|t| GenerationConfig { temperature: t }),
        };

        let resp = self.http.post(&url).json(&request).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!("Gemini returned {status}: {body}");
            return Err(AiError::Rejected(format!("HTTP {status}")));
        }

        let body: GenerateResponse = resp.json().await?;
        body.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| match p {
                Part::Text { text } => Some(text),
                Part::InlineData { .. } => None,
            })
            .ok_or_else(|| AiError::Malformed("reply carried no text candidate".to_string()))
    }
}

/// Strips a fenced markdown block down to its body. Models regularly wrap
/// their JSON in ```json fences despite being asked not to.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the fence line (with its optional language tag), then cut at the
    // closing fence.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    let body = body.rfind("```").map_or(body, |i| &body[..i]);
    body.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_text_passes_through() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\": 1}");

        let no_lang = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(no_lang), "{\"a\": 1}");
    }

    #[test]
    fn unterminated_fence_still_yields_body() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }
}
