//! Insight provider backed by the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{InsightProvider, InsightRequest};
use crate::config::InsightConfig;
use crate::error::{Error, Result};

/// Header carrying the API key. Transport errors echo the URL, so the key stays out of it.
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<OutPart<'a>>,
}

#[derive(Debug, Serialize)]
struct OutPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<InPart>,
}

#[derive(Debug, Deserialize)]
struct InPart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Calls a hosted Gemini model over HTTPS.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    config: InsightConfig,
}

impl GeminiProvider {
    /// Build a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: InsightConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    /// URL of the generation endpoint for the configured model.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn api_key(&self) -> Result<&str> {
        if !self.config.enabled {
            return Err(Error::insight_unavailable("disabled in configuration"));
        }
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::insight_unavailable("no API key configured"))
    }
}

/// The prompt sent for a request.
///
/// # Errors
///
/// Returns an error if the fuel history cannot be serialized.
pub(crate) fn build_prompt(request: &InsightRequest) -> Result<String> {
    let history = serde_json::to_string(&request.entries)?;
    Ok(format!(
        "Analyze the fuel history of this vehicle ({}): {history}. \
         Give 3 short, practical tips about fuel efficiency or about which fuel \
         (ethanol or gasoline) is paying off better, based on the data.",
        request.vehicle_name
    ))
}

#[async_trait]
impl InsightProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &InsightRequest) -> Result<String> {
        let api_key = self.api_key()?;
        let prompt = build_prompt(request)?;
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![OutPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        info!(
            model = %self.config.model,
            entries = request.entries.len(),
            "Requesting fuel insight"
        );
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InsightStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.text();
        debug!(chars = text.len(), "Insight received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InsightConfig {
        InsightConfig {
            api_key: Some("test-key".to_string()),
            ..InsightConfig::default()
        }
    }

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new(config()).unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );

        let provider = GeminiProvider::new(InsightConfig {
            base_url: "http://localhost:8080/".to_string(),
            model: "m".to_string(),
            ..config()
        })
        .unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:8080/models/m:generateContent"
        );
    }

    #[test]
    fn test_missing_key_is_unavailable() {
        let provider = GeminiProvider::new(InsightConfig::default()).unwrap();
        assert!(matches!(
            provider.api_key(),
            Err(Error::InsightUnavailable { .. })
        ));

        let provider = GeminiProvider::new(InsightConfig {
            api_key: Some("  ".to_string()),
            ..InsightConfig::default()
        })
        .unwrap();
        assert!(provider.api_key().is_err());
    }

    #[test]
    fn test_disabled_is_unavailable() {
        let provider = GeminiProvider::new(InsightConfig {
            enabled: false,
            ..config()
        })
        .unwrap();
        let err = provider.api_key().unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[tokio::test]
    async fn test_generate_without_key_fails_before_network() {
        let provider = GeminiProvider::new(InsightConfig::default()).unwrap();
        let request = InsightRequest {
            vehicle_name: "Gol".to_string(),
            entries: Vec::new(),
        };
        let err = provider.generate(&request).await.unwrap_err();
        assert!(matches!(err, Error::InsightUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_key() {
        let provider = GeminiProvider::new(InsightConfig {
            api_key: Some("SECRET-KEY-123".to_string()),
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 5,
            ..InsightConfig::default()
        })
        .unwrap();
        let request = InsightRequest {
            vehicle_name: "Gol".to_string(),
            entries: Vec::new(),
        };

        let err = provider.generate(&request).await.unwrap_err();
        assert!(matches!(err, Error::InsightRequest(_)));
        let shown = format!("{err} {err:?}");
        assert!(!shown.contains("SECRET-KEY-123"), "key leaked: {shown}");
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![OutPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 300,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 300);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_response_text_extraction() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"One. "},{"text":"Two."}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), "One. Two.");

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");

        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(blocked.text(), "");
    }

    #[test]
    fn test_prompt_mentions_vehicle_and_history() {
        let request = InsightRequest {
            vehicle_name: "Renegade".to_string(),
            entries: Vec::new(),
        };
        let prompt = build_prompt(&request).unwrap();
        assert!(prompt.contains("Renegade"));
        assert!(prompt.contains("[]"));
    }
}
