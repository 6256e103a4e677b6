//! Generative AI client
//!
//! Client for the Google Generative Language REST API. Covers plain text
//! generation (soil reports, fertilizer guidance, chatbot answers) and
//! speech synthesis, which returns raw 16-bit PCM frames.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Client for the generative AI provider
#[derive(Clone)]
pub struct GenAiClient {
    api_endpoint: String,
    api_key: String,
    text_model: String,
    tts_model: String,
    http_client: Client,
}

/// generateContent request body
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "speechConfig")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    voice_name: String,
}

/// generateContent response body
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    #[allow(dead_code)]
    mime_type: String,
    /// Base64-encoded payload
    data: String,
}

impl GenAiClient {
    /// Create a new generative AI client
    pub fn new(
        api_endpoint: String,
        api_key: String,
        text_model: String,
        tts_model: String,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_endpoint,
            api_key,
            text_model,
            tts_model,
            http_client,
        }
    }

    /// Generate free text for a prompt
    pub async fn generate_text(&self, prompt: &str) -> AppResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: None,
        };

        let response = self.generate(&self.text_model, &request).await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| AppError::GenAi("Model returned no text candidate".to_string()))
    }

    /// Synthesize speech for a text, returning raw 16-bit PCM at 24 kHz
    pub async fn generate_speech(&self, text: &str, voice: &str) -> AppResult<Vec<u8>> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: text.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
            }),
        };

        let response = self.generate(&self.tts_model, &request).await?;

        let encoded = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.inline_data)
            .map(|d| d.data)
            .ok_or_else(|| AppError::GenAi("Model returned no audio data".to_string()))?;

        BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| AppError::GenAi(format!("Failed to decode audio payload: {}", e)))
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> AppResult<GenerateContentResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_endpoint, model, self.api_key
        );

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::GenAi(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::GenAi(format!("API returned {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GenAi(format!("Failed to parse response: {}", e)))
    }
}

/// Strip markdown code-fence wrapping from model output
///
/// Generative models frequently wrap requested JSON in ```json ... ```
/// fences. Returns the fenced body when present, the trimmed input
/// otherwise.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag on the opening fence, if any. On a one-line
    // fence the tag runs up to the first whitespace or brace.
    let body = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences() {
        let fenced = "```json\n{\"ph\": 6.5}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"ph\": 6.5}");
    }

    #[test]
    fn test_strip_bare_fences() {
        let fenced = "```\n{\"ph\": 6.5}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"ph\": 6.5}");
    }

    #[test]
    fn test_strip_single_line_fence_with_tag() {
        let fenced = "```json {\"ph\": 6.5}```";
        assert_eq!(strip_code_fences(fenced), "{\"ph\": 6.5}");
        let _: serde_json::Value = serde_json::from_str(strip_code_fences(fenced)).unwrap();
    }

    #[test]
    fn test_strip_single_line_fence_without_tag() {
        assert_eq!(strip_code_fences("```{\"ph\": 6.5}```"), "{\"ph\": 6.5}");
    }

    #[test]
    fn test_unfenced_passthrough() {
        assert_eq!(strip_code_fences("  {\"ph\": 6.5} \n"), "{\"ph\": 6.5}");
    }

    #[test]
    fn test_fenced_and_unfenced_parse_identically() {
        let plain = "{\"ph\": 6.5, \"texture\": \"loam\"}";
        let fenced = format!("```json\n{}\n```", plain);
        let a: serde_json::Value = serde_json::from_str(strip_code_fences(plain)).unwrap();
        let b: serde_json::Value = serde_json::from_str(strip_code_fences(&fenced)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fence_with_surrounding_prose_is_left_alone() {
        // Only a leading fence is stripped; prose before the fence means the
        // payload is not fence-wrapped and parsing should fail loudly.
        let text = "Here is the JSON: {\"ph\": 6.5}";
        assert_eq!(strip_code_fences(text), text);
    }
}
