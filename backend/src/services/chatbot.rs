//! Chatbot and text-to-speech service
//!
//! Answers free-text farming questions through the generative text model
//! (optionally grounding the prompt with a weather-conditions tool),
//! synthesizes speech as a WAV data URI, and turns disease-detection
//! payloads into farmer-readable interpretations.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::external::genai::GenAiClient;
use shared::types::Language;

/// Chatbot service
#[derive(Clone)]
pub struct ChatbotService {
    genai: GenAiClient,
}

/// Input for the chatbot question endpoint
#[derive(Debug, Deserialize)]
pub struct AskInput {
    pub question: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Chatbot answer
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Input for text-to-speech
#[derive(Debug, Deserialize)]
pub struct SpeechInput {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Synthesized speech as a base64 WAV data URI
#[derive(Debug, Serialize)]
pub struct SpeechResponse {
    pub audio: String,
}

/// Input for interpreting a disease-detection result
///
/// The payload is opaque JSON produced by the external image-classification
/// service; known fields are flattened into the prompt when present.
#[derive(Debug, Deserialize)]
pub struct InterpretInput {
    pub result: Value,
    #[serde(default)]
    pub language: Option<String>,
}

/// Farmer-readable interpretation
#[derive(Debug, Serialize)]
pub struct InterpretResponse {
    pub interpretation: String,
}

/// Fixed conditions reported by the weather tool until a live lookup is
/// wired in (placeholders carried over from the original pipeline)
#[derive(Debug, Clone, Copy)]
pub struct WeatherConditions {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rainfall_mm: f64,
}

/// Placeholder weather tool consulted by the prompt pipeline
pub fn current_conditions() -> WeatherConditions {
    WeatherConditions {
        temperature_c: 28.0,
        humidity_pct: 65.0,
        rainfall_mm: 2.0,
    }
}

/// PCM format produced by the speech model
const TTS_SAMPLE_RATE: u32 = 24_000;
const TTS_CHANNELS: u16 = 1;
const TTS_BITS_PER_SAMPLE: u16 = 16;

impl ChatbotService {
    /// Create a new ChatbotService instance
    pub fn new(genai: GenAiClient) -> Self {
        Self { genai }
    }

    /// Answer a free-text question
    pub async fn ask(&self, input: AskInput) -> AppResult<AskResponse> {
        let question = input.question.trim();
        if question.is_empty() {
            return Err(AppError::Validation {
                field: "question".to_string(),
                message: "Question is required".to_string(),
            });
        }

        let language = Language::from_tag(input.language.as_deref().unwrap_or("en"));
        let conditions = current_conditions();
        let prompt = question_prompt(question, &language, &conditions);

        let answer = self.genai.generate_text(&prompt).await?;
        Ok(AskResponse {
            answer: answer.trim().to_string(),
        })
    }

    /// Synthesize speech and return it as a base64 WAV data URI
    pub async fn text_to_speech(&self, input: SpeechInput) -> AppResult<SpeechResponse> {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation {
                field: "text".to_string(),
                message: "Text is required".to_string(),
            });
        }

        let language = Language::from_tag(input.language.as_deref().unwrap_or("en"));
        let voice = voice_for_language(&language);

        let pcm = self.genai.generate_speech(text, voice).await?;
        let wav = pcm_to_wav(&pcm, TTS_SAMPLE_RATE, TTS_CHANNELS, TTS_BITS_PER_SAMPLE);

        Ok(SpeechResponse {
            audio: format!("data:audio/wav;base64,{}", BASE64.encode(wav)),
        })
    }

    /// Turn a detection payload into a farmer-readable interpretation
    pub async fn interpret_detection(&self, input: InterpretInput) -> AppResult<InterpretResponse> {
        if input.result.is_null() {
            return Err(AppError::Validation {
                field: "result".to_string(),
                message: "Detection result is required".to_string(),
            });
        }

        let language = Language::from_tag(input.language.as_deref().unwrap_or("en"));
        let summary = summarize_detection(&input.result);
        let prompt = format!(
            "A plant disease detection service analysed a farmer's crop photo \
             and reported:\n{summary}\n\nExplain this result to the farmer in \
             simple {lang}: what the disease is, how serious it is, and what \
             practical steps to take. Answer in plain sentences without \
             markdown.",
            summary = summary,
            lang = language.name(),
        );

        let interpretation = self.genai.generate_text(&prompt).await?;
        Ok(InterpretResponse {
            interpretation: interpretation.trim().to_string(),
        })
    }
}

/// Choose a prebuilt TTS voice for a language
fn voice_for_language(language: &Language) -> &'static str {
    match language {
        Language::English => "Kore",
        Language::Hindi => "Puck",
    }
}

/// Build the question prompt, grounded with tool-reported conditions
fn question_prompt(question: &str, language: &Language, conditions: &WeatherConditions) -> String {
    format!(
        "You are an agricultural advisor helping smallholder farmers. \
         Current local conditions: temperature {t:.0}°C, humidity {h:.0}%, \
         recent rainfall {r:.0}mm. Answer the farmer's question in {lang}, \
         briefly and practically, in plain sentences without markdown.\n\n\
         Question: {q}",
        t = conditions.temperature_c,
        h = conditions.humidity_pct,
        r = conditions.rainfall_mm,
        lang = language.name(),
        q = question,
    )
}

/// Flatten a detection payload into a plain-text summary
///
/// Known fields from the classification service are pulled out when
/// present; anything else is included verbatim as compact JSON so no
/// information is silently dropped.
pub fn summarize_detection(result: &Value) -> String {
    let mut lines = Vec::new();

    if let Some(crop) = result.pointer("/crop_detection/crop_type").and_then(Value::as_str) {
        lines.push(format!("Crop: {}", crop));
    }
    if let Some(disease) = result
        .pointer("/disease_detection/disease_name")
        .and_then(Value::as_str)
    {
        lines.push(format!("Disease: {}", disease));
    }
    if let Some(confidence) = result
        .pointer("/disease_detection/confidence")
        .and_then(Value::as_f64)
    {
        lines.push(format!("Confidence: {:.0}%", confidence * 100.0));
    }
    if let Some(severity) = result
        .pointer("/disease_detection/severity")
        .and_then(Value::as_str)
    {
        lines.push(format!("Severity: {}", severity));
    }

    if lines.is_empty() {
        format!("Raw result: {}", result)
    } else {
        lines.join("\n")
    }
}

/// Repack raw PCM frames into a WAV container
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample) / 8;
    let block_align = channels * bits_per_sample / 8;
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}
