//! Speech services — transcription (Groq Whisper) and synthesis (Google Cloud TTS).

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::providers::ProviderError;

const GROQ_TRANSCRIPTION_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const TRANSCRIPTION_MODEL: &str = "whisper-large-v3";
const TRANSCRIPTION_LANGUAGE: &str = "en";
const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
/// Payloads smaller than this cannot hold a usable utterance.
pub const MIN_TRANSCRIBABLE_BYTES: usize = 1_000;

#[async_trait]
pub trait SpeechServices: Send + Sync {
    /// Transcribes one recorded answer. An empty string means nothing was said.
    async fn transcribe(&self, audio: Bytes) -> Result<String, ProviderError>;

    /// Synthesizes `text` in `locale` (BCP-47, e.g. `en-ZA`), returning MP3 bytes.
    async fn synthesize(&self, text: &str, locale: &str) -> Result<Vec<u8>, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct VoiceSelection<'a> {
    #[serde(rename = "languageCode")]
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
struct AudioConfig {
    #[serde(rename = "audioEncoding")]
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

/// HTTP-backed speech services. A missing key disables that half of the service:
/// calls fail with `ProviderError::Unconfigured` and the core degrades gracefully.
#[derive(Clone)]
pub struct HttpSpeechServices {
    client: Client,
    groq_api_key: Option<String>,
    google_tts_api_key: Option<String>,
}

impl HttpSpeechServices {
    pub fn new(
        groq_api_key: Option<String>,
        google_tts_api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            groq_api_key,
            google_tts_api_key,
        })
    }
}

#[async_trait]
impl SpeechServices for HttpSpeechServices {
    async fn transcribe(&self, audio: Bytes) -> Result<String, ProviderError> {
        if audio.len() < MIN_TRANSCRIBABLE_BYTES {
            debug!("Skipping transcription of {} byte payload", audio.len());
            return Ok(String::new());
        }
        let api_key = self
            .groq_api_key
            .as_deref()
            .ok_or(ProviderError::Unconfigured("GROQ_API_KEY"))?;

        debug!("Transcribing {} bytes of audio", audio.len());
        let file = Part::bytes(audio.to_vec())
            .file_name("answer.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .part("file", file)
            .text("model", TRANSCRIPTION_MODEL)
            .text("response_format", "json")
            .text("language", TRANSCRIPTION_LANGUAGE);

        let response = self
            .client
            .post(GROQ_TRANSCRIPTION_URL)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(body.text.trim().to_string())
    }

    async fn synthesize(&self, text: &str, locale: &str) -> Result<Vec<u8>, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::Empty);
        }
        let api_key = self
            .google_tts_api_key
            .as_deref()
            .ok_or(ProviderError::Unconfigured("GOOGLE_TTS_API_KEY"))?;

        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: locale,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let response = self
            .client
            .post(GOOGLE_TTS_URL)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let audio = general_purpose::STANDARD
            .decode(body.audio_content.as_bytes())
            .map_err(|e| ProviderError::Parse(format!("audioContent is not base64: {e}")))?;
        if audio.is_empty() {
            return Err(ProviderError::Empty);
        }
        debug!("Synthesized {} bytes of {locale} audio", audio.len());
        Ok(audio)
    }
}
