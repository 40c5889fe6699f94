//! Speech endpoints for the voice transport: audio → text transcription and
//! text → audio synthesis. Codec handling stays upstream; both clients move
//! opaque bytes.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::SecretString;
use serde::Deserialize;

use deskd_agent::capabilities::{SpeechSynthesizer, SpeechTranscriber};
use deskd_core::config::SpeechConfig;
use deskd_core::errors::CapabilityError;

use crate::http::{build_client, join_url, require_success, transport_error, with_bearer};

const SPEECH_TIMEOUT_SECS: u64 = 30;

pub struct HttpSpeechTranscriber {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpSpeechTranscriber {
    pub fn new(config: &SpeechConfig) -> Result<Self, CapabilityError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CapabilityError::NotConfigured("speech".to_string()))?;
        Ok(Self {
            client: build_client(SPEECH_TIMEOUT_SECS)?,
            base_url,
            api_key: config.api_key.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl SpeechTranscriber for HttpSpeechTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, CapabilityError> {
        let form = Form::new()
            .part("file", Part::bytes(audio.to_vec()).file_name("audio.wav"));

        let builder = self.client.post(join_url(&self.base_url, "transcriptions"));
        let response = with_bearer(builder, self.api_key.as_ref())
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let parsed: TranscriptionResponse = require_success(response)?
            .json()
            .await
            .map_err(|error| CapabilityError::Failed(format!("transcription response: {error}")))?;
        Ok(parsed.text)
    }
}

pub struct HttpSpeechSynthesizer {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    voice: String,
}

impl HttpSpeechSynthesizer {
    pub fn new(config: &SpeechConfig) -> Result<Self, CapabilityError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CapabilityError::NotConfigured("speech".to_string()))?;
        Ok(Self {
            client: build_client(SPEECH_TIMEOUT_SECS)?,
            base_url,
            api_key: config.api_key.clone(),
            voice: config.voice.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CapabilityError> {
        let builder = self.client.post(join_url(&self.base_url, "speech"));
        let response = with_bearer(builder, self.api_key.as_ref())
            .json(&serde_json::json!({ "input": text, "voice": self.voice }))
            .send()
            .await
            .map_err(transport_error)?;

        let bytes = require_success(response)?
            .bytes()
            .await
            .map_err(|error| CapabilityError::Failed(format!("synthesis response: {error}")))?;
        Ok(bytes.to_vec())
    }
}
