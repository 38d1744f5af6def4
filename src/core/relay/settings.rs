//! Per-call relay settings.
//!
//! Built once at startup from [`ServerConfig`] and shared by every call.

use std::fmt;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::core::realtime::openai::{
    ConversationItem, DEFAULT_REALTIME_MODEL, Modality, OPENAI_REALTIME_URL, RealtimeAudioFormat,
    RealtimeVoice, SessionConfig, TurnDetection,
};
use crate::core::realtime::{ClientEvent, RealtimeError, RealtimeResult};

/// Delay between the model channel opening and `session.update`.
pub const DEFAULT_SESSION_UPDATE_DELAY: Duration = Duration::from_millis(100);

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Settings injected into each call's orchestrator.
#[derive(Clone)]
pub struct RelaySettings {
    api_key: String,
    /// Base WebSocket URL of the realtime API, without the model query
    pub realtime_url: String,
    pub model: String,
    pub voice: RealtimeVoice,
    pub temperature: f32,
    /// Rendered system instructions
    pub instructions: String,
    /// When set, the assistant is prompted to speak first with this text
    pub greeting: Option<String>,
    pub session_update_delay: Duration,
}

impl RelaySettings {
    /// Defaults for everything but the API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            realtime_url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            voice: RealtimeVoice::default(),
            temperature: DEFAULT_TEMPERATURE,
            instructions: String::new(),
            greeting: None,
            session_update_delay: DEFAULT_SESSION_UPDATE_DELAY,
        }
    }

    /// Build from server configuration and rendered instructions.
    pub fn from_config(config: &ServerConfig, instructions: String) -> RealtimeResult<Self> {
        let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
            RealtimeError::InvalidConfiguration(
                "OpenAI API key not configured in server environment".to_string(),
            )
        })?;

        let mut settings = Self::new(api_key);
        settings.realtime_url = config.openai_realtime_url.clone();
        settings.model = config.openai_model.clone();
        settings.voice = config.openai_voice;
        settings.temperature = config.openai_temperature;
        settings.instructions = instructions;
        settings.greeting = config.greeting.clone();
        settings.session_update_delay = Duration::from_millis(config.session_update_delay_ms);
        Ok(settings)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Session configuration sent once the model channel opens.
    ///
    /// Audio is G.711 u-law both ways so telephony payloads pass through.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            turn_detection: Some(TurnDetection::server_vad()),
            input_audio_format: RealtimeAudioFormat::G711Ulaw,
            output_audio_format: RealtimeAudioFormat::G711Ulaw,
            voice: self.voice,
            instructions: self.instructions.clone(),
            modalities: vec![Modality::Text, Modality::Audio],
            temperature: self.temperature,
        }
    }

    /// Events that make the assistant open the conversation, if configured.
    pub fn greeting_events(&self) -> Vec<ClientEvent> {
        match self.greeting.as_deref() {
            Some(text) if !text.trim().is_empty() => vec![
                ClientEvent::ConversationItemCreate {
                    item: ConversationItem::user_text(text),
                },
                ClientEvent::ResponseCreate,
            ],
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for RelaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySettings")
            .field("api_key", &"[REDACTED]")
            .field("realtime_url", &self.realtime_url)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("temperature", &self.temperature)
            .field("instructions_len", &self.instructions.len())
            .field("greeting", &self.greeting.is_some())
            .field("session_update_delay", &self.session_update_delay)
            .finish()
    }
}

impl Drop for RelaySettings {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.api_key.zeroize();
    }
}
