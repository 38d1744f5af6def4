//! Merging of environment variables, YAML overrides and defaults.

use std::path::PathBuf;

use super::env;
use super::validation::{self, TwilioParts};
use super::yaml::YamlConfig;
use super::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RATE_LIMIT_BURST_SIZE, DEFAULT_RATE_LIMIT_RPS,
    ServerConfig,
};
use crate::config::instructions::DEFAULT_CLIENT_NAME;
use crate::core::realtime::openai::{DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL, RealtimeVoice};
use crate::core::relay::{DEFAULT_SESSION_UPDATE_DELAY, DEFAULT_TEMPERATURE};
use crate::core::telephony::TWILIO_API_BASE_URL;

/// Build the final configuration. YAML wins over the environment, which wins
/// over defaults.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml.unwrap_or_default();
    let server = yaml.server.unwrap_or_default();
    let tls = server.tls.unwrap_or_default();
    let openai = yaml.openai.unwrap_or_default();
    let assistant = yaml.assistant.unwrap_or_default();
    let twilio = yaml.twilio.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    // Server
    let host = server
        .host
        .or_else(|| env::var("HOST"))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match server.port {
        Some(port) => port,
        None => env::parse::<u16>("PORT")?.unwrap_or(DEFAULT_PORT),
    };
    let public_url = server
        .public_url
        .or_else(|| env::var_any(&["PUBLIC_URL", "NGROK_SERVER_URL"]))
        .map(|url| url.trim_end_matches('/').to_string());

    let tls = if tls.enabled == Some(false) {
        None
    } else {
        validation::build_tls_config(
            tls.cert_path.or_else(|| env::var("TLS_CERT_PATH")),
            tls.key_path.or_else(|| env::var("TLS_KEY_PATH")),
        )?
    };

    // Realtime model
    let openai_api_key = openai.api_key.or_else(|| env::var("OPENAI_API_KEY"));
    let openai_realtime_url = openai
        .realtime_url
        .or_else(|| env::var("OPENAI_REALTIME_URL"))
        .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string());
    let openai_model = openai
        .model
        .or_else(|| env::var("OPENAI_REALTIME_MODEL"))
        .unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string());
    let openai_voice = match openai.voice.or_else(|| env::var("OPENAI_VOICE")) {
        Some(voice) => voice.parse::<RealtimeVoice>()?,
        None => RealtimeVoice::default(),
    };
    let openai_temperature = match openai.temperature {
        Some(temperature) => temperature,
        None => env::parse::<f32>("OPENAI_TEMPERATURE")?.unwrap_or(DEFAULT_TEMPERATURE),
    };

    // Assistant
    let instructions_path = assistant
        .instructions_path
        .or_else(|| env::var("ASSISTANT_INSTRUCTIONS_PATH"))
        .map(PathBuf::from);
    let client_name = assistant
        .client_name
        .or_else(|| env::var("CLIENT_NAME"))
        .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string());
    let greeting = assistant
        .greeting
        .or_else(|| env::var("ASSISTANT_GREETING"));
    let session_update_delay_ms = match assistant.session_update_delay_ms {
        Some(delay) => delay,
        None => env::parse::<u64>("SESSION_UPDATE_DELAY_MS")?
            .unwrap_or(DEFAULT_SESSION_UPDATE_DELAY.as_millis() as u64),
    };

    // Twilio
    let twilio = validation::build_twilio_config(TwilioParts {
        account_sid: twilio
            .account_sid
            .or_else(|| env::var("TWILIO_ACCOUNT_SID")),
        auth_token: twilio
            .auth_token
            .or_else(|| env::var("TWILIO_AUTH_TOKEN")),
        from_number: twilio
            .from_number
            .or_else(|| env::var("TWILIO_PHONE_NUMBER")),
        to_number: twilio
            .to_number
            .or_else(|| env::var("OUTGOING_PHONE_NUMBER")),
        api_base_url: twilio
            .api_base_url
            .or_else(|| env::var("TWILIO_API_BASE_URL"))
            .unwrap_or_else(|| TWILIO_API_BASE_URL.to_string()),
    })?;

    // Security
    let rate_limit_requests_per_second = match security.rate_limit_requests_per_second {
        Some(rps) => rps,
        None => env::parse::<u32>("RATE_LIMIT_REQUESTS_PER_SECOND")?
            .unwrap_or(DEFAULT_RATE_LIMIT_RPS),
    };
    let rate_limit_burst_size = match security.rate_limit_burst_size {
        Some(burst) => burst,
        None => env::parse::<u32>("RATE_LIMIT_BURST_SIZE")?
            .unwrap_or(DEFAULT_RATE_LIMIT_BURST_SIZE),
    };

    Ok(ServerConfig {
        host,
        port,
        tls,
        public_url,
        openai_api_key,
        openai_realtime_url,
        openai_model,
        openai_voice,
        openai_temperature,
        instructions_path,
        client_name,
        greeting,
        session_update_delay_ms,
        twilio,
        rate_limit_requests_per_second,
        rate_limit_burst_size,
    })
}
