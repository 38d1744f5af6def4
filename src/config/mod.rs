//! Configuration module for the CallBridge gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable readers
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `instructions`: Assistant instruction templates
//!
//! # Example
//! ```rust,no_run
//! use callbridge_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use url::Url;

mod env;
pub mod instructions;
mod merge;
mod validation;
mod yaml;

use crate::core::realtime::RealtimeVoice;

pub(crate) const DEFAULT_HOST: &str = "0.0.0.0";
pub(crate) const DEFAULT_PORT: u16 = 5050;
pub(crate) const DEFAULT_RATE_LIMIT_RPS: u32 = 60;
pub(crate) const DEFAULT_RATE_LIMIT_BURST_SIZE: u32 = 10;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Twilio account used to originate calls
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Caller ID for outbound calls
    pub from_number: String,
    /// Number dialled by `/start-call`
    pub to_number: String,
    /// REST API base URL (overridable for testing)
    pub api_base_url: String,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("to_number", &self.to_number)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl Drop for TwilioConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.auth_token.zeroize();
    }
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, TLS, public URL)
/// - Realtime model settings (API key, model, voice, temperature)
/// - Assistant behaviour (instructions, client name, greeting)
/// - Twilio account for call origination (optional)
/// - Rate limiting
#[derive(Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Externally reachable base URL, e.g. `https://abc123.ngrok.app`
    pub public_url: Option<String>,

    // Realtime model
    pub openai_api_key: Option<String>,
    /// Base WebSocket URL of the realtime API
    pub openai_realtime_url: String,
    pub openai_model: String,
    pub openai_voice: RealtimeVoice,
    /// Sampling temperature, 0.0 to 2.0
    pub openai_temperature: f32,

    // Assistant
    /// Instruction template file; built-in default when `None`
    pub instructions_path: Option<PathBuf>,
    /// Substituted for `{client_name}` in the instructions
    pub client_name: String,
    /// When set, the assistant speaks first using this prompt
    pub greeting: Option<String>,
    /// Delay before `session.update` once the model channel opens
    pub session_update_delay_ms: u64,

    // Twilio (optional; `/start-call` is disabled without it)
    pub twilio: Option<TwilioConfig>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("public_url", &self.public_url)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("openai_realtime_url", &self.openai_realtime_url)
            .field("openai_model", &self.openai_model)
            .field("openai_voice", &self.openai_voice)
            .field("openai_temperature", &self.openai_temperature)
            .field("instructions_path", &self.instructions_path)
            .field("client_name", &self.client_name)
            .field("greeting", &self.greeting)
            .field("session_update_delay_ms", &self.session_update_delay_ms)
            .field("twilio", &self.twilio)
            .field(
                "rate_limit_requests_per_second",
                &self.rate_limit_requests_per_second,
            )
            .field("rate_limit_burst_size", &self.rate_limit_burst_size)
            .finish()
    }
}

/// Zeroize secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and `.env`, loaded by
    /// `main`), falling back to defaults.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        validation::validate_openai_api_key(&self.openai_api_key)?;
        validation::validate_temperature(self.openai_temperature)?;
        validation::validate_realtime_url(&self.openai_realtime_url)?;
        validation::validate_public_url(&self.public_url)?;
        validation::validate_rate_limits(
            self.rate_limit_requests_per_second,
            self.rate_limit_burst_size,
        )?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// `host[:port]` of the public URL, used when a request carries no Host
    /// header.
    pub fn public_host(&self) -> Option<String> {
        let url = Url::parse(self.public_url.as_deref()?).ok()?;
        let host = url.host_str()?;
        Some(match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    /// URL Twilio fetches call instructions from.
    pub fn outgoing_twiml_url(&self) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{base}/outgoing-twiml"))
    }

    /// Render the assistant instructions for this configuration.
    pub fn instructions(&self) -> Result<String, Box<dyn std::error::Error>> {
        let template = instructions::load_template(self.instructions_path.as_deref())?;
        Ok(instructions::render(&template, &self.client_name))
    }
}
