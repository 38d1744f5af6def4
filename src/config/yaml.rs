use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5050
///   public_url: "https://abc123.ngrok.app"
///   tls:
///     enabled: true
///     cert_path: "/etc/callbridge/cert.pem"
///     key_path: "/etc/callbridge/key.pem"
///
/// openai:
///   api_key: "sk-..."
///   model: "gpt-4o-realtime-preview-2024-10-01"
///   voice: "alloy"
///   temperature: 0.8
///
/// assistant:
///   instructions_path: "/etc/callbridge/instructions.txt"
///   client_name: "Alex"
///   greeting: "Greet the caller and introduce yourself."
///   session_update_delay_ms: 100
///
/// twilio:
///   account_sid: "AC..."
///   auth_token: "..."
///   from_number: "+15550001111"
///   to_number: "+15552223333"
///
/// security:
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAIYaml>,
    pub assistant: Option<AssistantYaml>,
    pub twilio: Option<TwilioYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Externally reachable base URL (e.g. an ngrok tunnel)
    pub public_url: Option<String>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Realtime model settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub temperature: Option<f32>,
}

/// Assistant behaviour from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AssistantYaml {
    pub instructions_path: Option<String>,
    pub client_name: Option<String>,
    pub greeting: Option<String>,
    pub session_update_delay_ms: Option<u64>,
}

/// Twilio account settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TwilioYaml {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub api_base_url: Option<String>,
}

/// Security settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
