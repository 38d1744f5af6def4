//! Configuration validation.

use std::path::PathBuf;

use url::Url;

use super::{TlsConfig, TwilioConfig};

/// Separate pieces of Twilio configuration, before the all-or-nothing check.
#[derive(Debug, Default)]
pub(super) struct TwilioParts {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub api_base_url: String,
}

impl Drop for TwilioParts {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        if let Some(ref mut token) = self.auth_token {
            token.zeroize();
        }
    }
}

/// The realtime model cannot be reached without an API key.
pub(super) fn validate_openai_api_key(api_key: &Option<String>) -> Result<(), String> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(
            "OPENAI_API_KEY is required (set it in the environment, .env or openai.api_key)"
                .to_string(),
        ),
    }
}

pub(super) fn validate_temperature(temperature: f32) -> Result<(), String> {
    if (0.0..=2.0).contains(&temperature) {
        Ok(())
    } else {
        Err(format!(
            "OpenAI temperature must be between 0.0 and 2.0, got {temperature}"
        ))
    }
}

pub(super) fn validate_realtime_url(realtime_url: &str) -> Result<(), String> {
    let url = Url::parse(realtime_url)
        .map_err(|e| format!("Invalid realtime URL '{realtime_url}': {e}"))?;
    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(format!(
            "Realtime URL must use ws:// or wss://, got '{other}://'"
        )),
    }
}

pub(super) fn validate_public_url(public_url: &Option<String>) -> Result<(), String> {
    let Some(public_url) = public_url else {
        return Ok(());
    };
    let url =
        Url::parse(public_url).map_err(|e| format!("Invalid public URL '{public_url}': {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "Public URL must use http:// or https://, got '{}://'",
            url.scheme()
        ));
    }
    if url.host_str().is_none() {
        return Err(format!("Public URL '{public_url}' has no host"));
    }
    Ok(())
}

/// Twilio settings are all-or-nothing.
pub(super) fn build_twilio_config(parts: TwilioParts) -> Result<Option<TwilioConfig>, String> {
    let present = [
        ("TWILIO_ACCOUNT_SID", parts.account_sid.is_some()),
        ("TWILIO_AUTH_TOKEN", parts.auth_token.is_some()),
        ("TWILIO_PHONE_NUMBER", parts.from_number.is_some()),
        ("OUTGOING_PHONE_NUMBER", parts.to_number.is_some()),
    ];

    if present.iter().all(|(_, set)| !set) {
        return Ok(None);
    }

    let missing: Vec<&str> = present
        .iter()
        .filter(|(_, set)| !set)
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "Incomplete Twilio configuration, missing: {}",
            missing.join(", ")
        ));
    }

    Url::parse(&parts.api_base_url)
        .map_err(|e| format!("Invalid Twilio API base URL '{}': {e}", parts.api_base_url))?;

    let mut parts = parts;
    Ok(Some(TwilioConfig {
        account_sid: parts.account_sid.take().unwrap_or_default(),
        auth_token: parts.auth_token.take().unwrap_or_default(),
        from_number: parts.from_number.take().unwrap_or_default(),
        to_number: parts.to_number.take().unwrap_or_default(),
        api_base_url: std::mem::take(&mut parts.api_base_url),
    }))
}

/// TLS needs both a certificate and a key.
pub(super) fn build_tls_config(
    cert_path: Option<String>,
    key_path: Option<String>,
) -> Result<Option<TlsConfig>, String> {
    match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err("TLS certificate configured without a private key".to_string()),
        (None, Some(_)) => Err("TLS private key configured without a certificate".to_string()),
    }
}

pub(super) fn validate_rate_limits(requests_per_second: u32, burst_size: u32) -> Result<(), String> {
    if requests_per_second == 0 {
        return Err("Rate limit requests per second must be greater than 0".to_string());
    }
    if burst_size == 0 {
        return Err("Rate limit burst size must be greater than 0".to_string());
    }
    Ok(())
}
