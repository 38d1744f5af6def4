//! Twilio REST client for placing outbound calls.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::TwilioConfig;

/// Production Twilio REST API base URL.
pub const TWILIO_API_BASE_URL: &str = "https://api.twilio.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum TwilioError {
    /// Request never produced a response
    #[error("Request to Twilio failed: {0}")]
    Request(String),

    /// Twilio answered with a non-success status
    #[error("Twilio API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body was not what the API documents
    #[error("Invalid response from Twilio: {0}")]
    InvalidResponse(String),
}

/// A call Twilio accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct CallCreated {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
}

pub struct TwilioClient {
    http: reqwest::Client,
    api_base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    to_number: String,
}

impl TwilioClient {
    pub fn new(config: &TwilioConfig) -> Result<Self, TwilioError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TwilioError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            to_number: config.to_number.clone(),
        })
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base_url, self.account_sid
        )
    }

    /// Place a call to the configured number; Twilio fetches its
    /// instructions from `twiml_url` once the call is answered.
    pub async fn create_call(&self, twiml_url: &str) -> Result<CallCreated, TwilioError> {
        debug!(to = %self.to_number, url = %twiml_url, "Creating outbound call");

        let response = self
            .http
            .post(self.calls_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", self.to_number.as_str()),
                ("From", self.from_number.as_str()),
                ("Url", twiml_url),
            ])
            .send()
            .await
            .map_err(|e| TwilioError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(ApiErrorBody {
                    code: Some(code),
                    message: Some(message),
                }) => format!("{message} (code {code})"),
                Ok(ApiErrorBody {
                    message: Some(message),
                    ..
                }) => message,
                _ => body,
            };
            return Err(TwilioError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let call: CallCreated = response
            .json()
            .await
            .map_err(|e| TwilioError::InvalidResponse(e.to_string()))?;

        info!(call_sid = %call.sid, "Outgoing call initiated");
        Ok(call)
    }
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("api_base_url", &self.api_base_url)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("to_number", &self.to_number)
            .finish()
    }
}

impl Drop for TwilioClient {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.auth_token.zeroize();
    }
}
