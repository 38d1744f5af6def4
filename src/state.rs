//! Shared application state.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::realtime::{OpenAIRealtimeConnector, SharedModelConnector};
use crate::core::relay::RelaySettings;
use crate::core::telephony::TwilioClient;

/// State shared by every request and call.
pub struct AppState {
    pub config: ServerConfig,
    /// Settings cloned into each call's orchestrator
    pub relay_settings: Arc<RelaySettings>,
    pub model_connector: SharedModelConnector,
    /// Present only when Twilio is configured
    pub twilio: Option<TwilioClient>,
}

impl AppState {
    /// Build state from configuration, rendering instructions and creating
    /// the Twilio client.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let connector: SharedModelConnector = Arc::new(OpenAIRealtimeConnector::new());
        Self::with_connector(config, connector)
    }

    /// Same as [`AppState::new`] with a custom model connector.
    pub fn with_connector(
        config: ServerConfig,
        model_connector: SharedModelConnector,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let instructions = config.instructions()?;
        let relay_settings = RelaySettings::from_config(&config, instructions)?;

        let twilio = match config.twilio.as_ref() {
            Some(twilio_config) => Some(TwilioClient::new(twilio_config)?),
            None => {
                warn!("Twilio not configured; /start-call is disabled");
                None
            }
        };

        info!(
            provider = model_connector.provider_name(),
            model = %relay_settings.model,
            voice = %relay_settings.voice,
            "Relay configured"
        );

        Ok(Arc::new(Self {
            config,
            relay_settings: Arc::new(relay_settings),
            model_connector,
            twilio,
        }))
    }
}
