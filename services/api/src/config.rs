use pam_core::config::{DEFAULT_INSTRUCTIONS, DEFAULT_TEMPERATURE, DEFAULT_VOICE, SessionConfig};
use secrecy::SecretString;
use std::net::{Ipv4Addr, SocketAddr};
use tracing::Level;

const DEFAULT_PORT: u16 = 5050;
const DEFAULT_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";
const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials for placing calls through the Twilio REST API.
#[derive(Debug)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub phone_number: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub openai_api_key: SecretString,
    pub realtime_url: String,
    pub realtime_model: String,
    pub voice: String,
    pub instructions: String,
    pub temperature: f32,
    /// Only needed by the outbound call endpoint.
    pub twilio: Option<TwilioCredentials>,
    /// Public host name (no scheme) the telephony provider can reach us on.
    pub public_host: Option<String>,
    pub log_level: Level,
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address = match optional_var("BIND_ADDRESS") {
            Some(addr) => addr
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?,
            None => {
                let port = match optional_var("PORT") {
                    Some(port) => port.parse::<u16>().map_err(|e| {
                        ConfigError::InvalidValue("PORT".to_string(), e.to_string())
                    })?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
            }
        };

        let openai_api_key = optional_var("OPENAI_API_KEY")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let realtime_url =
            optional_var("REALTIME_URL").unwrap_or_else(|| DEFAULT_REALTIME_URL.to_string());
        if !realtime_url.starts_with("wss://") && !realtime_url.starts_with("ws://") {
            return Err(ConfigError::InvalidValue(
                "REALTIME_URL".to_string(),
                format!("'{}' is not a WebSocket URL", realtime_url),
            ));
        }
        let realtime_model =
            optional_var("REALTIME_MODEL").unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string());

        let voice = optional_var("VOICE").unwrap_or_else(|| DEFAULT_VOICE.to_string());
        let instructions =
            optional_var("INSTRUCTIONS").unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string());
        let temperature = match optional_var("TEMPERATURE") {
            Some(t) => t
                .parse::<f32>()
                .ok()
                .filter(|t| t.is_finite())
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "TEMPERATURE".to_string(),
                        format!("'{}' is not a number", t),
                    )
                })?,
            None => DEFAULT_TEMPERATURE,
        };

        let twilio = match (
            optional_var("TWILIO_ACCOUNT_SID"),
            optional_var("TWILIO_AUTH_TOKEN"),
            optional_var("TWILIO_PHONE_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(phone_number)) => Some(TwilioCredentials {
                account_sid,
                auth_token: SecretString::from(auth_token),
                phone_number,
            }),
            _ => None,
        };

        let public_host = optional_var("SERVER");

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            openai_api_key,
            realtime_url,
            realtime_model,
            voice,
            instructions,
            temperature,
            twilio,
            public_host,
            log_level,
        })
    }

    /// The parameters every call's realtime session is initialised with.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_voice(self.voice.clone())
            .with_instructions(self.instructions.clone())
            .with_temperature(self.temperature)
    }

    /// The realtime endpoint URL including the model query parameter.
    pub fn realtime_endpoint(&self) -> String {
        format!("{}?model={}", self.realtime_url, self.realtime_model)
    }
}
