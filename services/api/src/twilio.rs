//! Outbound call origination through the Twilio REST API.

use crate::config::TwilioCredentials;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Places a phone call that fetches its instructions from `twiml_url`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallOriginator: Send + Sync {
    /// Returns the provider's identifier for the new call.
    async fn originate(&self, to: &str, twiml_url: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct CallResource {
    sid: String,
}

#[derive(Deserialize)]
struct TwilioErrorBody {
    message: String,
    #[serde(default)]
    code: Option<u32>,
}

pub struct TwilioClient {
    http: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: SecretString,
    from: String,
}

impl TwilioClient {
    pub fn new(credentials: &TwilioCredentials) -> Self {
        Self::with_api_base(credentials, TWILIO_API_BASE)
    }

    pub fn with_api_base(credentials: &TwilioCredentials, api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            account_sid: credentials.account_sid.clone(),
            auth_token: SecretString::from(credentials.auth_token.expose_secret()),
            from: credentials.phone_number.clone(),
        }
    }

    fn calls_url(&self) -> String {
        format!("{}/Accounts/{}/Calls.json", self.api_base, self.account_sid)
    }
}

#[async_trait]
impl CallOriginator for TwilioClient {
    #[instrument(skip(self))]
    async fn originate(&self, to: &str, twiml_url: &str) -> Result<String> {
        let response = self
            .http
            .post(self.calls_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("To", to), ("From", self.from.as_str()), ("Url", twiml_url)])
            .send()
            .await
            .context("Failed to reach the Twilio API")?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<TwilioErrorBody>().await {
                Ok(body) => match body.code {
                    Some(code) => format!("{} (code {})", body.message, code),
                    None => body.message,
                },
                Err(_) => format!("Twilio API returned {}", status),
            };
            return Err(anyhow!(message));
        }

        let call: CallResource = response
            .json()
            .await
            .context("Unexpected response from the Twilio API")?;
        info!(call_sid = %call.sid, "Outbound call created.");
        Ok(call.sid)
    }
}
