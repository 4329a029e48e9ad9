//! Minimal Twilio REST client: places outbound calls with a status callback.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

const TWILIO_API_URL: &str = "https://api.twilio.com/2010-04-01";
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Provider events that trigger our status webhook.
const STATUS_CALLBACK_EVENTS: [&str; 4] = ["initiated", "ringing", "answered", "completed"];

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Twilio API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid phone number: '{0}'")]
    InvalidNumber(String),
}

/// The subset of Twilio's call resource we use.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedCall {
    pub sid: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
}

/// Outbound-call provider. `TwilioClient` is the production implementation.
#[async_trait]
pub trait Telephony: Send + Sync {
    /// Asks the provider to dial `to`. The provider fetches `script_url` for
    /// the call's TwiML when it connects and POSTs lifecycle events to
    /// `status_callback_url`.
    async fn place_call(
        &self,
        to: &str,
        script_url: &str,
        status_callback_url: &str,
    ) -> Result<PlacedCall, TelephonyError>;
}

#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioClient {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            account_sid,
            auth_token,
            from_number,
        }
    }
}

#[async_trait]
impl Telephony for TwilioClient {
    /// No retry: a failure here is reported to the caller as-is.
    async fn place_call(
        &self,
        to: &str,
        script_url: &str,
        status_callback_url: &str,
    ) -> Result<PlacedCall, TelephonyError> {
        let to = normalize_phone(to)?;
        let mut form: Vec<(&str, &str)> = vec![
            ("To", to.as_str()),
            ("From", self.from_number.as_str()),
            ("Url", script_url),
            ("Method", "POST"),
            ("StatusCallback", status_callback_url),
            ("StatusCallbackMethod", "POST"),
        ];
        form.extend(
            STATUS_CALLBACK_EVENTS
                .iter()
                .map(|event| ("StatusCallbackEvent", *event)),
        );

        let response = self
            .client
            .post(format!(
                "{TWILIO_API_URL}/Accounts/{}/Calls.json",
                self.account_sid
            ))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(TelephonyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let call: PlacedCall = response.json().await?;
        info!("Twilio accepted call {} ({})", call.sid, call.status);
        Ok(call)
    }
}

/// Reduces a CSV phone number to E.164 (`+<digits>`). The number must carry
/// its country code: the provider rejects bare national numbers.
pub fn normalize_phone(raw: &str) -> Result<String, TelephonyError> {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix('+') else {
        return Err(TelephonyError::InvalidNumber(raw.to_string()));
    };
    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    let allowed = |c: char| c.is_ascii_digit() || " -().".contains(c);
    if digits.len() < 7 || digits.len() > 15 || !rest.chars().all(allowed) {
        return Err(TelephonyError::InvalidNumber(raw.to_string()));
    }
    Ok(format!("+{digits}"))
}
