use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::TwilioConfig;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("SMS provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Outbound text-message capability used for verification codes.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError>;
}

pub struct TwilioSms {
    client: reqwest::Client,
    config: TwilioConfig,
}

#[derive(Deserialize)]
struct TwilioErrorBody {
    message: Option<String>,
    code: Option<i64>,
}

impl TwilioSms {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSms {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let res = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to),
                ("From", self.config.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            tracing::debug!(to, "verification sms sent");
            return Ok(());
        }

        let text = res.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<TwilioErrorBody>(&text) {
            Ok(TwilioErrorBody {
                message: Some(message),
                code,
            }) => match code {
                Some(code) => format!("{message} (code {code})"),
                None => message,
            },
            _ => text,
        };
        tracing::error!(status = status.as_u16(), %message, "sms provider rejected message");
        Err(SmsError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Development sender: writes the message to the log instead of delivering it.
pub struct LogSms;

#[async_trait]
impl SmsSender for LogSms {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        tracing::info!(to, body, "sms delivery disabled, message logged");
        Ok(())
    }
}

pub fn verification_message(code: &str) -> String {
    format!("Tu código de verificación es: {code}")
}
