//! Reply dispatch: SES by default, SMTP via lettre as an alternative.

use async_trait::async_trait;
use aws_sdk_ses::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use secrecy::ExposeSecret;

use crate::config::SmtpConfig;
use crate::error::NotifyError;
use crate::reply::ReplyMessage;

const CHARSET: &str = "UTF-8";

/// Sends a composed reply.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Send `reply`, returning the provider's message id.
    async fn send(&self, reply: &ReplyMessage) -> Result<String, NotifyError>;
}

// ── SES ─────────────────────────────────────────────────────────────

/// Amazon SES `SendEmail` notifier.
pub struct SesNotifier {
    client: aws_sdk_ses::Client,
}

impl SesNotifier {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ses::Client::new(sdk_config),
        }
    }

    fn transport_error(reason: impl ToString) -> NotifyError {
        NotifyError::Transport {
            provider: "ses".into(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for SesNotifier {
    fn name(&self) -> &str {
        "ses"
    }

    async fn send(&self, reply: &ReplyMessage) -> Result<String, NotifyError> {
        let text = Content::builder()
            .data(&reply.body)
            .charset(CHARSET)
            .build()
            .map_err(Self::transport_error)?;
        let subject = Content::builder()
            .data(&reply.subject)
            .charset(CHARSET)
            .build()
            .map_err(Self::transport_error)?;
        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().text(text).build())
            .build();

        let result = self
            .client
            .send_email()
            .destination(Destination::builder().to_addresses(&reply.recipient).build())
            .message(message)
            .source(&reply.sender)
            .send()
            .await;

        match result {
            Ok(output) => {
                let id: Option<&str> = output.message_id().into();
                Ok(id.unwrap_or_default().to_string())
            }
            Err(err) => match err.as_service_error() {
                Some(service_err) => Err(NotifyError::Rejected {
                    provider: "ses".into(),
                    message: service_err
                        .message()
                        .unwrap_or("no error message")
                        .to_string(),
                }),
                None => Err(Self::transport_error(DisplayErrorContext(&err))),
            },
        }
    }
}

// ── SMTP ────────────────────────────────────────────────────────────

/// SMTP relay notifier.
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport_error(reason: impl ToString) -> NotifyError {
        NotifyError::Transport {
            provider: "smtp".into(),
            reason: reason.to_string(),
        }
    }

    /// Build the outgoing message. Address errors are request errors, not rejections.
    pub fn build_message(reply: &ReplyMessage) -> Result<lettre::Message, NotifyError> {
        lettre::Message::builder()
            .from(
                reply
                    .sender
                    .parse()
                    .map_err(|e| Self::transport_error(format!("Invalid from address: {e}")))?,
            )
            .to(reply
                .recipient
                .parse()
                .map_err(|e| Self::transport_error(format!("Invalid to address: {e}")))?)
            .subject(reply.subject.as_str())
            .body(reply.body.clone())
            .map_err(|e| Self::transport_error(format!("Failed to build email: {e}")))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, reply: &ReplyMessage) -> Result<String, NotifyError> {
        let email = Self::build_message(reply)?;
        let config = self.config.clone();

        let sent = tokio::task::spawn_blocking(move || {
            let creds = Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            );
            let transport = SmtpTransport::relay(&config.host)?
                .port(config.port)
                .credentials(creds)
                .build();
            transport.send(&email)
        })
        .await
        .map_err(|e| Self::transport_error(format!("SMTP task failed: {e}")))?;

        match sent {
            Ok(response) => Ok(response.first_line().unwrap_or_default().to_string()),
            Err(e) if e.is_permanent() => Err(NotifyError::Rejected {
                provider: "smtp".into(),
                message: e.to_string(),
            }),
            Err(e) => Err(Self::transport_error(format!("SMTP send failed: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply() -> ReplyMessage {
        ReplyMessage {
            subject: "Reply: hello".into(),
            body: "We received your email".into(),
            recipient: "alice@example.com".into(),
            sender: "classify@mail.example.org".into(),
        }
    }

    #[test]
    fn smtp_message_builds_for_valid_addresses() {
        let message = SmtpNotifier::build_message(&reply()).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("To: alice@example.com"));
        assert!(formatted.contains("From: classify@mail.example.org"));
        assert!(formatted.contains("Subject: Reply: hello"));
    }

    #[test]
    fn smtp_invalid_address_is_transport_error() {
        let mut bad = reply();
        bad.recipient = "not an address".into();
        let err = SmtpNotifier::build_message(&bad).unwrap_err();
        assert!(matches!(err, NotifyError::Transport { ref provider, .. } if provider == "smtp"));
    }
}
