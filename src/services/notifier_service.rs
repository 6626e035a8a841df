//! Notification delivery.

use crate::models::notification::Notification;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sesv2::{
    Client,
    error::DisplayErrorContext,
    types::{Body, Content, Destination, EmailContent, Message},
};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

const CHARSET: &str = "UTF-8";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("could not build message: {0}")]
    Build(String),
    #[error("sending to `{recipient}` failed: {message}")]
    Send { recipient: String, message: String },
    #[error("delivery to `{0}` returned no message id")]
    MissingMessageId(String),
}

/// Delivers a message and returns the transport's delivery identifier.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<String, NotifyError>;
}

/// Sends plain-text e-mail through Amazon SES.
#[derive(Clone, Debug)]
pub struct SesNotifier {
    client: Client,
}

impl SesNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(shared: &SdkConfig) -> Self {
        Self::new(Client::new(shared))
    }
}

fn utf8_content(data: &str) -> Result<Content, NotifyError> {
    Content::builder()
        .data(data)
        .charset(CHARSET)
        .build()
        .map_err(|err| NotifyError::Build(err.to_string()))
}

#[async_trait]
impl Notifier for SesNotifier {
    async fn send(&self, notification: &Notification) -> Result<String, NotifyError> {
        let message = Message::builder()
            .subject(utf8_content(&notification.subject)?)
            .body(Body::builder().text(utf8_content(&notification.body)?).build())
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&notification.sender)
            .destination(
                Destination::builder()
                    .to_addresses(&notification.recipient)
                    .build(),
            )
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|err| NotifyError::Send {
                recipient: notification.recipient.clone(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        let message_id = output
            .message_id()
            .map(str::to_string)
            .ok_or_else(|| NotifyError::MissingMessageId(notification.recipient.clone()))?;
        debug!(message_id = %message_id, "SES accepted message");
        Ok(message_id)
    }
}

/// Writes messages to the log instead of sending them. Each message gets a
/// fresh UUID as its delivery id.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<String, NotifyError> {
        let message_id = Uuid::new_v4().to_string();
        info!(
            message_id = %message_id,
            sender = %notification.sender,
            recipient = %notification.recipient,
            subject = %notification.subject,
            "dry run, not sending message:\n{}",
            notification.body
        );
        Ok(message_id)
    }
}
