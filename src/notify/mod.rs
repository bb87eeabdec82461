use crate::config::Settings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod twilio;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid notifier endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// What the provider hands back for an accepted message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageReceipt {
    pub sid: String,
    pub status: String,
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, body: &str) -> Result<MessageReceipt, NotifyError>;

    fn channel(&self) -> &'static str;
}

/// The WhatsApp sender configured from settings.
pub fn create_sender(settings: &Settings) -> Result<Arc<dyn MessageSender>, NotifyError> {
    let sender = twilio::TwilioWhatsApp::new(settings)?;
    Ok(Arc::new(sender))
}
