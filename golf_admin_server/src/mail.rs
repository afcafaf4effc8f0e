use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MailError {
    #[error("mail transport disabled")]
    Disabled,
    #[error("delivery to {0} rejected")]
    Rejected(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError>;
}

/// Writes every message to the log instead of delivering it.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: String) -> Self {
        LogMailer { from }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError> {
        info!(from = %self.from, to = %message.to, subject = %message.subject, "Sending mail");
        Ok(())
    }
}

pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _message: &OutgoingMessage) -> Result<(), MailError> {
        Err(MailError::Disabled)
    }
}

/// Keeps delivered messages in memory. Addresses registered with
/// `fail_for` are rejected.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for<I, S>(addresses: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> {
        RecordingMailer {
            sent: Mutex::new(vec![]),
            failing: Mutex::new(addresses.into_iter().map(|a| a.into()).collect()),
        }
    }

    pub async fn fail_for(&self, address: &str) {
        self.failing.lock().await.insert(address.to_string());
    }

    pub async fn recover(&self, address: &str) {
        self.failing.lock().await.remove(address);
    }

    pub async fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), MailError> {
        if self.failing.lock().await.contains(&message.to) {
            return Err(MailError::Rejected(message.to.clone()));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn message(to: &str) -> OutgoingMessage {
        OutgoingMessage {
            to: to.into(),
            to_name: "Test".into(),
            subject: "Oggetto".into(),
            body: "Corpo".into(),
        }
    }

    #[tokio::test]
    async fn test_recording_mailer_rejects_configured_addresses() {
        let mailer = RecordingMailer::failing_for(["bad@example.org"]);
        assert!(mailer.send(&message("ok@example.org")).await.is_ok());
        assert_eq!(mailer.send(&message("bad@example.org")).await, Err(MailError::Rejected("bad@example.org".into())));
        assert_eq!(mailer.sent().await.len(), 1);

        mailer.recover("bad@example.org").await;
        assert!(mailer.send(&message("bad@example.org")).await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_mailer_always_fails() {
        let err = DisabledMailer.send(&message("ok@example.org")).await.unwrap_err();
        assert_eq!(err.to_string(), "mail transport disabled");
    }
}
