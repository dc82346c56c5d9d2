//! NATS consumer for boleto analysis jobs

use crate::types::boleto::BoletoJob;
use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for receiving analysis jobs from NATS
pub struct JobConsumer {
    client: Client,
    subject: String,
}

impl JobConsumer {
    /// Create a new job consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the job subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self
            .client
            .subscribe(self.subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {}", self.subject))?;
        info!(subject = %self.subject, "Subscribed to job subject");
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode a job payload.
pub fn decode_job(payload: &[u8]) -> Result<BoletoJob> {
    serde_json::from_slice(payload).context("Invalid boleto job payload")
}
