//! NATS producer for analysis outcomes

use crate::types::report::JobOutcome;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Producer for publishing job outcomes to NATS
#[derive(Clone)]
pub struct OutcomeProducer {
    client: Client,
    subject: String,
}

impl OutcomeProducer {
    /// Create a new outcome producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish the outcome of one job
    pub async fn publish(&self, outcome: &JobOutcome) -> Result<()> {
        let payload = serde_json::to_vec(outcome)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            analise_id = %outcome.analise_id(),
            completed = matches!(outcome, JobOutcome::Completed { .. }),
            "Published job outcome"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
