use super::error::SubmissionError;
use super::submission::SubmissionRequest;
use async_trait::async_trait;
use std::time::Duration;

/// The byte-transfer phase of a submission.
#[async_trait]
pub trait TransferStep: Send + Sync {
    async fn transfer(&self, request: &SubmissionRequest) -> Result<(), SubmissionError>;
}

/// Stands in for a real upload by waiting a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedTransfer {
    delay: Duration,
}

impl SimulatedTransfer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl TransferStep for SimulatedTransfer {
    async fn transfer(&self, request: &SubmissionRequest) -> Result<(), SubmissionError> {
        tracing::debug!(
            title = %request.title,
            delay_ms = self.delay.as_millis() as u64,
            "Simulating file transfer"
        );
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn waits_for_the_configured_delay() {
        let transfer = SimulatedTransfer::new(Duration::from_secs(3));
        let request = SubmissionRequest {
            title: "Notes".into(),
            description: None,
        };

        let start = tokio::time::Instant::now();
        transfer.transfer(&request).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
