use crate::error::Error;
use crate::models::generation_request::GenerationRequest;
use crate::services::assistant_service::{AssistantApi, RunState, RunStatus};
use crate::services::prompt_service::build_prompt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchFailure {
    #[error("assistant service error: {0}")]
    ServiceError(String),
    #[error("run failed: {0}")]
    JobFailed(String),
    #[error("run was cancelled remotely")]
    JobCancelled,
    #[error("run expired")]
    JobExpired,
    #[error("run requires an action the pipeline cannot take")]
    RequiresAction,
    #[error("run did not finish within {0:?}")]
    Timeout(Duration),
    #[error("generation was cancelled by the caller")]
    Aborted,
}

impl BatchFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            BatchFailure::ServiceError(_) => "service_error",
            BatchFailure::JobFailed(_) => "job_failed",
            BatchFailure::JobCancelled => "job_cancelled",
            BatchFailure::JobExpired => "job_expired",
            BatchFailure::RequiresAction => "requires_action",
            BatchFailure::Timeout(_) => "timeout",
            BatchFailure::Aborted => "aborted",
        }
    }
}

impl From<Error> for BatchFailure {
    fn from(err: Error) -> Self {
        BatchFailure::ServiceError(err.to_string())
    }
}

/// Text returned by one completed run.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub text: String,
    pub thread_id: String,
    pub run_id: String,
    pub elapsed: Duration,
}

pub type RawBatchResult = std::result::Result<RawBatch, BatchFailure>;

#[derive(Clone)]
pub struct GenerationClient {
    api: Arc<dyn AssistantApi>,
    poll_interval: Duration,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(api: Arc<dyn AssistantApi>, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            api,
            poll_interval,
            timeout,
        }
    }

    /// Runs one batch on a fresh thread and waits for it to settle. A run
    /// that outlives the timeout, or the caller's cancellation, is cancelled
    /// remotely before returning.
    pub async fn submit(&self, request: &GenerationRequest, cancel: &CancellationToken) -> RawBatchResult {
        let prompt = build_prompt(request);

        let thread_id = self.api.create_thread().await?;
        self.api.add_user_message(&thread_id, &prompt).await?;
        let mut run = self.api.create_run(&thread_id).await?;
        tracing::info!(thread_id = %thread_id, run_id = %run.id, count = request.count, "run created");

        let started = Instant::now();
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => {
                    self.cancel_remote(&thread_id, &run.id).await;
                    return Err(BatchFailure::Aborted);
                }
            }

            let polled = self.api.retrieve_run(&thread_id, &run.id).await;
            run = match polled {
                Ok(state) => state,
                Err(e) => {
                    self.cancel_remote(&thread_id, &run.id).await;
                    return Err(e.into());
                }
            };

            match run.status {
                RunStatus::Completed => {
                    return self.collect(&thread_id, &run, started.elapsed()).await;
                }
                RunStatus::Failed | RunStatus::Incomplete => {
                    let message = run
                        .last_error
                        .clone()
                        .unwrap_or_else(|| format!("{:?}", run.status));
                    tracing::warn!(run_id = %run.id, error = %message, "run failed");
                    return Err(BatchFailure::JobFailed(message));
                }
                RunStatus::Cancelled => return Err(BatchFailure::JobCancelled),
                RunStatus::Expired => return Err(BatchFailure::JobExpired),
                RunStatus::RequiresAction => {
                    self.cancel_remote(&thread_id, &run.id).await;
                    return Err(BatchFailure::RequiresAction);
                }
                RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling | RunStatus::Unknown => {}
            }

            if started.elapsed() >= self.timeout {
                tracing::warn!(run_id = %run.id, "run took too long, cancelling");
                self.cancel_remote(&thread_id, &run.id).await;
                return Err(BatchFailure::Timeout(self.timeout));
            }
        }
    }

    async fn collect(&self, thread_id: &str, run: &RunState, elapsed: Duration) -> RawBatchResult {
        let text = self
            .api
            .latest_assistant_message(thread_id)
            .await?
            .ok_or_else(|| BatchFailure::ServiceError("No assistant response found".to_string()))?;
        tracing::info!(run_id = %run.id, elapsed_ms = elapsed.as_millis() as u64, bytes = text.len(), "run completed");
        Ok(RawBatch {
            text,
            thread_id: thread_id.to_string(),
            run_id: run.id.clone(),
            elapsed,
        })
    }

    async fn cancel_remote(&self, thread_id: &str, run_id: &str) {
        if let Err(e) = self.api.cancel_run(thread_id, run_id).await {
            tracing::error!(run_id = %run_id, error = ?e, "failed to cancel run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generation_request::GenerationFilters;
    use crate::services::assistant_service::MockAssistantApi;

    fn run(status: RunStatus) -> RunState {
        RunState {
            id: "run_1".to_string(),
            status,
            last_error: None,
        }
    }

    fn mock_with_run() -> MockAssistantApi {
        let mut mock = MockAssistantApi::new();
        mock.expect_create_thread()
            .times(1)
            .returning(|| Ok("thread_1".to_string()));
        mock.expect_add_user_message()
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_create_run()
            .times(1)
            .returning(|_| Ok(run(RunStatus::Queued)));
        mock
    }

    fn client(mock: MockAssistantApi, timeout_ms: u64) -> GenerationClient {
        GenerationClient::new(
            Arc::new(mock),
            Duration::from_millis(5),
            Duration::from_millis(timeout_ms),
        )
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new(5, GenerationFilters::default())
    }

    #[tokio::test]
    async fn completed_run_returns_message_text() {
        let mut mock = mock_with_run();
        mock.expect_retrieve_run()
            .returning(|_, _| Ok(run(RunStatus::Completed)));
        mock.expect_latest_assistant_message()
            .times(1)
            .returning(|_| Ok(Some("Subject,Topic".to_string())));
        mock.expect_cancel_run().never();

        let raw = client(mock, 1_000)
            .submit(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(raw.text, "Subject,Topic");
        assert_eq!(raw.thread_id, "thread_1");
    }

    #[tokio::test]
    async fn stuck_run_is_cancelled_on_timeout() {
        let mut mock = mock_with_run();
        mock.expect_retrieve_run()
            .returning(|_, _| Ok(run(RunStatus::InProgress)));
        mock.expect_cancel_run()
            .times(1)
            .returning(|_, _| Ok(()));
        mock.expect_latest_assistant_message().never();

        let err = client(mock, 30)
            .submit(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn terminal_statuses_map_to_failures() {
        let mut mock = mock_with_run();
        mock.expect_retrieve_run().returning(|_, _| {
            Ok(RunState {
                id: "run_1".to_string(),
                status: RunStatus::Failed,
                last_error: Some("server_error: boom".to_string()),
            })
        });
        let err = client(mock, 1_000)
            .submit(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, BatchFailure::JobFailed("server_error: boom".to_string()));

        let mut mock = mock_with_run();
        mock.expect_retrieve_run()
            .returning(|_, _| Ok(run(RunStatus::Expired)));
        let err = client(mock, 1_000)
            .submit(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "job_expired");
    }

    #[tokio::test]
    async fn service_errors_are_tagged() {
        let mut mock = MockAssistantApi::new();
        mock.expect_create_thread()
            .returning(|| Err(Error::Internal("401 Unauthorized".to_string())));
        let err = client(mock, 1_000)
            .submit(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "service_error");
    }

    #[tokio::test]
    async fn caller_cancellation_cancels_remote_run() {
        let mut mock = mock_with_run();
        mock.expect_retrieve_run()
            .returning(|_, _| Ok(run(RunStatus::InProgress)));
        mock.expect_cancel_run()
            .times(1)
            .returning(|_, _| Ok(()));

        let token = CancellationToken::new();
        token.cancel();
        let err = client(mock, 10_000)
            .submit(&request(), &token)
            .await
            .unwrap_err();
        assert_eq!(err, BatchFailure::Aborted);
    }
}
