use crate::config::PipelineConfig;
use crate::models::generation_request::GenerationRequest;
use crate::models::record::Record;
use crate::services::assistant_service::AssistantApi;
use crate::services::batch_planner::next_batch_size;
use crate::services::generation_client::{BatchFailure, GenerationClient, RawBatchResult};
use crate::services::reconciler::{reconcile, ResultSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Target met.
    Done,
    /// Too many consecutive rounds without new records.
    Aborted,
    /// Stopped by the caller.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Complete,
    Partial { shortfall: usize },
    NothingGenerated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundLog {
    pub round: usize,
    pub batch_size: usize,
    pub added: usize,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub accepted: usize,
    pub target: usize,
    pub rounds: usize,
    pub in_flight: usize,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub target: usize,
    pub termination: Termination,
    pub rounds: Vec<RoundLog>,
    pub failures: BTreeMap<String, usize>,
    pub records: Vec<Record>,
}

impl RunReport {
    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.records.len())
    }

    pub fn outcome(&self) -> Outcome {
        let shortfall = self.shortfall();
        if shortfall == 0 {
            Outcome::Complete
        } else if self.records.is_empty() {
            Outcome::NothingGenerated
        } else {
            Outcome::Partial { shortfall }
        }
    }

    pub fn batch_plan(&self) -> Vec<usize> {
        self.rounds.iter().map(|r| r.batch_size).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Planning,
    Requesting,
    Reconciling,
    Done,
    Aborted,
    Cancelled,
}

/// Drives batches against the assistant until the target is met, the retry
/// budget runs out, or the caller cancels. The result set has one writer:
/// this loop. Batches only produce raw text.
#[derive(Clone)]
pub struct PipelineService {
    client: GenerationClient,
    config: PipelineConfig,
}

impl PipelineService {
    pub fn new(api: Arc<dyn AssistantApi>, config: PipelineConfig) -> Self {
        let client = GenerationClient::new(api, config.poll_interval, config.run_timeout);
        Self { client, config }
    }

    pub async fn run(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
        progress: Option<watch::Sender<Progress>>,
    ) -> RunReport {
        let target = request.count;
        let max_step = self.config.batch_policy.max_step(target);
        let slots = self.config.max_in_flight.max(1);
        let workers = cancel.child_token();

        let mut set = ResultSet::with_capacity_limit(target);
        let mut in_flight: JoinSet<(usize, RawBatchResult)> = JoinSet::new();
        let mut requested_in_flight = 0usize;
        let mut consecutive_failures = 0u32;
        let mut rounds: Vec<RoundLog> = Vec::new();
        let mut failures: BTreeMap<String, usize> = BTreeMap::new();
        let mut phase = Phase::Planning;

        tracing::info!(target, max_step, slots, "generation run started");

        loop {
            if phase == Phase::Planning {
                phase = self.next_phase(&set, target, consecutive_failures, &cancel);
                if phase != Phase::Planning {
                    workers.cancel();
                }
            }

            if phase == Phase::Planning {
                let budget = self.config.max_consecutive_failures as usize;
                while in_flight.len() < slots {
                    // Every outstanding batch may still extend the failure streak.
                    if !in_flight.is_empty()
                        && consecutive_failures as usize + in_flight.len() >= budget
                    {
                        break;
                    }
                    let size = next_batch_size(target, set.len() + requested_in_flight, max_step);
                    if size == 0 {
                        break;
                    }
                    let client = self.client.clone();
                    let batch = request.for_batch(size);
                    let token = workers.clone();
                    in_flight.spawn(async move {
                        let result = client.submit(&batch, &token).await;
                        (size, result)
                    });
                    requested_in_flight += size;
                    tracing::debug!(batch_size = size, in_flight = in_flight.len(), "batch requested");
                }
                phase = Phase::Requesting;
            }

            let Some(joined) = in_flight.join_next().await else {
                match phase {
                    Phase::Done | Phase::Aborted | Phase::Cancelled => break,
                    _ => {
                        phase = Phase::Planning;
                        continue;
                    }
                }
            };

            let stopping = matches!(phase, Phase::Done | Phase::Aborted | Phase::Cancelled);
            if !stopping {
                phase = Phase::Reconciling;
            }

            let (size, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::error!(error = ?e, "batch task panicked");
                    (0, Err(BatchFailure::ServiceError(e.to_string())))
                }
            };
            requested_in_flight = requested_in_flight.saturating_sub(size);
            if in_flight.is_empty() {
                requested_in_flight = 0;
            }

            let (added, failure) = match result {
                Ok(raw) => match reconcile(&raw.text, &mut set) {
                    Ok(summary) => (summary.added, None),
                    Err(e) => {
                        tracing::warn!(run_id = %raw.run_id, reason = e.kind(), "batch yielded no records");
                        (0, Some(e.kind()))
                    }
                },
                Err(BatchFailure::Aborted) => (0, Some(BatchFailure::Aborted.kind())),
                Err(failure) => {
                    tracing::warn!(reason = failure.kind(), error = %failure, "batch failed");
                    (0, Some(failure.kind()))
                }
            };

            let cancelled_batch = failure == Some(BatchFailure::Aborted.kind());
            if let Some(kind) = failure.filter(|_| !cancelled_batch) {
                *failures.entry(kind.to_string()).or_insert(0) += 1;
            }
            if !stopping && !cancelled_batch {
                if added > 0 {
                    consecutive_failures = 0;
                } else {
                    consecutive_failures += 1;
                }
            }
            if cancelled_batch {
                tracing::debug!(batch_size = size, "batch cancelled while stopping");
                if !stopping {
                    phase = Phase::Planning;
                }
                continue;
            }
            rounds.push(RoundLog {
                round: rounds.len() + 1,
                batch_size: size,
                added,
                failure: failure.map(str::to_string),
            });
            tracing::info!(
                round = rounds.len(),
                batch_size = size,
                added,
                accepted = set.len(),
                target,
                "round finished"
            );

            if let Some(tx) = &progress {
                tx.send_replace(Progress {
                    accepted: set.len(),
                    target,
                    rounds: rounds.len(),
                    in_flight: in_flight.len(),
                    consecutive_failures,
                });
            }

            if !stopping {
                phase = Phase::Planning;
            }
        }

        let termination = match phase {
            Phase::Done => Termination::Done,
            Phase::Cancelled => Termination::Cancelled,
            _ => Termination::Aborted,
        };

        let report = RunReport {
            target,
            termination,
            rounds,
            failures,
            records: set.into_records(),
        };
        match report.outcome() {
            Outcome::Complete => {
                tracing::info!(accepted = report.records.len(), "all requested questions generated")
            }
            Outcome::Partial { shortfall } => tracing::warn!(
                accepted = report.records.len(),
                shortfall,
                termination = ?report.termination,
                "only part of the requested questions could be generated"
            ),
            Outcome::NothingGenerated => {
                tracing::warn!(termination = ?report.termination, "no questions were generated")
            }
        }
        report
    }

    fn next_phase(
        &self,
        set: &ResultSet,
        target: usize,
        consecutive_failures: u32,
        cancel: &CancellationToken,
    ) -> Phase {
        if set.len() >= target {
            Phase::Done
        } else if cancel.is_cancelled() {
            Phase::Cancelled
        } else if consecutive_failures >= self.config.max_consecutive_failures {
            Phase::Aborted
        } else {
            Phase::Planning
        }
    }
}
