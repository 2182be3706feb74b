use crate::error::{Error, Result};
use crate::models::generation_job::{JobSnapshot, JobStatus};
use crate::models::generation_request::GenerationRequest;
use crate::models::record::LanguageFilter;
use crate::services::pipeline_service::{PipelineService, Progress, RunReport};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct JobEntry {
    created_at: DateTime<Utc>,
    language: LanguageFilter,
    target: usize,
    cancel: CancellationToken,
    progress: watch::Receiver<Progress>,
    finished: watch::Receiver<Option<Finished>>,
}

#[derive(Clone)]
struct Finished {
    at: DateTime<Utc>,
    report: Arc<RunReport>,
}

pub const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(3600);

/// In-process registry of generation runs. Each run is a spawned task owning
/// its own result set; the registry only sees progress and the final report.
/// Finished jobs are dropped once older than the retention window.
#[derive(Clone)]
pub struct JobService {
    pipeline: PipelineService,
    jobs: Arc<RwLock<HashMap<Uuid, JobEntry>>>,
    retention: chrono::Duration,
}

impl JobService {
    pub fn new(pipeline: PipelineService) -> Self {
        Self {
            pipeline,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention: chrono::Duration::seconds(DEFAULT_JOB_RETENTION.as_secs() as i64),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = chrono::Duration::from_std(retention)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        self
    }

    /// Removes finished jobs past the retention window. Running jobs stay.
    fn evict_expired(&self, jobs: &mut HashMap<Uuid, JobEntry>) {
        let now = crate::utils::time::now();
        let before = jobs.len();
        jobs.retain(|_, entry| match entry.finished.borrow().as_ref() {
            Some(done) => now - done.at < self.retention,
            None => true,
        });
        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = jobs.len(), "expired generation jobs evicted");
        }
    }

    pub fn enqueue(&self, request: GenerationRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let target = request.count;
        let cancel = CancellationToken::new();
        let (progress_tx, progress_rx) = watch::channel(Progress {
            target,
            ..Default::default()
        });
        let (finished_tx, finished_rx) = watch::channel(None);

        let entry = JobEntry {
            created_at: crate::utils::time::now(),
            language: request.filters.language,
            target,
            cancel: cancel.clone(),
            progress: progress_rx,
            finished: finished_rx,
        };
        {
            let mut jobs = self
                .jobs
                .write()
                .map_err(|_| Error::Internal("job registry lock poisoned".to_string()))?;
            self.evict_expired(&mut jobs);
            jobs.insert(id, entry);
        }

        let pipeline = self.pipeline.clone();
        tokio::spawn(async move {
            tracing::info!(job_id = %id, target, "generation job started");
            let report = pipeline.run(request, cancel, Some(progress_tx)).await;
            tracing::info!(
                job_id = %id,
                accepted = report.records.len(),
                shortfall = report.shortfall(),
                "generation job finished"
            );
            finished_tx.send_replace(Some(Finished {
                at: crate::utils::time::now(),
                report: Arc::new(report),
            }));
        });

        Ok(id)
    }

    pub fn snapshot(&self, id: Uuid, include_records: bool) -> Result<JobSnapshot> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| Error::Internal("job registry lock poisoned".to_string()))?;
        let entry = jobs
            .get(&id)
            .ok_or_else(|| Error::NotFound("Generation job not found".to_string()))?;

        let progress = entry.progress.borrow().clone();
        let finished = entry.finished.borrow().clone();

        let snapshot = match finished {
            Some(done) => {
                let report = done.report;
                JobSnapshot {
                    id,
                    status: JobStatus::from_report(&report),
                    language: entry.language,
                    created_at: entry.created_at,
                    finished_at: Some(done.at),
                    progress: Progress {
                        accepted: report.records.len(),
                        in_flight: 0,
                        ..progress
                    },
                    outcome: Some(report.outcome()),
                    shortfall: Some(report.shortfall()),
                    batch_plan: report.batch_plan(),
                    failures: report.failures.clone(),
                    records: include_records.then(|| report.records.clone()),
                }
            }
            None => JobSnapshot {
                id,
                status: JobStatus::Running,
                language: entry.language,
                created_at: entry.created_at,
                finished_at: None,
                progress: Progress {
                    target: entry.target,
                    ..progress
                },
                outcome: None,
                shortfall: None,
                batch_plan: Vec::new(),
                failures: Default::default(),
                records: None,
            },
        };
        Ok(snapshot)
    }

    /// Asks a running job to stop after its in-flight batches are cancelled.
    pub fn cancel(&self, id: Uuid) -> Result<()> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| Error::Internal("job registry lock poisoned".to_string()))?;
        let entry = jobs
            .get(&id)
            .ok_or_else(|| Error::NotFound("Generation job not found".to_string()))?;
        if entry.finished.borrow().is_some() {
            return Err(Error::BadRequest("Generation job has already finished".to_string()));
        }
        entry.cancel.cancel();
        tracing::info!(job_id = %id, "generation job cancellation requested");
        Ok(())
    }

    /// Final report of a finished job.
    pub fn report(&self, id: Uuid) -> Result<Arc<RunReport>> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| Error::Internal("job registry lock poisoned".to_string()))?;
        let entry = jobs
            .get(&id)
            .ok_or_else(|| Error::NotFound("Generation job not found".to_string()))?;
        let finished = entry.finished.borrow().clone();
        finished
            .map(|done| done.report)
            .ok_or_else(|| Error::BadRequest("Generation job is still running".to_string()))
    }

    pub async fn wait(&self, id: Uuid) -> Result<Arc<RunReport>> {
        let mut finished = {
            let jobs = self
                .jobs
                .read()
                .map_err(|_| Error::Internal("job registry lock poisoned".to_string()))?;
            jobs.get(&id)
                .map(|entry| entry.finished.clone())
                .ok_or_else(|| Error::NotFound("Generation job not found".to_string()))?
        };
        let done = finished
            .wait_for(|f| f.is_some())
            .await
            .map_err(|_| Error::Internal("generation job dropped".to_string()))?
            .clone();
        done.map(|d| d.report)
            .ok_or_else(|| Error::Internal("generation job dropped".to_string()))
    }
}
