use crate::models::record::{LanguageFilter, Record};
use crate::services::pipeline_service::{Outcome, Progress, RunReport, Termination};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Partial,
    Empty,
    Cancelled,
}

impl JobStatus {
    pub fn from_report(report: &RunReport) -> Self {
        if report.termination == Termination::Cancelled {
            return JobStatus::Cancelled;
        }
        match report.outcome() {
            Outcome::Complete => JobStatus::Completed,
            Outcome::Partial { .. } => JobStatus::Partial,
            Outcome::NothingGenerated => JobStatus::Empty,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    pub language: LanguageFilter,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub progress: Progress,
    pub outcome: Option<Outcome>,
    pub shortfall: Option<usize>,
    pub batch_plan: Vec<usize>,
    pub failures: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Record>>,
}
