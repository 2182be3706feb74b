mod common;

use common::{payload, row, Reply, ScriptedAssistant};
use queai_backend::config::PipelineConfig;
use queai_backend::models::generation_request::{GenerationFilters, GenerationRequest};
use queai_backend::models::record::Language;
use queai_backend::services::pipeline_service::{Outcome, PipelineService, Termination};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn config() -> PipelineConfig {
    PipelineConfig {
        poll_interval: Duration::from_millis(1),
        run_timeout: Duration::from_secs(5),
        ..PipelineConfig::default()
    }
}

fn request(count: usize) -> GenerationRequest {
    GenerationRequest::new(count, GenerationFilters::default())
}

#[tokio::test]
async fn small_target_is_met_in_capped_batches() {
    let api = Arc::new(ScriptedAssistant::always(Reply::Echo { extra: 0 }));
    let pipeline = PipelineService::new(api.clone(), config());

    let report = pipeline.run(request(12), CancellationToken::new(), None).await;

    assert_eq!(report.termination, Termination::Done);
    assert_eq!(report.outcome(), Outcome::Complete);
    assert_eq!(report.records.len(), 12);
    assert_eq!(report.batch_plan(), vec![5, 5, 2]);
    assert_eq!(api.requested_sizes(), vec![5, 5, 2]);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn duplicates_across_batches_are_dropped() {
    let first = payload(&[row("A?", "अ?"), row("B?", "ब?"), row("C?", "स?")]);
    let second = payload(&[
        row("B?", "ब?"),
        row("C?", "स?"),
        row("D?", "द?"),
        row("E?", "ए?"),
    ]);
    let api = Arc::new(ScriptedAssistant::new(
        vec![Reply::Text(first), Reply::Text(second)],
        Reply::Echo { extra: 0 },
    ));
    let pipeline = PipelineService::new(api.clone(), config());

    let report = pipeline.run(request(5), CancellationToken::new(), None).await;

    let questions: Vec<&str> = report
        .records
        .iter()
        .map(|r| r.question_text.get(Language::English))
        .collect();
    assert_eq!(questions, vec!["A?", "B?", "C?", "D?", "E?"]);
    assert_eq!(report.batch_plan(), vec![5, 2]);
    assert_eq!(report.termination, Termination::Done);
}

#[tokio::test]
async fn gives_up_after_consecutive_empty_rounds() {
    let api = Arc::new(ScriptedAssistant::always(Reply::Text(
        "Not found in knowledge text.".to_string(),
    )));
    let pipeline = PipelineService::new(api.clone(), config());

    let report = pipeline.run(request(10), CancellationToken::new(), None).await;

    assert_eq!(report.termination, Termination::Aborted);
    assert_eq!(report.rounds.len(), 3);
    assert!(report.records.is_empty());
    assert_eq!(report.shortfall(), 10);
    assert_eq!(report.outcome(), Outcome::NothingGenerated);
    assert_eq!(report.failures.get("no_data"), Some(&3));
}

#[tokio::test]
async fn a_productive_round_resets_the_failure_streak() {
    let api = Arc::new(ScriptedAssistant::new(
        vec![
            Reply::Fail("server_error: overloaded".to_string()),
            Reply::Fail("server_error: overloaded".to_string()),
            Reply::Echo { extra: 0 },
            Reply::Fail("server_error: overloaded".to_string()),
            Reply::Fail("server_error: overloaded".to_string()),
        ],
        Reply::Echo { extra: 0 },
    ));
    let pipeline = PipelineService::new(api.clone(), config());

    let report = pipeline.run(request(10), CancellationToken::new(), None).await;

    assert_eq!(report.termination, Termination::Done);
    assert_eq!(report.records.len(), 10);
    assert_eq!(report.rounds.len(), 6);
    assert_eq!(report.failures.get("job_failed"), Some(&4));
}

#[tokio::test]
async fn partial_result_reports_shortfall() {
    let api = Arc::new(ScriptedAssistant::new(
        vec![Reply::Text(payload(&[row("Only one?", "केवल एक?")]))],
        Reply::Unreachable,
    ));
    let pipeline = PipelineService::new(api.clone(), config());

    let report = pipeline.run(request(4), CancellationToken::new(), None).await;

    assert_eq!(report.termination, Termination::Aborted);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.outcome(), Outcome::Partial { shortfall: 3 });
    assert_eq!(report.failures.get("service_error"), Some(&3));
}

#[tokio::test]
async fn malformed_row_is_skipped_and_the_rest_kept() {
    let mut rows = vec![row("One?", "एक?"), row("Two?", "दो?")];
    rows.push("Polity,Constitution,,MCQ".to_string());
    rows.push(row("Three?", "तीन?"));
    let api = Arc::new(ScriptedAssistant::new(
        vec![Reply::Text(payload(&rows))],
        Reply::Echo { extra: 0 },
    ));
    let pipeline = PipelineService::new(api.clone(), config());

    let report = pipeline.run(request(3), CancellationToken::new(), None).await;

    assert_eq!(report.records.len(), 3);
    assert_eq!(report.rounds.len(), 1);
    assert_eq!(report.records[2].question_text.get(Language::Hindi), "तीन?");
}

#[tokio::test]
async fn stuck_runs_time_out_and_are_cancelled_remotely() {
    let api = Arc::new(ScriptedAssistant::always(Reply::Hang));
    let pipeline = PipelineService::new(
        api.clone(),
        PipelineConfig {
            poll_interval: Duration::from_millis(2),
            run_timeout: Duration::from_millis(20),
            max_consecutive_failures: 2,
            ..PipelineConfig::default()
        },
    );

    let report = pipeline.run(request(5), CancellationToken::new(), None).await;

    assert_eq!(report.termination, Termination::Aborted);
    assert_eq!(report.rounds.len(), 2);
    assert_eq!(report.failures.get("timeout"), Some(&2));
    assert_eq!(api.cancel_count(), 2);
}

#[tokio::test]
async fn parallel_batches_never_overshoot_the_target() {
    let api = Arc::new(ScriptedAssistant::always(Reply::Echo { extra: 2 }));
    let pipeline = PipelineService::new(
        api.clone(),
        PipelineConfig {
            max_in_flight: 3,
            ..config()
        },
    );

    let report = pipeline.run(request(12), CancellationToken::new(), None).await;

    assert_eq!(report.termination, Termination::Done);
    assert_eq!(report.records.len(), 12);
    let requested: usize = api.requested_sizes().iter().sum();
    assert!(requested >= 12);
}

#[tokio::test]
async fn caller_cancel_stops_in_flight_runs() {
    let api = Arc::new(ScriptedAssistant::always(Reply::Hang));
    let pipeline = PipelineService::new(
        api.clone(),
        PipelineConfig {
            max_in_flight: 2,
            run_timeout: Duration::from_secs(30),
            ..config()
        },
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), pipeline.run(request(10), cancel, None))
        .await
        .expect("run should stop after cancellation");

    assert_eq!(report.termination, Termination::Cancelled);
    assert!(report.records.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(api.cancel_count(), 2);
}

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let api = Arc::new(ScriptedAssistant::always(Reply::Echo { extra: 0 }));
    let pipeline = PipelineService::new(api.clone(), config());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = pipeline.run(request(5), cancel, None).await;

    assert_eq!(report.termination, Termination::Cancelled);
    assert!(report.rounds.is_empty());
    assert!(api.requested_sizes().is_empty());
}

#[tokio::test]
async fn parallel_run_stops_refilling_once_failures_could_exhaust_retries() {
    let api = Arc::new(ScriptedAssistant::always(Reply::Text(
        "Not found in knowledge text.".to_string(),
    )));
    let pipeline = PipelineService::new(
        api.clone(),
        PipelineConfig {
            max_in_flight: 3,
            ..config()
        },
    );

    let report = pipeline.run(request(12), CancellationToken::new(), None).await;

    assert_eq!(report.termination, Termination::Aborted);
    let mut plan = report.batch_plan();
    plan.sort_unstable();
    assert_eq!(plan, vec![2, 5, 5]);
    assert_eq!(report.failures.get("no_data"), Some(&3));
    assert_eq!(api.requested_sizes().len(), 3);
    assert_eq!(api.cancel_count(), 0);
}

#[tokio::test]
async fn batches_cancelled_by_the_caller_are_not_reported_as_rounds() {
    let api = Arc::new(ScriptedAssistant::always(Reply::Hang));
    let pipeline = PipelineService::new(
        api.clone(),
        PipelineConfig {
            max_in_flight: 3,
            run_timeout: Duration::from_secs(30),
            ..config()
        },
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let report = pipeline.run(request(12), cancel, None).await;

    assert_eq!(report.termination, Termination::Cancelled);
    assert!(report.rounds.is_empty());
    assert!(report.batch_plan().is_empty());
    assert_eq!(api.cancel_count(), 3);
}
