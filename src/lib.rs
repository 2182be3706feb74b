pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::{Config, PipelineConfig};
use crate::services::{
    assistant_service::{AssistantApi, OpenAiAssistantClient},
    job_service::JobService,
    pipeline_service::PipelineService,
};
use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub job_service: JobService,
    pub max_target_count: u32,
}

impl AppState {
    pub fn new(config: &Config) -> error::Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let api = OpenAiAssistantClient::new(
            http_client,
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.assistant_id.clone(),
            config.model_name.clone(),
        );
        let pipeline = PipelineService::new(Arc::new(api), config.pipeline());
        Ok(Self {
            job_service: JobService::new(pipeline)
                .with_retention(Duration::from_secs(config.job_retention_secs)),
            max_target_count: config.max_target_count,
        })
    }

    /// State backed by any assistant implementation.
    pub fn with_api(
        api: Arc<dyn AssistantApi>,
        pipeline_config: PipelineConfig,
        max_target_count: u32,
    ) -> Self {
        let pipeline = PipelineService::new(api, pipeline_config);
        Self {
            job_service: JobService::new(pipeline),
            max_target_count,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/catalog", get(routes::catalog::get_catalog))
        .route(
            "/api/generations",
            post(routes::generation::create_generation),
        )
        .route(
            "/api/generations/:id",
            get(routes::generation::get_generation),
        )
        .route(
            "/api/generations/:id/cancel",
            post(routes::generation::cancel_generation),
        )
        .route(
            "/api/generations/:id/export",
            get(routes::export::export_generation),
        )
        .with_state(state)
}
