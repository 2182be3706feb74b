pub mod assistant_service;
pub mod batch_planner;
pub mod catalog_service;
pub mod export_service;
pub mod generation_client;
pub mod job_service;
pub mod pipeline_service;
pub mod prompt_service;
pub mod reconciler;
