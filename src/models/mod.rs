pub mod catalog;
pub mod generation_job;
pub mod generation_request;
pub mod record;
