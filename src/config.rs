use crate::error::{Error, Result};
use crate::services::batch_planner::BatchPolicy;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

const DEFAULT_MODEL_NAME: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub assistant_id: String,
    pub model_name: String,
    pub poll_interval_ms: u64,
    pub max_run_time_secs: u64,
    pub max_retries: u32,
    pub max_in_flight: usize,
    pub max_target_count: u32,
    pub job_retention_secs: u64,
    pub batch_policy: BatchPolicy,
}

/// Settings the generation pipeline needs for one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    pub max_consecutive_failures: u32,
    pub max_in_flight: usize,
    pub batch_policy: BatchPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
            run_timeout: Duration::from_secs(300),
            max_consecutive_failures: 3,
            max_in_flight: 1,
            batch_policy: BatchPolicy::default(),
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let openai_base_url = get_env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL);
        url::Url::parse(&openai_base_url)
            .map_err(|e| Error::Config(format!("Invalid value for OPENAI_BASE_URL: {}", e)))?;

        let defaults = BatchPolicy::default();
        let batch_policy = BatchPolicy {
            large_threshold: get_env_parse_or("BATCH_LARGE_THRESHOLD", defaults.large_threshold)?,
            large_step: get_env_parse_or("BATCH_LARGE_STEP", defaults.large_step)?,
            medium_threshold: get_env_parse_or("BATCH_MEDIUM_THRESHOLD", defaults.medium_threshold)?,
            medium_step: get_env_parse_or("BATCH_MEDIUM_STEP", defaults.medium_step)?,
            small_step: get_env_parse_or("BATCH_SMALL_STEP", defaults.small_step)?,
        };
        if batch_policy.large_step == 0 || batch_policy.medium_step == 0 || batch_policy.small_step == 0 {
            return Err(Error::Config("Batch steps must be positive".to_string()));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            openai_api_key: get_env("OPENAI_API_KEY")?,
            openai_base_url: openai_base_url.trim_end_matches('/').to_string(),
            assistant_id: get_env("ASSISTANT_ID")?,
            model_name: get_env_or("MODEL_NAME", DEFAULT_MODEL_NAME),
            poll_interval_ms: get_env_parse_or("POLL_INTERVAL_MS", 5000)?,
            max_run_time_secs: get_env_parse_or("MAX_RUN_TIME_SECS", 300)?,
            max_retries: get_env_parse_or("MAX_RETRIES", 3)?,
            max_in_flight: get_env_parse_or::<usize>("MAX_IN_FLIGHT", 1)?.max(1),
            max_target_count: get_env_parse_or("MAX_TARGET_COUNT", 5000)?,
            job_retention_secs: get_env_parse_or("JOB_RETENTION_SECS", 3600)?,
            batch_policy,
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            run_timeout: Duration::from_secs(self.max_run_time_secs),
            max_consecutive_failures: self.max_retries.max(1),
            max_in_flight: self.max_in_flight,
            batch_policy: self.batch_policy.clone(),
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
