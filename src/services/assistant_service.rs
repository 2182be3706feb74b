use crate::error::Result;
use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Cancelling,
    RequiresAction,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling | RunStatus::Unknown
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub id: String,
    pub status: RunStatus,
    pub last_error: Option<String>,
}

/// The remote assistant's thread/run API. One thread per batch; a run is the
/// remote job whose status gets polled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_thread(&self) -> Result<String>;
    async fn add_user_message(&self, thread_id: &str, content: &str) -> Result<()>;
    async fn create_run(&self, thread_id: &str) -> Result<RunState>;
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunState>;
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<()>;
    async fn latest_assistant_message(&self, thread_id: &str) -> Result<Option<String>>;
}

#[derive(Clone)]
pub struct OpenAiAssistantClient {
    client: Client,
    api_key: String,
    base_url: String,
    assistant_id: String,
    model: String,
}

#[derive(Deserialize)]
struct IdResp {
    id: String,
}

#[derive(Deserialize)]
struct RunError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct RunResp {
    id: String,
    status: RunStatus,
    last_error: Option<RunError>,
}

impl From<RunResp> for RunState {
    fn from(run: RunResp) -> Self {
        let last_error = run.last_error.map(|e| {
            format!(
                "{}: {}",
                e.code.unwrap_or_else(|| "unknown".to_string()),
                e.message.unwrap_or_default()
            )
        });
        RunState {
            id: run.id,
            status: run.status,
            last_error,
        }
    }
}

#[derive(Deserialize)]
struct TextBody {
    value: String,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextBody>,
}

#[derive(Deserialize)]
struct MessageData {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<MessageData>,
}

impl OpenAiAssistantClient {
    pub fn new(
        client: Client,
        api_key: String,
        base_url: String,
        assistant_id: String,
        model: String,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url,
            assistant_id,
            model,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .timeout(Duration::from_secs(60))
    }

    async fn send<T: serde::de::DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let res = self
            .authed(req)
            .send()
            .await
            .with_context(|| format!("{} request failed", what))?;

        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Assistant API Error {} on {}: {}", status, what, text).into());
        }
        let parsed = serde_json::from_str(&text)
            .with_context(|| format!("{} response parse failed", what))?;
        Ok(parsed)
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistantClient {
    async fn create_thread(&self) -> Result<String> {
        let req = self.client.post(self.url("threads")).json(&serde_json::json!({}));
        let thread: IdResp = self.send(req, "create thread").await?;
        Ok(thread.id)
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let req = self
            .client
            .post(self.url(&format!("threads/{}/messages", thread_id)))
            .json(&serde_json::json!({
                "role": "user",
                "content": content,
            }));
        let _: JsonValue = self.send(req, "add message").await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<RunState> {
        let req = self
            .client
            .post(self.url(&format!("threads/{}/runs", thread_id)))
            .json(&serde_json::json!({
                "assistant_id": self.assistant_id,
                "model": self.model,
            }));
        let run: RunResp = self.send(req, "create run").await?;
        Ok(run.into())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunState> {
        let req = self
            .client
            .get(self.url(&format!("threads/{}/runs/{}", thread_id, run_id)));
        let run: RunResp = self.send(req, "retrieve run").await?;
        Ok(run.into())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        let req = self
            .client
            .post(self.url(&format!("threads/{}/runs/{}/cancel", thread_id, run_id)));
        let _: JsonValue = self.send(req, "cancel run").await?;
        Ok(())
    }

    async fn latest_assistant_message(&self, thread_id: &str) -> Result<Option<String>> {
        let req = self
            .client
            .get(self.url(&format!("threads/{}/messages", thread_id)))
            .query(&[("order", "desc"), ("limit", "20")]);
        let list: MessageList = self.send(req, "list messages").await?;

        let text = list
            .data
            .into_iter()
            .find(|m| m.role == "assistant")
            .map(|m| {
                m.content
                    .into_iter()
                    .filter(|part| part.kind == "text")
                    .filter_map(|part| part.text.map(|t| t.value))
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        Ok(text)
    }
}
