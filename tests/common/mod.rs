#![allow(dead_code)]

use async_trait::async_trait;
use queai_backend::error::{Error, Result};
use queai_backend::models::record::header_line;
use queai_backend::services::assistant_service::{AssistantApi, RunState, RunStatus};
use queai_backend::utils::csv_line::join_row;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What a scripted thread answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Fresh, unique rows: as many as the prompt asked for, plus `extra`.
    Echo { extra: usize },
    /// A fixed payload.
    Text(String),
    /// The run ends in `failed`.
    Fail(String),
    /// The run never leaves `in_progress` until cancelled.
    Hang,
    /// Transport error while polling.
    Unreachable,
}

struct Thread {
    reply: Reply,
    requested: usize,
    cancelled: bool,
}

/// In-memory assistant that plays back one reply per thread.
pub struct ScriptedAssistant {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    threads: Mutex<HashMap<String, Thread>>,
    next_thread: AtomicUsize,
    next_row: AtomicUsize,
    pub cancels: AtomicUsize,
    pub requested: Mutex<Vec<usize>>,
}

impl ScriptedAssistant {
    pub fn new(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            threads: Mutex::new(HashMap::new()),
            next_thread: AtomicUsize::new(0),
            next_row: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: Reply) -> Self {
        Self::new(Vec::new(), reply)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn requested_sizes(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }

    fn fresh_rows(&self, n: usize) -> String {
        let rows: Vec<String> = (0..n)
            .map(|_| {
                let i = self.next_row.fetch_add(1, Ordering::SeqCst);
                row(&format!("Question {}?", i), &format!("प्रश्न {}?", i))
            })
            .collect();
        payload(&rows)
    }
}

fn requested_count(prompt: &str) -> usize {
    prompt
        .strip_prefix("Generate exactly ")
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl AssistantApi for ScriptedAssistant {
    async fn create_thread(&self) -> Result<String> {
        let id = format!("thread_{}", self.next_thread.fetch_add(1, Ordering::SeqCst));
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        self.threads.lock().unwrap().insert(
            id.clone(),
            Thread {
                reply,
                requested: 0,
                cancelled: false,
            },
        );
        Ok(id)
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let count = requested_count(content);
        self.requested.lock().unwrap().push(count);
        if let Some(thread) = self.threads.lock().unwrap().get_mut(thread_id) {
            thread.requested = count;
        }
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<RunState> {
        Ok(RunState {
            id: format!("run_{}", thread_id),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<RunState> {
        let threads = self.threads.lock().unwrap();
        let thread = threads
            .get(thread_id)
            .ok_or_else(|| Error::NotFound(thread_id.to_string()))?;
        let (status, last_error) = match &thread.reply {
            Reply::Echo { .. } | Reply::Text(_) => (RunStatus::Completed, None),
            Reply::Fail(message) => (RunStatus::Failed, Some(message.clone())),
            Reply::Hang if thread.cancelled => (RunStatus::Cancelled, None),
            Reply::Hang => (RunStatus::InProgress, None),
            Reply::Unreachable => {
                return Err(Error::Internal("connection reset".to_string()));
            }
        };
        Ok(RunState {
            id: run_id.to_string(),
            status,
            last_error,
        })
    }

    async fn cancel_run(&self, thread_id: &str, _run_id: &str) -> Result<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if let Some(thread) = self.threads.lock().unwrap().get_mut(thread_id) {
            thread.cancelled = true;
        }
        Ok(())
    }

    async fn latest_assistant_message(&self, thread_id: &str) -> Result<Option<String>> {
        let (reply, requested) = {
            let threads = self.threads.lock().unwrap();
            match threads.get(thread_id) {
                Some(thread) => (thread.reply.clone(), thread.requested),
                None => return Ok(None),
            }
        };
        Ok(match reply {
            Reply::Echo { extra } => Some(self.fresh_rows(requested + extra)),
            Reply::Text(text) => Some(text),
            _ => None,
        })
    }
}

/// A fully populated bilingual row in wire order.
pub fn row(english: &str, hindi: &str) -> String {
    join_row(
        [
            "Polity",
            "Constitution",
            "Fundamental Rights",
            "MCQ",
            english,
            hindi,
            "Article 14",
            "Article 17",
            "Article 19",
            "Article 21",
            "अनुच्छेद 14",
            "अनुच्छेद 17",
            "अनुच्छेद 19",
            "अनुच्छेद 21",
            "Article 17",
            "अनुच्छेद 17",
            "Article 17 abolishes untouchability, and the others do not.",
            "अनुच्छेद 17 अस्पृश्यता का उन्मूलन करता है।",
            "Medium",
            "Both",
            "BB-Indian Polity.pdf",
            "88",
            "12",
            "2019",
        ],
        ',',
    )
}

/// Header plus rows, fenced the way the assistant tends to answer.
pub fn payload(rows: &[String]) -> String {
    format!("```csv\n{}\n{}\n```", header_line(), rows.join("\n"))
}
