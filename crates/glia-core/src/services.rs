//! External collaborators the call depends on, by the interface it needs.
//!
//! - `ReplyGenerator`: "given text instructions, produce a spoken reply" (language
//!   model plus speech synthesis).
//! - `TranscriptSource`: "given audio, produce a transcript event stream".

use crate::error::CallResult;
use crate::tools::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// One generation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRequest {
    /// Persona plus the current task's instructions.
    pub instructions: String,
    /// One-off instruction for this turn (entry prompt, exercise step, re-prompt).
    pub prompt: Option<String>,
    /// Per-turn context: language note, emotion note.
    pub context_notes: Vec<String>,
    /// Final transcript the reply answers, if the turn was triggered by the patient.
    pub user_text: Option<String>,
    pub tools: Vec<ToolSpec>,
    pub allow_interruptions: bool,
}

/// A tool call as the generator emits it, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl RawToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// What was spoken.
    pub text: String,
    #[serde(default)]
    pub tool_calls: Vec<RawToolCall>,
}

/// Produces (and speaks) the agent's reply for a turn.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(&self, request: ReplyRequest) -> CallResult<Reply>;
}

/// One transcription update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub text: String,
    /// Language code reported by transcription, when it reports one.
    #[serde(default)]
    pub language: Option<String>,
    /// Interim events carry language only; finals end a patient turn.
    pub is_final: bool,
}

impl TranscriptEvent {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            is_final: true,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Stream of transcript events for the patient's side of the call.
#[async_trait]
pub trait TranscriptSource: Send {
    /// Next event, or `None` once the stream has ended.
    async fn next_event(&mut self) -> Option<TranscriptEvent>;
}

#[async_trait]
impl TranscriptSource for mpsc::Receiver<TranscriptEvent> {
    async fn next_event(&mut self) -> Option<TranscriptEvent> {
        self.recv().await
    }
}
