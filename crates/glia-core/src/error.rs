//! Error types for the dialog layer and the call as a whole.

use glia_voice::VoiceError;
use thiserror::Error;

/// Result type alias for call-level operations.
pub type CallResult<T> = Result<T, CallError>;

/// A tool call the current task could not accept. None of these end the call:
/// the task stays active and the orchestrator re-prompts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("tool '{tool}' is not offered by task {task}")]
    ToolNotOffered { tool: String, task: &'static str },

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("unknown exercise '{0}'")]
    UnknownExercise(String),

    #[error("pain score {score} outside {min}..={max}")]
    PainScoreOutOfRange { score: i64, min: i64, max: i64 },

    #[error("malformed arguments for '{tool}': {reason}")]
    MalformedArguments { tool: String, reason: String },

    #[error("task {0} has not been entered")]
    TaskNotEntered(&'static str),

    #[error("dialog already complete")]
    DialogComplete,
}

/// Errors that end or prevent a call.
#[derive(Error, Debug)]
pub enum CallError {
    #[error("Reply generation failed: {0}")]
    Generation(String),

    #[error("Transcript stream closed before the dialog completed")]
    TranscriptClosed,

    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),

    #[error("Voice error: {0}")]
    Voice(#[from] VoiceError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
