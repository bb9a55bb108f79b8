//! # Glia Core - Post-operative Check-in Call
//!
//! Runs the structured dialog of an automated check-in call and feeds the emotion
//! estimates from `glia-voice` into every generated turn.
//!
//! - `dialog`: task pipeline (availability, feeling, pain, exercises) as one enum
//!   with an `advance(event)` transition function
//! - `exercises`: the three-item checklist inside the exercise task
//! - `orchestrator`: taps both audio directions, injects language and emotion notes,
//!   sequences the tasks and closes the call
//! - `services`: the reply generator and transcript source the call depends on

pub mod config;
pub mod dialog;
pub mod error;
pub mod exercises;
pub mod orchestrator;
pub mod prompts;
pub mod services;
pub mod tools;

pub use config::{DialogConfig, GliaConfig, DEFAULT_CONFIG_PATH};
pub use dialog::{DialogEvent, DialogMachine, DialogRecord, DialogTask, TaskResult, Transition};
pub use error::{CallError, CallResult, DialogError};
pub use exercises::{ChecklistProgress, Exercise, ExerciseChecklist, ExerciseResult, ExerciseSessionResults};
pub use orchestrator::{CallOutcome, ConversationOrchestrator, MAX_REPROMPTS_PER_TURN};
pub use services::{RawToolCall, Reply, ReplyGenerator, ReplyRequest, TranscriptEvent, TranscriptSource};
pub use tools::{ToolCall, ToolSpec};
