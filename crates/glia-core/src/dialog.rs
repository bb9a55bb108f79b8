//! **Dialog task state machine**
//!
//! ```text
//! AwaitAvailability ──available──→ AskFeeling → AssessPain → GuideExercises → Completed
//!        └──────────not available──────────────────────────────────────────────↗
//! ```
//!
//! Strictly forward, no skipping. Each task is entered once (one entry prompt) and
//! completes through one of its tools; tools are refused until the task is entered. `advance` is the only transition function.

use crate::config::DialogConfig;
use crate::error::DialogError;
use crate::exercises::{ChecklistProgress, Exercise, ExerciseChecklist, ExerciseSessionResults};
use crate::prompts::{self, tasks};
use crate::tools::{ToolCall, ToolSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Pipeline stage. Only `GuideExercises` carries inner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogTask {
    AwaitAvailability,
    AskFeeling,
    AssessPain,
    GuideExercises(ExerciseChecklist),
    Completed,
}

impl DialogTask {
    pub fn name(&self) -> &'static str {
        match self {
            DialogTask::AwaitAvailability => "AwaitAvailability",
            DialogTask::AskFeeling => "AskFeeling",
            DialogTask::AssessPain => "AssessPain",
            DialogTask::GuideExercises(_) => "GuideExercises",
            DialogTask::Completed => "Completed",
        }
    }

    /// Task-specific instructions, without the persona.
    pub fn instructions(&self) -> &'static str {
        match self {
            DialogTask::AwaitAvailability => tasks::AVAILABILITY_INSTRUCTIONS,
            DialogTask::AskFeeling => tasks::FEELING_INSTRUCTIONS,
            DialogTask::AssessPain => tasks::PAIN_INSTRUCTIONS,
            DialogTask::GuideExercises(_) => tasks::EXERCISE_INSTRUCTIONS,
            DialogTask::Completed => "",
        }
    }

    /// Completion tools this task offers.
    pub fn tools(&self) -> Vec<ToolSpec> {
        match self {
            DialogTask::AwaitAvailability => {
                vec![ToolSpec::user_available(), ToolSpec::user_not_available()]
            }
            DialogTask::AskFeeling => vec![ToolSpec::complete_feeling()],
            DialogTask::AssessPain => vec![ToolSpec::complete_pain_score()],
            DialogTask::GuideExercises(_) => vec![ToolSpec::record_exercise_response()],
            DialogTask::Completed => Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DialogTask::Completed)
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    /// Enter the current task (issue its opening prompt). Only the first Enter per task
    /// produces prompts.
    Enter,
    Tool(ToolCall),
}

/// Typed result a task completes with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskResult {
    Availability(bool),
    Feeling(String),
    PainScore(i64),
    Exercises(ExerciseSessionResults),
}

/// What the orchestrator should do after an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    /// Prompts to generate, in order.
    pub prompts: Vec<String>,
    /// Set when the event completed the task that was current.
    pub completed: Option<TaskResult>,
}

/// Values collected from completed tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogRecord {
    pub available: Option<bool>,
    pub feeling: Option<String>,
    pub pain_score: Option<i64>,
    pub exercises: Option<ExerciseSessionResults>,
}

/// Drives one call's task pipeline.
#[derive(Debug, Clone)]
pub struct DialogMachine {
    config: DialogConfig,
    task: DialogTask,
    entered: bool,
    record: DialogRecord,
    entered_tasks: Vec<&'static str>,
}

impl DialogMachine {
    pub fn new(config: DialogConfig) -> Self {
        Self {
            config,
            task: DialogTask::AwaitAvailability,
            entered: false,
            record: DialogRecord::default(),
            entered_tasks: Vec::new(),
        }
    }

    pub fn task(&self) -> &DialogTask {
        &self.task
    }

    pub fn is_complete(&self) -> bool {
        self.task.is_completed()
    }

    pub fn record(&self) -> &DialogRecord {
        &self.record
    }

    /// Names of tasks entered so far, in order.
    pub fn entered_tasks(&self) -> &[&'static str] {
        &self.entered_tasks
    }

    /// Persona plus the current task's instructions.
    pub fn instructions(&self) -> String {
        prompts::with_persona(&self.config.agent_name, self.task.instructions())
    }

    pub fn tools(&self) -> Vec<ToolSpec> {
        self.task.tools()
    }

    pub fn advance(&mut self, event: DialogEvent) -> Result<Transition, DialogError> {
        if self.task.is_completed() {
            return Err(DialogError::DialogComplete);
        }
        match event {
            DialogEvent::Enter => Ok(self.enter()),
            DialogEvent::Tool(call) => self.apply(call),
        }
    }

    fn enter(&mut self) -> Transition {
        if self.entered {
            return Transition::default();
        }
        self.entered = true;
        self.entered_tasks.push(self.task.name());
        info!("Dialog: entering {}", self.task.name());

        let prompts = match &self.task {
            DialogTask::AwaitAvailability => vec![tasks::AVAILABILITY_ENTRY.to_string()],
            DialogTask::AskFeeling => vec![tasks::FEELING_ENTRY.to_string()],
            DialogTask::AssessPain => vec![tasks::PAIN_ENTRY.to_string()],
            DialogTask::GuideExercises(checklist) => {
                let mut prompts = vec![tasks::EXERCISE_ENTRY.to_string()];
                prompts.extend(checklist.next_pending().map(step_prompt));
                prompts
            }
            DialogTask::Completed => Vec::new(),
        };

        Transition {
            prompts,
            completed: None,
        }
    }

    fn apply(&mut self, call: ToolCall) -> Result<Transition, DialogError> {
        if !self.entered {
            return Err(DialogError::TaskNotEntered(self.task.name()));
        }
        debug!("Dialog: {} received tool {}", self.task.name(), call.name());

        let (next, result) = match (&mut self.task, call) {
            (DialogTask::AwaitAvailability, ToolCall::UserAvailable) => {
                (DialogTask::AskFeeling, TaskResult::Availability(true))
            }
            (DialogTask::AwaitAvailability, ToolCall::UserNotAvailable) => {
                (DialogTask::Completed, TaskResult::Availability(false))
            }
            (DialogTask::AskFeeling, ToolCall::CompleteFeeling { output }) => {
                (DialogTask::AssessPain, TaskResult::Feeling(output))
            }
            (DialogTask::AssessPain, ToolCall::CompletePainScore { pain_score }) => {
                check_pain_score(&self.config, pain_score)?;
                (
                    DialogTask::GuideExercises(ExerciseChecklist::new()),
                    TaskResult::PainScore(pain_score),
                )
            }
            (
                DialogTask::GuideExercises(checklist),
                ToolCall::RecordExerciseResponse {
                    exercise_name,
                    patient_response,
                    practiced_now,
                },
            ) => match checklist.record(&exercise_name, patient_response, practiced_now)? {
                ChecklistProgress::Pending(next) => {
                    return Ok(Transition {
                        prompts: vec![step_prompt(next)],
                        completed: None,
                    });
                }
                ChecklistProgress::Complete(results) => {
                    (DialogTask::Completed, TaskResult::Exercises(results))
                }
            },
            (task, call) => {
                return Err(DialogError::ToolNotOffered {
                    tool: call.name().to_string(),
                    task: task.name(),
                });
            }
        };

        Ok(self.complete(next, result))
    }

    fn complete(&mut self, next: DialogTask, result: TaskResult) -> Transition {
        info!("Dialog: {} completed, next {}", self.task.name(), next.name());
        match &result {
            TaskResult::Availability(available) => self.record.available = Some(*available),
            TaskResult::Feeling(feeling) => self.record.feeling = Some(feeling.clone()),
            TaskResult::PainScore(score) => self.record.pain_score = Some(*score),
            TaskResult::Exercises(results) => self.record.exercises = Some(results.clone()),
        }
        self.task = next;
        self.entered = false;
        Transition {
            prompts: Vec::new(),
            completed: Some(result),
        }
    }

    /// Prompts to issue after a rejected tool call. The task stays current.
    pub fn reprompt(&self, error: &DialogError) -> Vec<String> {
        let mut prompts = vec![tasks::TOOL_RETRY.replace("{reason}", &error.to_string())];
        match (&self.task, error) {
            (DialogTask::AssessPain, DialogError::PainScoreOutOfRange { min, max, .. }) => {
                prompts.push(
                    tasks::PAIN_RETRY
                        .replace("{min}", &min.to_string())
                        .replace("{max}", &max.to_string()),
                );
            }
            (DialogTask::GuideExercises(checklist), _) => {
                prompts.extend(checklist.next_pending().map(step_prompt));
            }
            _ => {}
        }
        prompts
    }
}

fn check_pain_score(config: &DialogConfig, score: i64) -> Result<(), DialogError> {
    let (min, max) = (config.pain_score_min, config.pain_score_max);
    if config.strict_pain_score && !(min..=max).contains(&score) {
        return Err(DialogError::PainScoreOutOfRange { score, min, max });
    }
    Ok(())
}

fn step_prompt(exercise: Exercise) -> String {
    tasks::exercise_step_prompt(exercise.name(), exercise.explanation())
}
