//! **Conversation orchestrator**: ties the annotation workers, call state and dialog
//! machine to the external generator and transcript stream.
//!
//! Audio: inbound frames go to the user worker, synthesized frames to the agent
//! worker; both are forwarded untouched. Turns: every generation request carries the
//! current task's instructions, an optional language note and the emotion note built
//! from the logs drained at that moment.

use crate::config::GliaConfig;
use crate::dialog::{DialogEvent, DialogMachine, DialogRecord, Transition};
use crate::error::{CallError, CallResult, DialogError};
use crate::exercises::ExerciseSessionResults;
use crate::prompts;
use crate::services::{RawToolCall, ReplyGenerator, ReplyRequest, TranscriptEvent, TranscriptSource};
use crate::tools::ToolCall;
use chrono::{DateTime, Utc};
use futures::Stream;
use glia_voice::{create_emotion_model, CallState, Direction, EmotionModel, EmotionWorker};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rejected tool calls within one patient turn that still earn a re-prompt. Past
/// this, pending re-prompts are dropped; entry and step prompts are still generated.
pub const MAX_REPROMPTS_PER_TURN: usize = 3;

/// Everything the call collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub available: bool,
    pub feeling: Option<String>,
    pub pain_score: Option<i64>,
    pub exercises: Option<ExerciseSessionResults>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl CallOutcome {
    fn from_record(record: &DialogRecord, started_at: DateTime<Utc>) -> Self {
        Self {
            available: record.available.unwrap_or(false),
            feeling: record.feeling.clone(),
            pain_score: record.pain_score,
            exercises: record.exercises.clone(),
            started_at,
            ended_at: Utc::now(),
        }
    }
}

/// Why a turn was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnKind {
    Patient,
    Prompt,
    Retry,
}

/// One pending generation, bound to the task that queued it.
struct Turn {
    task: &'static str,
    kind: TurnKind,
    user_text: Option<String>,
    prompt: Option<String>,
}

impl Turn {
    fn patient(task: &'static str, text: String) -> Self {
        Self {
            task,
            kind: TurnKind::Patient,
            user_text: Some(text),
            prompt: None,
        }
    }

    fn prompt(task: &'static str, kind: TurnKind, prompt: String) -> Self {
        Self {
            task,
            kind,
            user_text: None,
            prompt: Some(prompt),
        }
    }
}

pub struct ConversationOrchestrator<G: ReplyGenerator> {
    config: GliaConfig,
    state: Arc<CallState>,
    user_worker: Arc<EmotionWorker>,
    agent_worker: Arc<EmotionWorker>,
    generator: G,
    machine: DialogMachine,
}

impl<G: ReplyGenerator> ConversationOrchestrator<G> {
    /// Start both annotation workers with the configured model backend.
    pub fn new(config: GliaConfig, generator: G) -> CallResult<Self> {
        let user_model = create_emotion_model(&config.model)?;
        let agent_model = create_emotion_model(&config.model)?;
        Self::with_models(config, generator, user_model, agent_model)
    }

    /// Start both annotation workers with explicit models.
    pub fn with_models(
        config: GliaConfig,
        generator: G,
        user_model: Box<dyn EmotionModel>,
        agent_model: Box<dyn EmotionModel>,
    ) -> CallResult<Self> {
        config.validate()?;
        let state = Arc::new(CallState::new());
        let user_worker = Arc::new(EmotionWorker::spawn(
            Direction::User,
            &config.audio,
            user_model,
            Arc::clone(&state),
        )?);
        let agent_worker = Arc::new(EmotionWorker::spawn(
            Direction::Agent,
            &config.audio,
            agent_model,
            Arc::clone(&state),
        )?);
        let machine = DialogMachine::new(config.dialog.clone());

        Ok(Self {
            config,
            state,
            user_worker,
            agent_worker,
            generator,
            machine,
        })
    }

    pub fn state(&self) -> Arc<CallState> {
        Arc::clone(&self.state)
    }

    pub fn user_worker(&self) -> Arc<EmotionWorker> {
        Arc::clone(&self.user_worker)
    }

    pub fn agent_worker(&self) -> Arc<EmotionWorker> {
        Arc::clone(&self.agent_worker)
    }

    pub fn dialog(&self) -> &DialogMachine {
        &self.machine
    }

    /// Inbound patient audio on its way to transcription.
    pub fn forward_inbound<'a>(&self, frame: &'a [i16]) -> &'a [i16] {
        self.user_worker.process_pcm(frame)
    }

    /// Synthesized agent audio on its way to playback.
    pub fn forward_outbound<'a>(&self, frame: &'a [i16]) -> &'a [i16] {
        self.agent_worker.process_pcm(frame)
    }

    /// Wrap the inbound frame stream feeding transcription.
    pub fn tap_inbound<S, F>(&self, frames: S) -> impl Stream<Item = F>
    where
        S: Stream<Item = F>,
        F: AsRef<[i16]>,
    {
        glia_voice::tap_stream(self.user_worker(), frames)
    }

    /// Wrap the synthesized frame stream feeding playback.
    pub fn tap_outbound<S, F>(&self, frames: S) -> impl Stream<Item = F>
    where
        S: Stream<Item = F>,
        F: AsRef<[i16]>,
    {
        glia_voice::tap_stream(self.agent_worker(), frames)
    }

    /// Record the language of an interim or final transcript, when it carries one.
    pub fn observe_transcript(&self, event: &TranscriptEvent) {
        let Some(language) = event.language.as_deref() else {
            return;
        };
        if self.state.detected_language().as_deref() != Some(language) {
            info!("Orchestrator: detected language {}", language);
            self.state.set_detected_language(language);
        }
    }

    fn is_primary_language(&self, language: &str) -> bool {
        let primary = &self.config.dialog.primary_language;
        let base = language.split(|c: char| c == '-' || c == '_').next().unwrap_or(language);
        base.eq_ignore_ascii_case(primary)
    }

    /// Notes for the next generation. Drains both emotion logs.
    pub fn turn_context_notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(language) = self.state.detected_language() {
            if !self.is_primary_language(&language) {
                notes.push(prompts::language_note(
                    &language,
                    &self.config.dialog.primary_language,
                ));
            }
        }

        let drained = self.state.drain_all();
        debug!(
            "Orchestrator: drained {} user / {} agent emotion labels",
            drained.user.len(),
            drained.agent.len()
        );
        notes.push(prompts::emotion_note(&drained.user, &drained.agent));
        notes
    }

    async fn generate(&self, turn: Turn) -> CallResult<Vec<RawToolCall>> {
        let request = ReplyRequest {
            instructions: self.machine.instructions(),
            prompt: turn.prompt,
            context_notes: self.turn_context_notes(),
            user_text: turn.user_text,
            tools: self.machine.tools(),
            allow_interruptions: true,
        };
        let reply = self.generator.generate_reply(request).await?;
        debug!(
            "Orchestrator: reply ({} chars, {} tool calls)",
            reply.text.len(),
            reply.tool_calls.len()
        );
        Ok(reply.tool_calls)
    }

    /// Parse and apply one tool call. When it completed a task, the returned prompts
    /// are the next task's entry prompts.
    fn apply_tool_call(&mut self, raw: &RawToolCall) -> Result<Transition, DialogError> {
        let call = ToolCall::parse(&raw.name, &raw.arguments)?;
        info!("Orchestrator: tool call {}", call.name());

        let mut transition = self.machine.advance(DialogEvent::Tool(call))?;
        if transition.completed.is_some() && !self.machine.is_complete() {
            let entry = self.machine.advance(DialogEvent::Enter)?;
            transition.prompts.extend(entry.prompts);
        }
        Ok(transition)
    }

    fn queue_prompts(&self, queue: &mut VecDeque<Turn>, kind: TurnKind, prompts: Vec<String>) {
        let task = self.machine.task().name();
        queue.extend(prompts.into_iter().map(|p| Turn::prompt(task, kind, p)));
    }

    /// Generate `turns` and every prompt that follows from their tool calls.
    ///
    /// A tool call that completes the current task ends that reply: later calls in
    /// the same reply are ignored. Turns queued for a task that is no longer current
    /// are dropped.
    async fn run_turns(&mut self, turns: Vec<Turn>) -> CallResult<()> {
        let mut queue = VecDeque::from(turns);
        let mut rejections = 0;

        while let Some(turn) = queue.pop_front() {
            if self.machine.is_complete() {
                break;
            }
            if turn.task != self.machine.task().name() {
                debug!(
                    "Orchestrator: dropping {:?} turn queued for {}",
                    turn.kind, turn.task
                );
                continue;
            }
            let tool_calls = self.generate(turn).await?;

            for (i, raw) in tool_calls.iter().enumerate() {
                match self.apply_tool_call(raw) {
                    Ok(transition) => {
                        let completed = transition.completed.is_some();
                        self.queue_prompts(&mut queue, TurnKind::Prompt, transition.prompts);
                        if completed {
                            let ignored = tool_calls.len() - i - 1;
                            if ignored > 0 {
                                debug!(
                                    "Orchestrator: {} ended the task, ignoring {} later tool calls",
                                    raw.name, ignored
                                );
                            }
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Orchestrator: rejected tool call {} in {}: {}",
                            raw.name,
                            self.machine.task().name(),
                            e
                        );
                        rejections += 1;
                        if rejections > MAX_REPROMPTS_PER_TURN {
                            if rejections == MAX_REPROMPTS_PER_TURN + 1 {
                                warn!("Orchestrator: too many rejected tool calls, no more re-prompts this turn");
                            }
                            queue.retain(|t| t.kind != TurnKind::Retry);
                            continue;
                        }
                        let prompts = self.machine.reprompt(&e);
                        self.queue_prompts(&mut queue, TurnKind::Retry, prompts);
                    }
                }
            }
        }
        Ok(())
    }

    /// Run the whole call: availability, then (if accepted) feeling, pain and
    /// exercises, then the closing utterance. A refusal ends the call without one.
    pub async fn run<T: TranscriptSource>(&mut self, transcripts: &mut T) -> CallResult<CallOutcome> {
        let started_at = Utc::now();
        info!("Orchestrator: call started");

        let entry = self.machine.advance(DialogEvent::Enter)?;
        let task = self.machine.task().name();
        let turns = entry
            .prompts
            .into_iter()
            .map(|p| Turn::prompt(task, TurnKind::Prompt, p))
            .collect();
        self.run_turns(turns).await?;

        while !self.machine.is_complete() {
            let event = transcripts
                .next_event()
                .await
                .ok_or(CallError::TranscriptClosed)?;
            self.observe_transcript(&event);
            if !event.is_final || event.text.trim().is_empty() {
                continue;
            }
            let task = self.machine.task().name();
            self.run_turns(vec![Turn::patient(task, event.text)]).await?;
        }

        if self.machine.record().available == Some(true) {
            self.close().await?;
        } else {
            info!("Orchestrator: patient not available, no closing turn");
        }

        let outcome = CallOutcome::from_record(self.machine.record(), started_at);
        info!(
            "Orchestrator: call finished (available: {}, pain score: {:?})",
            outcome.available, outcome.pain_score
        );
        Ok(outcome)
    }

    async fn close(&self) -> CallResult<()> {
        let request = ReplyRequest {
            instructions: prompts::closing_instructions(&self.config.dialog.agent_name),
            prompt: Some(prompts::CLOSING_PROMPT.to_string()),
            context_notes: self.turn_context_notes(),
            user_text: None,
            tools: Vec::new(),
            allow_interruptions: false,
        };
        self.generator.generate_reply(request).await?;
        Ok(())
    }

    /// Stop both annotation workers. Safe to call more than once.
    pub fn shutdown(&self) {
        self.user_worker.stop();
        self.agent_worker.stop();
    }
}
