//! Per-call state shared between the annotation workers and the dialog layer.
//!
//! This is the only contract surface between the two subsystems:
//! `detected_language`, `user_emotion_log` and `agent_emotion_log`. Workers append to
//! the logs; the orchestrator drains them once per turn. Drain is a swap under the
//! lock, so an append can never be lost between a read and a clear.

use crate::emotion::Emotion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Which side of the call an audio stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Captured audio from the patient.
    User,
    /// Synthesized audio from the agent.
    Agent,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::User => "user",
            Direction::Agent => "agent",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both emotion logs, taken together at a turn boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub user: Vec<Emotion>,
    pub agent: Vec<Emotion>,
}

/// Fixed-schema state for one call. Share it as `Arc<CallState>`.
#[derive(Debug, Default)]
pub struct CallState {
    detected_language: Mutex<Option<String>>,
    user_emotion_log: Mutex<Vec<Emotion>>,
    agent_emotion_log: Mutex<Vec<Emotion>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CallState {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self, direction: Direction) -> &Mutex<Vec<Emotion>> {
        match direction {
            Direction::User => &self.user_emotion_log,
            Direction::Agent => &self.agent_emotion_log,
        }
    }

    /// Append an accepted label to a direction's log.
    pub fn append_emotion(&self, direction: Direction, label: Emotion) {
        lock(self.log(direction)).push(label);
    }

    /// Take the whole log for a direction, leaving it empty.
    pub fn drain_emotions(&self, direction: Direction) -> Vec<Emotion> {
        std::mem::take(&mut *lock(self.log(direction)))
    }

    /// Drain both logs.
    pub fn drain_all(&self) -> EmotionSnapshot {
        EmotionSnapshot {
            user: self.drain_emotions(Direction::User),
            agent: self.drain_emotions(Direction::Agent),
        }
    }

    /// Number of labels waiting in a direction's log.
    pub fn pending_emotions(&self, direction: Direction) -> usize {
        lock(self.log(direction)).len()
    }

    pub fn set_detected_language(&self, language: impl Into<String>) {
        *lock(&self.detected_language) = Some(language.into());
    }

    /// Last language reported by transcription, if any.
    pub fn detected_language(&self) -> Option<String> {
        lock(&self.detected_language).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn drain_empties_log() {
        let state = CallState::new();
        state.append_emotion(Direction::User, Emotion::Sad);
        state.append_emotion(Direction::User, Emotion::Fear);
        state.append_emotion(Direction::Agent, Emotion::Happy);

        assert_eq!(state.drain_emotions(Direction::User), vec![Emotion::Sad, Emotion::Fear]);
        assert!(state.drain_emotions(Direction::User).is_empty());
        assert_eq!(state.pending_emotions(Direction::Agent), 1);
    }

    #[test]
    fn language_defaults_to_none() {
        let state = CallState::new();
        assert_eq!(state.detected_language(), None);
        state.set_detected_language("es");
        assert_eq!(state.detected_language().as_deref(), Some("es"));
    }

    #[test]
    fn concurrent_append_and_drain_lose_nothing() {
        let state = Arc::new(CallState::new());
        let writer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    state.append_emotion(Direction::User, Emotion::Angry);
                }
            })
        };

        let mut drained = 0;
        while !writer.is_finished() {
            drained += state.drain_emotions(Direction::User).len();
        }
        writer.join().unwrap();
        drained += state.drain_emotions(Direction::User).len();
        assert_eq!(drained, 10_000);
    }
}
