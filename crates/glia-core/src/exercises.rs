//! Exercise checklist for the guidance task.
//!
//! Three exercises in a fixed order. The first one without a recorded response is the
//! one whose explanation is (re)issued; responses may arrive in any order and a repeat
//! overwrites. The session aggregate only exists once all three are recorded.

use crate::error::DialogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// The fixed exercise set, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    AnkleMobility,
    ToeTapping,
    CalfRaises,
}

impl Exercise {
    pub const ORDER: [Exercise; 3] = [Exercise::AnkleMobility, Exercise::ToeTapping, Exercise::CalfRaises];

    /// Name used in prompts and in the `exercise_name` tool argument.
    pub fn name(&self) -> &'static str {
        match self {
            Exercise::AnkleMobility => "Ankle Mobility Stretch",
            Exercise::ToeTapping => "Toe Tapping",
            Exercise::CalfRaises => "Calf Raises",
        }
    }

    /// Parse a display name. Surrounding whitespace and letter case are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ORDER
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }

    /// How the agent explains the exercise to the patient.
    pub fn explanation(&self) -> &'static str {
        match self {
            Exercise::AnkleMobility => {
                "Let's start with an Ankle Mobility Stretch. \
                 Sit comfortably with your foot slightly raised. \
                 Slowly move your ankle in circles, five times clockwise \
                 and five times the other way. \
                 Move gently, and stop if you feel sharp pain."
            }
            Exercise::ToeTapping => {
                "Next is Toe Tapping. \
                 Keep your heel on the ground and lift your toes up and down \
                 slowly, around ten times. \
                 This helps with movement and circulation."
            }
            Exercise::CalfRaises => {
                "Finally, we'll do Calf Raises. \
                 Stand while holding onto a stable surface. \
                 Slowly rise up onto your toes, then lower back down, \
                 about ten times if comfortable. \
                 Move at your own pace and within your comfort."
            }
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the patient said about one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub exercise_name: String,
    pub explained: bool,
    pub patient_response: Option<String>,
    pub practiced_now: Option<bool>,
}

/// All three results, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSessionResults {
    pub ankle_mobility: ExerciseResult,
    pub toe_tapping: ExerciseResult,
    pub calf_raises: ExerciseResult,
}

/// Where the checklist stands after a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistProgress {
    /// This exercise is next and its explanation should be issued.
    Pending(Exercise),
    Complete(ExerciseSessionResults),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseChecklist {
    results: BTreeMap<Exercise, ExerciseResult>,
}

impl ExerciseChecklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// First exercise in canonical order without a result.
    pub fn next_pending(&self) -> Option<Exercise> {
        Exercise::ORDER
            .into_iter()
            .find(|e| !self.results.contains_key(e))
    }

    pub fn recorded(&self) -> usize {
        self.results.len()
    }

    pub fn is_complete(&self) -> bool {
        self.next_pending().is_none()
    }

    /// Insert or overwrite the result for `exercise_name`, then re-evaluate completion.
    pub fn record(
        &mut self,
        exercise_name: &str,
        patient_response: impl Into<String>,
        practiced_now: Option<bool>,
    ) -> Result<ChecklistProgress, DialogError> {
        let exercise = Exercise::from_name(exercise_name)
            .ok_or_else(|| DialogError::UnknownExercise(exercise_name.to_string()))?;

        let previous = self.results.insert(
            exercise,
            ExerciseResult {
                exercise_name: exercise.name().to_string(),
                explained: true,
                patient_response: Some(patient_response.into()),
                practiced_now,
            },
        );
        if previous.is_some() {
            debug!("Exercises: overwrote response for {}", exercise);
        }

        Ok(self.progress())
    }

    /// Pending exercise, or the assembled aggregate once nothing is pending.
    pub fn progress(&self) -> ChecklistProgress {
        if let Some(next) = self.next_pending() {
            return ChecklistProgress::Pending(next);
        }

        match (
            self.results.get(&Exercise::AnkleMobility),
            self.results.get(&Exercise::ToeTapping),
            self.results.get(&Exercise::CalfRaises),
        ) {
            (Some(ankle), Some(toe), Some(calf)) => ChecklistProgress::Complete(ExerciseSessionResults {
                ankle_mobility: ankle.clone(),
                toe_tapping: toe.clone(),
                calf_raises: calf.clone(),
            }),
            _ => unreachable!("no exercise pending but the result set is partial"),
        }
    }
}
