//! Prompt templates for the check-in call: shared persona, per-task instructions,
//! and the per-turn context notes built from call state.

pub mod notes;
pub mod persona;
pub mod tasks;

pub use notes::{emotion_note, language_note, EMOTION_NOTE_TEMPLATE, LANGUAGE_NOTE_TEMPLATE};
pub use persona::{closing_instructions, persona_instructions, CLOSING_PROMPT, PERSONA_TEMPLATE};
pub use tasks::{
    exercise_step_prompt, with_persona, AVAILABILITY_ENTRY, AVAILABILITY_INSTRUCTIONS,
    EXERCISE_ENTRY, EXERCISE_INSTRUCTIONS, EXERCISE_STEP_QUESTION, FEELING_ENTRY,
    FEELING_INSTRUCTIONS, PAIN_ENTRY, PAIN_INSTRUCTIONS, PAIN_RETRY, TOOL_RETRY,
};
