//! Task instructions and entry prompts, one pair per dialog task.
//!
//! Instructions stay attached to every turn of the task; the entry prompt is the
//! one-off request for the task's opening utterance.

use super::persona::persona_instructions;

/// Availability check: pitch who we are and why we called, then confirm availability.
pub const AVAILABILITY_INSTRUCTIONS: &str = r#"Pitch an introduction of who you are and tell the patient why you called, using the information below.

The patient had ankle surgery after a fall from a horse while playing polo and is enrolled in a
home program for recovery.

Get confirmation of the patient's availability before moving further."#;

pub const AVAILABILITY_ENTRY: &str =
    "Introduce yourself and explain why you called the patient, mentioning your name";

pub const FEELING_INSTRUCTIONS: &str = "Ask about how the patient is feeling after surgery.";

pub const FEELING_ENTRY: &str = "Ask about how the patient is feeling after surgery";

/// Pain assessment, with the interpretation bands used to shape the acknowledgement.
pub const PAIN_INSTRUCTIONS: &str = r#"You must ask the patient to rate their pain on a scale from 1 to 10, where:
1 = very mild pain
10 = the worst pain imaginable.

Ask the question clearly and politely:
"On a scale from 1 to 10, where 1 means very mild pain and 10 means the worst pain you can imagine, what is your pain level right now?"

Wait for the patient's response.

When the patient gives a number:
- Acknowledge it empathetically
- Briefly reflect the meaning of the score
- Complete the query

Interpretation guidelines:
1-3  = mild pain: reassure calmly
4-6  = moderate pain: acknowledge discomfort
7-10 = severe pain: express concern and suggest monitoring or contacting a clinician if needed (without giving clinical advice)

Stay supportive, respectful, and calm at all times. Once the patient has shared the pain score, move to the next task."#;

pub const PAIN_ENTRY: &str = "Ask the patient to rate their pain score";

/// Issued when a reported score falls outside the accepted range.
pub const PAIN_RETRY: &str = "The pain score you recorded is outside the scale. \
Gently ask the patient again for a whole number from {min} to {max}.";

pub const EXERCISE_INSTRUCTIONS: &str = "Guide the patient through three ankle-recovery exercises, \
one at a time, using a calm and supportive tone. \
After explaining each exercise, ask: \
'Would you like to take a moment to go through the steps for \
[exercise name] now? I can pause the call for up to one minute.' \
Wait for their response before moving to the next exercise.";

/// Transition into the exercise block, issued once before the first explanation.
pub const EXERCISE_ENTRY: &str = "Explain that you will now guide them through a few simple \
ankle-recovery exercises to support their healing. \
Stay warm, calm, and encouraging.";

/// Appended to each exercise explanation. `{exercise}` is the display name.
pub const EXERCISE_STEP_QUESTION: &str = "Would you like to take a moment to go through the steps for \
{exercise} now? I can pause the call for up to one minute.";

/// Issued after a rejected tool call, before the task's usual prompt is repeated.
pub const TOOL_RETRY: &str = "The previous action could not be recorded ({reason}). \
Continue the current step with the patient.";

/// Prefix a task's instructions with the shared persona.
pub fn with_persona(agent_name: &str, instructions: &str) -> String {
    format!("{}\n\n{}", persona_instructions(agent_name), instructions)
}

/// Explanation for one exercise followed by the practice question.
pub fn exercise_step_prompt(exercise_name: &str, explanation: &str) -> String {
    format!(
        "{} {}",
        explanation,
        EXERCISE_STEP_QUESTION.replace("{exercise}", exercise_name)
    )
}
