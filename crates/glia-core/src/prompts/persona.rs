//! Agent persona shared by every task, and the call closing.

/// Persona prepended to every task's instructions. `{agent_name}` is replaced from config.
pub const PERSONA_TEMPLATE: &str = r#"You are a Medical Agent named {agent_name}.
You should be empathetic and always respond in English,
even if the patient speaks in a different language."#;

/// Final utterance of the call. Generated with interruptions disabled.
pub const CLOSING_PROMPT: &str =
    "Provide a closing statement in English and inform them you are going to close this call";

/// Build the persona block for the configured agent name.
pub fn persona_instructions(agent_name: &str) -> String {
    PERSONA_TEMPLATE.replace("{agent_name}", agent_name)
}

/// Closing turn instructions: persona followed by the closing prompt.
pub fn closing_instructions(agent_name: &str) -> String {
    format!("{}\n\n{}", persona_instructions(agent_name), CLOSING_PROMPT)
}
