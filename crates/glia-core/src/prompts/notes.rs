//! Per-turn context notes. Added to the generation request for one turn only.

use glia_voice::Emotion;

/// Added when the patient speaks something other than the primary language.
pub const LANGUAGE_NOTE_TEMPLATE: &str = r#"Current language code spoken by the user: {language}

Respectfully mention to the user that you only support {primary_language} extensively."#;

/// Emotion context drained from both logs. Informational only.
pub const EMOTION_NOTE_TEMPLATE: &str = "Context update: the user's emotional tone has been estimated as {user}, \
and the agent's emotion has been estimated as {agent}. \
This is informational only and may help guide an empathetic response.";

fn primary_language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        other => other,
    }
}

pub fn language_note(language: &str, primary_language: &str) -> String {
    LANGUAGE_NOTE_TEMPLATE
        .replace("{language}", language)
        .replace("{primary_language}", primary_language_name(primary_language))
}

/// Render a drained log as `["SAD", "FEAR"]`; an empty log renders as `["NEUTRAL"]`.
fn render_labels(labels: &[Emotion]) -> String {
    if labels.is_empty() {
        return format!("[\"{}\"]", Emotion::Neutral);
    }
    let quoted: Vec<String> = labels.iter().map(|l| format!("\"{}\"", l)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Build the emotion note from the labels drained this turn.
pub fn emotion_note(user: &[Emotion], agent: &[Emotion]) -> String {
    EMOTION_NOTE_TEMPLATE
        .replace("{user}", &render_labels(user))
        .replace("{agent}", &render_labels(agent))
}
