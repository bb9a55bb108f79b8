//! Completion tools offered to the reply generator.
//!
//! Each dialog task advertises a small set of tools. The generator calls one by
//! name with JSON arguments; `ToolCall::parse` turns that into a typed call.

use crate::error::DialogError;
use crate::exercises::Exercise;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const USER_AVAILABLE: &str = "user_available";
pub const USER_NOT_AVAILABLE: &str = "user_not_available";
pub const COMPLETE_FEELING: &str = "complete_feeling";
pub const COMPLETE_PAIN_SCORE: &str = "complete_pain_score";
pub const RECORD_EXERCISE_RESPONSE: &str = "record_exercise_response";

/// Tool advertisement: name, description for the generator, JSON-schema parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    pub fn user_available() -> Self {
        Self::new(
            USER_AVAILABLE,
            "Use this if the user confirms they are available for further information",
            json!({ "type": "object", "properties": {} }),
        )
    }

    pub fn user_not_available() -> Self {
        Self::new(
            USER_NOT_AVAILABLE,
            "Use this if the user is not interested or not available for further information",
            json!({ "type": "object", "properties": {} }),
        )
    }

    pub fn complete_feeling() -> Self {
        Self::new(
            COMPLETE_FEELING,
            "Use this once the user has shared how they are feeling",
            json!({
                "type": "object",
                "properties": { "output": { "type": "string" } },
                "required": ["output"]
            }),
        )
    }

    pub fn complete_pain_score() -> Self {
        Self::new(
            COMPLETE_PAIN_SCORE,
            "Use this once the user has shared their pain score",
            json!({
                "type": "object",
                "properties": { "pain_score": { "type": "integer" } },
                "required": ["pain_score"]
            }),
        )
    }

    pub fn record_exercise_response() -> Self {
        let names: Vec<&str> = Exercise::ORDER.iter().map(|e| e.name()).collect();
        Self::new(
            RECORD_EXERCISE_RESPONSE,
            "Record the patient's response after explaining an exercise",
            json!({
                "type": "object",
                "properties": {
                    "exercise_name": { "type": "string", "enum": names },
                    "patient_response": { "type": "string" },
                    "practiced_now": { "type": "boolean" }
                },
                "required": ["exercise_name", "patient_response"]
            }),
        )
    }
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    UserAvailable,
    UserNotAvailable,
    CompleteFeeling {
        output: String,
    },
    CompletePainScore {
        pain_score: i64,
    },
    RecordExerciseResponse {
        exercise_name: String,
        patient_response: String,
        #[serde(default)]
        practiced_now: Option<bool>,
    },
}

impl ToolCall {
    /// Parse a (name, arguments) pair as delivered by the generator. Argument-less
    /// tools ignore whatever arguments were sent.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, DialogError> {
        let envelope = match name {
            USER_AVAILABLE | USER_NOT_AVAILABLE => json!({ "name": name }),
            COMPLETE_FEELING | COMPLETE_PAIN_SCORE | RECORD_EXERCISE_RESPONSE => {
                json!({ "name": name, "arguments": arguments })
            }
            other => return Err(DialogError::UnknownTool(other.to_string())),
        };
        serde_json::from_value(envelope).map_err(|e| DialogError::MalformedArguments {
            tool: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::UserAvailable => USER_AVAILABLE,
            ToolCall::UserNotAvailable => USER_NOT_AVAILABLE,
            ToolCall::CompleteFeeling { .. } => COMPLETE_FEELING,
            ToolCall::CompletePainScore { .. } => COMPLETE_PAIN_SCORE,
            ToolCall::RecordExerciseResponse { .. } => RECORD_EXERCISE_RESPONSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_tool() {
        assert_eq!(
            ToolCall::parse("user_available", &Value::Null).unwrap(),
            ToolCall::UserAvailable
        );
        assert_eq!(
            ToolCall::parse("complete_feeling", &json!({ "output": "a bit sore" })).unwrap(),
            ToolCall::CompleteFeeling {
                output: "a bit sore".to_string()
            }
        );
        assert_eq!(
            ToolCall::parse("complete_pain_score", &json!({ "pain_score": 4 })).unwrap(),
            ToolCall::CompletePainScore { pain_score: 4 }
        );
        assert_eq!(
            ToolCall::parse(
                "record_exercise_response",
                &json!({ "exercise_name": "Toe Tapping", "patient_response": "will try" })
            )
            .unwrap(),
            ToolCall::RecordExerciseResponse {
                exercise_name: "Toe Tapping".to_string(),
                patient_response: "will try".to_string(),
                practiced_now: None,
            }
        );
    }

    #[test]
    fn missing_argument_is_malformed() {
        let err = ToolCall::parse("complete_pain_score", &json!({ "score": 4 })).unwrap_err();
        assert!(matches!(err, DialogError::MalformedArguments { ref tool, .. } if tool == "complete_pain_score"));
    }

    #[test]
    fn argument_less_tool_ignores_arguments() {
        assert_eq!(
            ToolCall::parse("user_not_available", &json!({ "reason": "busy" })).unwrap(),
            ToolCall::UserNotAvailable
        );
    }

    #[test]
    fn wrongly_typed_argument_is_malformed() {
        let err = ToolCall::parse("complete_pain_score", &json!({ "pain_score": "four" })).unwrap_err();
        assert!(matches!(err, DialogError::MalformedArguments { .. }));
        let err = ToolCall::parse("complete_feeling", &Value::Null).unwrap_err();
        assert!(matches!(err, DialogError::MalformedArguments { ref tool, .. } if tool == "complete_feeling"));
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let err = ToolCall::parse("hang_up", &json!({})).unwrap_err();
        assert_eq!(err, DialogError::UnknownTool("hang_up".to_string()));
    }

    #[test]
    fn exercise_spec_lists_the_fixed_names() {
        let spec = ToolSpec::record_exercise_response();
        let names = &spec.parameters["properties"]["exercise_name"]["enum"];
        assert_eq!(names, &json!(["Ankle Mobility Stretch", "Toe Tapping", "Calf Raises"]));
    }

    #[test]
    fn tool_call_serializes_with_name_and_arguments() {
        let call = ToolCall::CompletePainScore { pain_score: 7 };
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value, json!({ "name": "complete_pain_score", "arguments": { "pain_score": 7 } }));
    }
}
