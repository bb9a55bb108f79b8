//! Emotion label set and per-window classification results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotion classes in the fixed order of the model's output logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Emotion {
    Neutral,
    Angry,
    Sad,
    Fear,
    Happy,
    Disgust,
}

impl Emotion {
    /// All labels, indexed like the model's logits.
    pub const ALL: [Emotion; 6] = [
        Emotion::Neutral,
        Emotion::Angry,
        Emotion::Sad,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Disgust,
    ];

    /// Number of classes the model must produce logits for.
    pub const COUNT: usize = Self::ALL.len();

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "NEUTRAL",
            Emotion::Angry => "ANGRY",
            Emotion::Sad => "SAD",
            Emotion::Fear => "FEAR",
            Emotion::Happy => "HAPPY",
            Emotion::Disgust => "DISGUST",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification per window. Never mutated once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Centre of the window, in seconds from stream start
    pub timestamp_sec: f64,
    pub label: Emotion,
    /// Softmax probability of `label`, in [0, 1]
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_order_matches_model_output() {
        assert_eq!(Emotion::from_index(0), Some(Emotion::Neutral));
        assert_eq!(Emotion::from_index(4), Some(Emotion::Happy));
        assert_eq!(Emotion::from_index(5), Some(Emotion::Disgust));
        assert_eq!(Emotion::from_index(6), None);
        assert_eq!(Emotion::COUNT, 6);
    }

    #[test]
    fn labels_serialize_uppercase() {
        let json = serde_json::to_string(&Emotion::Fear).unwrap();
        assert_eq!(json, "\"FEAR\"");
        assert_eq!(Emotion::Sad.to_string(), "SAD");
    }
}
