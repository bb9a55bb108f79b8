//! # Glia Voice - Streaming Emotion Annotation
//!
//! Estimates the emotional tone of both sides of a call from live audio without
//! touching the audio that flows to transcription and playback.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     Emotion Worker (per direction)                │
//! │  ┌────────────┐   try_send   ┌──────────────┐   ┌─────────────┐  │
//! │  │  process() │ ───────────→ │ Bounded queue│ → │  Window     │  │
//! │  │ (audio tap)│  drop if full│   (200)      │   │ Accumulator │  │
//! │  └────────────┘              └──────────────┘   └─────────────┘  │
//! │        ↓ frame unchanged                              ↓ 2s / 0.5s │
//! │  transcription / playback     ┌──────────────┐   ┌─────────────┐  │
//! │                               │ Majority vote│ ← │ Classifier  │  │
//! │                               │ → latest()   │   │ (model)     │  │
//! │                               └──────────────┘   └─────────────┘  │
//! │                                       conf > 0.70 ↓               │
//! │                               ┌────────────────────────────────┐  │
//! │                               │ CallState emotion log (drained │  │
//! │                               │ by the dialog layer each turn) │  │
//! │                               └────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod call_state;
pub mod classifier;
pub mod emotion;
pub mod error;
pub mod model;
pub mod smoothing;
pub mod worker;

pub use audio::{pcm_bytes_to_f32, pcm_i16_to_f32, AudioChunk, AudioConfig};
pub use call_state::{CallState, Direction, EmotionSnapshot};
pub use classifier::{softmax, SlidingWindowClassifier, WindowAccumulator};
pub use emotion::{ClassificationResult, Emotion};
pub use error::{VoiceError, VoiceResult};
pub use model::{
    create_emotion_model, EmotionModel, HttpEmotionModel, ModelConfig, PlaceholderEmotionModel,
    MODEL_INPUT_NAME, MODEL_OUTPUT_NAME,
};
pub use smoothing::{MajorityVote, SmoothedEstimate};
pub use worker::{tap_stream, EmotionWorker, Enqueue};
