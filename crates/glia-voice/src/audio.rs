//! Audio types shared by the annotation pipeline
//!
//! Transport frames arrive as 16-bit PCM; the classifier works on normalized f32
//! mono samples at 16 kHz. Nothing here touches the frames that are forwarded to
//! transcription or playback.

use crate::error::{VoiceError, VoiceResult};
use serde::{Deserialize, Serialize};

fn default_sample_rate() -> u32 {
    16000
}

fn default_window_secs() -> f32 {
    2.0
}

fn default_hop_secs() -> f32 {
    0.5
}

fn default_queue_capacity() -> usize {
    200
}

fn default_confidence_threshold() -> f32 {
    0.70
}

fn default_smoothing_horizon() -> usize {
    5
}

/// Audio and annotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 16000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Classification window length in seconds (default: 2.0)
    #[serde(default = "default_window_secs")]
    pub window_secs: f32,

    /// Stride between consecutive windows in seconds (default: 0.5)
    #[serde(default = "default_hop_secs")]
    pub hop_secs: f32,

    /// Intake queue capacity per worker, in chunks (default: 200)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Classifications above this confidence are appended to the emotion log (default: 0.70)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Number of raw labels the majority vote looks at (default: 5)
    #[serde(default = "default_smoothing_horizon")]
    pub smoothing_horizon: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            window_secs: default_window_secs(),
            hop_secs: default_hop_secs(),
            queue_capacity: default_queue_capacity(),
            confidence_threshold: default_confidence_threshold(),
            smoothing_horizon: default_smoothing_horizon(),
        }
    }
}

impl AudioConfig {
    /// Window length in samples (WIN).
    pub fn window_samples(&self) -> usize {
        (self.sample_rate as f64 * self.window_secs as f64).round() as usize
    }

    /// Hop length in samples (HOP).
    pub fn hop_samples(&self) -> usize {
        (self.sample_rate as f64 * self.hop_secs as f64).round() as usize
    }

    /// Upper bound on the rolling accumulation buffer: two seconds of audio.
    pub fn max_buffer_samples(&self) -> usize {
        self.sample_rate as usize * 2
    }

    pub fn validate(&self) -> VoiceResult<()> {
        if self.sample_rate == 0 {
            return Err(VoiceError::Config("sample_rate must be positive".to_string()));
        }
        let window = self.window_samples();
        let hop = self.hop_samples();
        if window == 0 || hop == 0 {
            return Err(VoiceError::Config(format!(
                "window ({window}) and hop ({hop}) must both be at least one sample"
            )));
        }
        if hop > window {
            return Err(VoiceError::Config(format!(
                "hop ({hop} samples) must not exceed window ({window} samples)"
            )));
        }
        if window > self.max_buffer_samples() {
            return Err(VoiceError::Config(format!(
                "window ({window} samples) must fit in the {} sample accumulation buffer",
                self.max_buffer_samples()
            )));
        }
        if self.queue_capacity == 0 {
            return Err(VoiceError::Config("queue_capacity must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(VoiceError::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.smoothing_horizon == 0 {
            return Err(VoiceError::Config("smoothing_horizon must be positive".to_string()));
        }
        Ok(())
    }
}

/// A chunk of mono f32 samples queued for a worker, tagged with its stream offset.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Samples normalized to -1.0..1.0
    pub samples: Vec<f32>,

    /// Offset of the first sample from the start of the stream, in seconds
    pub start_sec: f64,
}

/// Convert signed 16-bit PCM to normalized f32.
pub fn pcm_i16_to_f32(pcm: &[i16]) -> Vec<f32> {
    pcm.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Convert little-endian 16-bit PCM bytes to normalized f32. A trailing odd byte is ignored.
pub fn pcm_bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect()
}
