//! Sliding-window emotion classification
//!
//! Audio is scored in fixed windows (WIN = 2 s) that advance by HOP (0.5 s), so
//! consecutive windows overlap by 75%. `WindowAccumulator` turns an arbitrary chunk
//! stream into those windows; `SlidingWindowClassifier` scores one window.

use crate::audio::{AudioChunk, AudioConfig};
use crate::emotion::{ClassificationResult, Emotion};
use crate::error::{VoiceError, VoiceResult};
use crate::model::EmotionModel;
use tracing::debug;

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest probability. Ties go to the lowest index.
fn argmax(probs: &[f32]) -> Option<(usize, f32)> {
    probs.iter().copied().enumerate().fold(None, |best, (i, p)| match best {
        Some((_, bp)) if bp >= p => best,
        _ => Some((i, p)),
    })
}

/// Scores single windows with an acoustic model. Holds no state besides the model.
pub struct SlidingWindowClassifier {
    model: Box<dyn EmotionModel>,
    sample_rate: u32,
    window: usize,
}

impl SlidingWindowClassifier {
    pub fn new(config: &AudioConfig, model: Box<dyn EmotionModel>) -> VoiceResult<Self> {
        config.validate()?;
        Ok(Self {
            model,
            sample_rate: config.sample_rate,
            window: config.window_samples(),
        })
    }

    /// Window length in samples.
    pub fn window_samples(&self) -> usize {
        self.window
    }

    /// Classify one window whose first sample sits at `start_sec`.
    ///
    /// The result is timestamped at the window centre.
    pub fn classify(&self, window: &[f32], start_sec: f64) -> VoiceResult<ClassificationResult> {
        if window.len() != self.window {
            return Err(VoiceError::Model(format!(
                "Expected {} samples, got {}",
                self.window,
                window.len()
            )));
        }

        let logits = self.model.infer(window)?;
        if logits.len() != Emotion::COUNT {
            return Err(VoiceError::ModelShape {
                expected: Emotion::COUNT,
                got: logits.len(),
            });
        }

        if logits.iter().any(|l| !l.is_finite()) {
            return Err(VoiceError::Model(format!("non-finite logits: {logits:?}")));
        }

        let probs = softmax(&logits);
        let (index, confidence) = argmax(&probs)
            .ok_or_else(|| VoiceError::Model("empty probability vector".to_string()))?;
        let label = Emotion::from_index(index)
            .ok_or_else(|| VoiceError::Model(format!("no label for class index {index}")))?;

        let timestamp_sec = start_sec + (self.window as f64 / self.sample_rate as f64) / 2.0;
        debug!("Window @{:.2}s: {} ({:.2})", timestamp_sec, label, confidence);

        Ok(ClassificationResult {
            timestamp_sec,
            label,
            confidence,
        })
    }
}

/// Rolling accumulation buffer that yields WIN-sized windows advancing by HOP.
#[derive(Debug)]
pub struct WindowAccumulator {
    buffer: Vec<f32>,
    /// Stream offset of `buffer[0]`, in seconds
    start_sec: f64,
    sample_rate: u32,
    window: usize,
    hop: usize,
    max_len: usize,
}

impl WindowAccumulator {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            buffer: Vec::with_capacity(config.max_buffer_samples()),
            start_sec: 0.0,
            sample_rate: config.sample_rate,
            window: config.window_samples(),
            hop: config.hop_samples(),
            max_len: config.max_buffer_samples(),
        }
    }

    /// Append a chunk. An empty buffer re-anchors to the chunk's stream offset, and so
    /// does a gap: audio on either side of a dropped chunk never shares a window.
    pub fn push(&mut self, chunk: &AudioChunk) {
        let half_sample = 0.5 / self.sample_rate as f64;
        if !self.buffer.is_empty() && chunk.start_sec > self.end_sec() + half_sample {
            debug!(
                "Gap before {:.3}s, discarding {} buffered samples",
                chunk.start_sec,
                self.buffer.len()
            );
            self.buffer.clear();
        }
        if self.buffer.is_empty() {
            self.start_sec = chunk.start_sec;
        }
        self.buffer.extend_from_slice(&chunk.samples);
    }

    /// Stream offset just past the last buffered sample.
    fn end_sec(&self) -> f64 {
        self.start_sec + self.buffer.len() as f64 / self.sample_rate as f64
    }

    /// Take the next full window and its start offset, then advance by HOP.
    pub fn next_window(&mut self) -> Option<(Vec<f32>, f64)> {
        if self.buffer.len() < self.window {
            return None;
        }
        let window = self.buffer[..self.window].to_vec();
        let start = self.start_sec;
        self.advance(self.hop);
        Some((window, start))
    }

    /// Drop the oldest samples beyond the two-second bound.
    pub fn enforce_cap(&mut self) {
        if self.buffer.len() > self.max_len {
            let excess = self.buffer.len() - self.max_len;
            self.advance(excess);
        }
    }

    fn advance(&mut self, samples: usize) {
        let n = samples.min(self.buffer.len());
        self.buffer.drain(..n);
        self.start_sec += n as f64 / self.sample_rate as f64;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLogits(Vec<f32>);

    impl EmotionModel for FixedLogits {
        fn infer(&self, _input_values: &[f32]) -> VoiceResult<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    fn chunk(len: usize, start_sec: f64) -> AudioChunk {
        AudioChunk {
            samples: vec![0.0; len],
            start_sec,
        }
    }

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn classify_picks_argmax_with_softmax_confidence() {
        let config = AudioConfig::default();
        let classifier = SlidingWindowClassifier::new(
            &config,
            Box::new(FixedLogits(vec![0.0, 0.0, 0.0, 0.0, 5.0, 0.0])),
        )
        .unwrap();

        let result = classifier.classify(&vec![0.0; 32000], 0.5).unwrap();
        assert_eq!(result.label, Emotion::Happy);
        let expected = 5f32.exp() / (5f32.exp() + 5.0);
        assert!((result.confidence - expected).abs() < 1e-5);
        assert!((result.timestamp_sec - 1.5).abs() < 1e-9);
    }

    #[test]
    fn classify_rejects_wrong_window_length() {
        let config = AudioConfig::default();
        let classifier =
            SlidingWindowClassifier::new(&config, Box::new(FixedLogits(vec![0.0; 6]))).unwrap();
        assert!(classifier.classify(&vec![0.0; 100], 0.0).is_err());
    }

    #[test]
    fn classify_rejects_wrong_logit_count() {
        let config = AudioConfig::default();
        let classifier =
            SlidingWindowClassifier::new(&config, Box::new(FixedLogits(vec![0.0; 4]))).unwrap();
        let err = classifier.classify(&vec![0.0; 32000], 0.0).unwrap_err();
        assert!(matches!(err, VoiceError::ModelShape { expected: 6, got: 4 }));
    }

    #[test]
    fn classify_rejects_non_finite_logits() {
        let config = AudioConfig::default();
        for bad in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            let classifier = SlidingWindowClassifier::new(
                &config,
                Box::new(FixedLogits(vec![0.0, bad, 0.0, 0.0, 0.0, 0.0])),
            )
            .unwrap();
            let err = classifier.classify(&vec![0.0; 32000], 0.0).unwrap_err();
            assert!(matches!(err, VoiceError::Model(_)), "{bad} should be rejected");
        }
    }

    #[test]
    fn uniform_logits_resolve_to_first_label() {
        let config = AudioConfig::default();
        let classifier =
            SlidingWindowClassifier::new(&config, Box::new(FixedLogits(vec![0.0; 6]))).unwrap();
        let result = classifier.classify(&vec![0.0; 32000], 0.0).unwrap();
        assert_eq!(result.label, Emotion::Neutral);
        assert!((result.confidence - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn three_seconds_yield_three_windows() {
        let config = AudioConfig::default();
        let mut acc = WindowAccumulator::new(&config);
        acc.push(&chunk(48000, 0.0));

        let mut starts = Vec::new();
        while let Some((window, start)) = acc.next_window() {
            assert_eq!(window.len(), 32000);
            starts.push(start);
        }
        assert_eq!(starts, vec![0.0, 0.5, 1.0]);
        assert_eq!(acc.len(), 24000);
    }

    #[test]
    fn window_count_follows_hop_formula_across_chunks() {
        let config = AudioConfig::default();
        let (win, hop) = (config.window_samples(), config.hop_samples());
        let mut acc = WindowAccumulator::new(&config);

        let mut total = 0usize;
        let mut windows = 0usize;
        for (i, len) in [1000usize, 7000, 30000, 320, 12345, 800, 20000].iter().enumerate() {
            acc.push(&chunk(*len, total as f64 / 16000.0));
            total += len;
            while acc.next_window().is_some() {
                windows += 1;
            }
            acc.enforce_cap();
            assert!(acc.len() <= config.max_buffer_samples(), "chunk {i} overflowed the buffer");
        }
        assert_eq!(windows, (total - win) / hop + 1);
    }

    #[test]
    fn gap_in_stream_clock_restarts_the_buffer() {
        let config = AudioConfig::default();
        let mut acc = WindowAccumulator::new(&config);
        acc.push(&chunk(24000, 0.0));
        assert!(acc.next_window().is_none());

        // 1 s of audio never arrived; the next chunk starts at 2.5 s.
        acc.push(&chunk(32000, 2.5));
        assert_eq!(acc.len(), 32000);
        let (_, start) = acc.next_window().unwrap();
        assert!((start - 2.5).abs() < 1e-9);
        assert!(acc.next_window().is_none());
    }

    #[test]
    fn contiguous_chunks_keep_the_buffer() {
        let config = AudioConfig::default();
        let mut acc = WindowAccumulator::new(&config);
        acc.push(&chunk(16000, 0.0));
        acc.push(&chunk(16000, 1.0));
        assert_eq!(acc.len(), 32000);
        let (_, start) = acc.next_window().unwrap();
        assert_eq!(start, 0.0);
    }

    #[test]
    fn cap_discards_oldest_samples() {
        let config = AudioConfig {
            window_secs: 1.0,
            ..Default::default()
        };
        let mut acc = WindowAccumulator::new(&config);
        // Push more than the cap without extracting windows.
        acc.push(&chunk(40000, 0.0));
        acc.enforce_cap();
        assert_eq!(acc.len(), 32000);
        let (_, start) = acc.next_window().unwrap();
        assert!((start - 0.5).abs() < 1e-9);
    }
}
