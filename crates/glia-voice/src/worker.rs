//! **Emotion annotation worker**, one per audio direction.
//!
//! Audio call sites hand frames to `process()`, which copies them into a bounded
//! queue without blocking and returns the frame untouched. A dedicated thread owns
//! the rolling buffer, scores 2 s windows every 0.5 s, appends confident labels to
//! the call's emotion log and publishes a smoothed estimate for `latest()`.
//!
//! When the queue is full the newest frame is dropped: latency on the audio path
//! wins over completeness of the annotation.

use crate::audio::{pcm_i16_to_f32, AudioChunk, AudioConfig};
use crate::call_state::{CallState, Direction};
use crate::classifier::{SlidingWindowClassifier, WindowAccumulator};
use crate::error::VoiceResult;
use crate::model::EmotionModel;
use crate::smoothing::{MajorityVote, SmoothedEstimate};
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// What happened to a frame handed to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    /// Queued for classification.
    Queued,
    /// Queue full; frame dropped.
    Dropped,
    /// Worker already stopped; frame ignored.
    Stopped,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counters shared with the worker thread.
#[derive(Debug, Default)]
struct WorkerStats {
    classified: AtomicU64,
    failed: AtomicU64,
}

/// Background emotion annotation for one direction of the call.
pub struct EmotionWorker {
    direction: Direction,
    sample_rate: u32,
    intake: Mutex<Option<mpsc::Sender<AudioChunk>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    latest: Arc<Mutex<Option<SmoothedEstimate>>>,
    stats: Arc<WorkerStats>,
    samples_submitted: AtomicU64,
    dropped: AtomicU64,
}

impl EmotionWorker {
    /// Validate the config and start the worker thread.
    pub fn spawn(
        direction: Direction,
        config: &AudioConfig,
        model: Box<dyn EmotionModel>,
        state: Arc<CallState>,
    ) -> VoiceResult<Self> {
        let classifier = SlidingWindowClassifier::new(config, model)?;
        let accumulator = WindowAccumulator::new(config);
        let vote = MajorityVote::new(config.smoothing_horizon);
        let (tx, rx) = mpsc::channel(config.queue_capacity);

        let latest = Arc::new(Mutex::new(None));
        let stats = Arc::new(WorkerStats::default());

        let job = WorkerLoop {
            direction,
            rx,
            classifier,
            accumulator,
            vote,
            threshold: config.confidence_threshold,
            state,
            latest: Arc::clone(&latest),
            stats: Arc::clone(&stats),
        };

        let handle = thread::Builder::new()
            .name(format!("emotion-{}", direction))
            .spawn(move || job.run())?;

        info!(
            "Emotion[{}]: worker started ({} sample window, queue {})",
            direction,
            config.window_samples(),
            config.queue_capacity
        );

        Ok(Self {
            direction,
            sample_rate: config.sample_rate,
            intake: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
            latest,
            stats,
            samples_submitted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Observe a frame of f32 samples and hand it back unchanged.
    pub fn process<'a>(&self, frame: &'a [f32]) -> &'a [f32] {
        self.submit(frame);
        frame
    }

    /// Observe a frame of 16-bit PCM and hand it back unchanged.
    pub fn process_pcm<'a>(&self, frame: &'a [i16]) -> &'a [i16] {
        self.submit(&pcm_i16_to_f32(frame));
        frame
    }

    /// Copy a frame into the intake queue without blocking.
    ///
    /// The stream clock advances even for dropped frames, so later offsets stay
    /// aligned with the real call timeline and the worker sees the gap.
    pub fn submit(&self, frame: &[f32]) -> Enqueue {
        let previous = self
            .samples_submitted
            .fetch_add(frame.len() as u64, Ordering::Relaxed);
        let start_sec = previous as f64 / self.sample_rate as f64;

        let intake = lock(&self.intake);
        let Some(tx) = intake.as_ref() else {
            return Enqueue::Stopped;
        };

        let chunk = AudioChunk {
            samples: frame.to_vec(),
            start_sec,
        };
        match tx.try_send(chunk) {
            Ok(()) => Enqueue::Queued,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("Emotion[{}]: intake full, dropped frame ({} total)", self.direction, dropped);
                Enqueue::Dropped
            }
            Err(TrySendError::Closed(_)) => Enqueue::Stopped,
        }
    }

    /// Latest smoothed estimate; `None` until the first full window is classified.
    pub fn latest(&self) -> Option<SmoothedEstimate> {
        *lock(&self.latest)
    }

    /// Windows classified so far.
    pub fn classifications(&self) -> u64 {
        self.stats.classified.load(Ordering::Acquire)
    }

    /// Windows skipped because the model failed.
    pub fn failed_windows(&self) -> u64 {
        self.stats.failed.load(Ordering::Acquire)
    }

    /// Frames dropped because the intake queue was full.
    pub fn dropped_chunks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Free slots in the intake queue; 0 once stopped.
    pub fn queue_room(&self) -> usize {
        lock(&self.intake).as_ref().map_or(0, |tx| tx.capacity())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.handle).is_some()
    }

    /// Close the intake, let the thread drain what is queued, and join it.
    /// Calling it again is a no-op.
    pub fn stop(&self) {
        // Dropping the only sender closes the channel once the backlog is consumed.
        lock(&self.intake).take();

        let handle = lock(&self.handle).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Emotion[{}]: worker thread panicked", self.direction);
            }
            info!(
                "Emotion[{}]: worker stopped ({} windows, {} failed, {} dropped frames)",
                self.direction,
                self.classifications(),
                self.failed_windows(),
                self.dropped_chunks()
            );
        }
    }
}

impl Drop for EmotionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the worker thread.
struct WorkerLoop {
    direction: Direction,
    rx: mpsc::Receiver<AudioChunk>,
    classifier: SlidingWindowClassifier,
    accumulator: WindowAccumulator,
    vote: MajorityVote,
    threshold: f32,
    state: Arc<CallState>,
    latest: Arc<Mutex<Option<SmoothedEstimate>>>,
    stats: Arc<WorkerStats>,
}

impl WorkerLoop {
    fn run(mut self) {
        debug!("Emotion[{}]: thread running", self.direction);

        while let Some(chunk) = self.rx.blocking_recv() {
            self.accumulator.push(&chunk);

            while let Some((window, start_sec)) = self.accumulator.next_window() {
                self.classify(&window, start_sec);
            }

            self.accumulator.enforce_cap();
        }

        debug!("Emotion[{}]: intake closed, thread exiting", self.direction);
    }

    fn classify(&mut self, window: &[f32], start_sec: f64) {
        let result = match self.classifier.classify(window, start_sec) {
            Ok(r) => r,
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::AcqRel);
                warn!(
                    "Emotion[{}]: skipping window at {:.2}s: {}",
                    self.direction, start_sec, e
                );
                return;
            }
        };

        if result.confidence > self.threshold {
            self.state.append_emotion(self.direction, result.label);
        }

        let stable = self.vote.push(result.label);
        *lock(&self.latest) = Some(SmoothedEstimate {
            timestamp_sec: result.timestamp_sec,
            label: stable,
            confidence: result.confidence,
            observed_at: Utc::now(),
        });
        self.stats.classified.fetch_add(1, Ordering::AcqRel);
    }
}

/// Wrap a stream of PCM frames so each frame is observed by `worker` and passed on unchanged.
///
/// Use on the transport side: inbound audio before transcription, synthesized audio
/// before playback.
pub fn tap_stream<S, F>(worker: Arc<EmotionWorker>, frames: S) -> impl Stream<Item = F>
where
    S: Stream<Item = F>,
    F: AsRef<[i16]>,
{
    frames.inspect(move |frame| {
        worker.process_pcm(frame.as_ref());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaceholderEmotionModel;

    #[test]
    fn latest_is_none_before_first_window() {
        let state = Arc::new(CallState::new());
        let worker = EmotionWorker::spawn(
            Direction::User,
            &AudioConfig::default(),
            Box::new(PlaceholderEmotionModel),
            state,
        )
        .unwrap();

        worker.process(&[0.0; 800]);
        worker.stop();
        assert!(worker.latest().is_none());
        assert_eq!(worker.classifications(), 0);
    }

    #[test]
    fn process_returns_frame_untouched() {
        let state = Arc::new(CallState::new());
        let worker = EmotionWorker::spawn(
            Direction::Agent,
            &AudioConfig::default(),
            Box::new(PlaceholderEmotionModel),
            state,
        )
        .unwrap();

        let frame: Vec<f32> = (0..800).map(|i| (i as f32 / 800.0) - 0.5).collect();
        let original = frame.clone();
        let out = worker.process(&frame);
        assert_eq!(out.as_ptr(), frame.as_ptr());
        assert_eq!(out, &original[..]);
    }

    #[test]
    fn stop_is_idempotent() {
        let state = Arc::new(CallState::new());
        let worker = EmotionWorker::spawn(
            Direction::User,
            &AudioConfig::default(),
            Box::new(PlaceholderEmotionModel),
            state,
        )
        .unwrap();

        assert!(worker.is_running());
        assert!(worker.queue_room() > 0);
        worker.stop();
        worker.stop();
        assert!(!worker.is_running());
        assert_eq!(worker.queue_room(), 0);
        assert_eq!(worker.submit(&[0.0; 10]), Enqueue::Stopped);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AudioConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        let result = EmotionWorker::spawn(
            Direction::User,
            &config,
            Box::new(PlaceholderEmotionModel),
            Arc::new(CallState::new()),
        );
        assert!(result.is_err());
    }
}
