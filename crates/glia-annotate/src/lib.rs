//! Offline annotation: stream a WAV recording through one emotion worker and report
//! the smoothed estimate as it changes, then the drained emotion log.

use anyhow::{bail, Context};
use glia_core::GliaConfig;
use glia_voice::{create_emotion_model, CallState, Direction, Emotion, EmotionWorker};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_FRAME_MS: u32 = 20;

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotateArgs {
    pub wav: PathBuf,
    pub direction: Direction,
    pub frame_ms: u32,
}

impl AnnotateArgs {
    /// Parse `--wav PATH [--direction user|agent] [--frame-ms N]`. `Ok(None)` means
    /// no WAV was given and usage should be printed.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Option<Self>> {
        let mut args = args.into_iter();
        let mut wav = None;
        let mut direction = Direction::User;
        let mut frame_ms = DEFAULT_FRAME_MS;

        while let Some(a) = args.next() {
            match a.as_str() {
                "--wav" => wav = args.next().map(PathBuf::from),
                "--direction" => {
                    direction = match args.next().as_deref() {
                        Some("user") => Direction::User,
                        Some("agent") => Direction::Agent,
                        other => bail!("--direction expects user or agent, got {:?}", other),
                    }
                }
                "--frame-ms" => {
                    let value = args.next().context("--frame-ms expects a value")?;
                    frame_ms = value
                        .parse()
                        .with_context(|| format!("invalid --frame-ms '{}'", value))?;
                    if frame_ms == 0 {
                        bail!("--frame-ms must be positive");
                    }
                }
                "--help" | "-h" => return Ok(None),
                other => bail!("unknown argument '{}'", other),
            }
        }

        Ok(wav.map(|wav| Self {
            wav,
            direction,
            frame_ms,
        }))
    }
}

/// One JSON line of output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationLine {
    Estimate {
        timestamp_sec: f64,
        label: Emotion,
        confidence: f32,
    },
    Log {
        direction: Direction,
        labels: Vec<Emotion>,
    },
    Summary {
        classifications: u64,
        failed_windows: u64,
        dropped_chunks: u64,
    },
}

/// Read a mono 16-bit PCM WAV recorded at `sample_rate`.
pub fn read_wav(path: &Path, sample_rate: u32) -> anyhow::Result<Vec<i16>> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels != 1
        || spec.bits_per_sample != 16
        || spec.sample_format != hound::SampleFormat::Int
    {
        bail!(
            "{}: expected mono 16-bit PCM, got {} channel(s) at {} bits",
            path.display(),
            spec.channels,
            spec.bits_per_sample
        );
    }
    if spec.sample_rate != sample_rate {
        bail!(
            "{}: expected {} Hz, got {} Hz",
            path.display(),
            sample_rate,
            spec.sample_rate
        );
    }
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(samples)
}

/// Stream `samples` through a worker in `frame_ms` frames and collect the output lines.
///
/// A file is not a live call: instead of dropping frames when the queue is full,
/// wait for room so every sample is classified.
pub fn annotate(
    samples: &[i16],
    direction: Direction,
    frame_ms: u32,
    config: &GliaConfig,
) -> anyhow::Result<Vec<AnnotationLine>> {
    let model = create_emotion_model(&config.model)?;
    let state = Arc::new(CallState::new());
    let worker = EmotionWorker::spawn(direction, &config.audio, model, Arc::clone(&state))?;

    let frame_len = (config.audio.sample_rate as usize * frame_ms as usize / 1000).max(1);
    info!(
        "Annotate: {} samples in {} frames of {} ms",
        samples.len(),
        samples.len().div_ceil(frame_len),
        frame_ms
    );

    let mut lines = Vec::new();
    let mut last_label: Option<Emotion> = None;
    let mut report = |lines: &mut Vec<AnnotationLine>, worker: &EmotionWorker| {
        if let Some(estimate) = worker.latest() {
            if last_label != Some(estimate.label) {
                last_label = Some(estimate.label);
                lines.push(AnnotationLine::Estimate {
                    timestamp_sec: estimate.timestamp_sec,
                    label: estimate.label,
                    confidence: estimate.confidence,
                });
            }
        }
    };

    for frame in samples.chunks(frame_len) {
        while worker.queue_room() == 0 {
            thread::sleep(Duration::from_millis(2));
        }
        worker.process_pcm(frame);
        report(&mut lines, &worker);
    }

    worker.stop();
    report(&mut lines, &worker);

    lines.push(AnnotationLine::Log {
        direction,
        labels: state.drain_emotions(direction),
    });
    lines.push(AnnotationLine::Summary {
        classifications: worker.classifications(),
        failed_windows: worker.failed_windows(),
        dropped_chunks: worker.dropped_chunks(),
    });
    Ok(lines)
}
