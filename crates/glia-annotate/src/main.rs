//! glia-annotate: run a call recording through the emotion annotation worker.
//!
//! Usage:
//!   cargo run -p glia-annotate -- --wav call.wav [--direction user|agent] [--frame-ms 20]
//!
//! Prints one JSON object per line on stdout: each change of the smoothed estimate,
//! then the drained emotion log and a summary. Logs go to stderr (`RUST_LOG`).

use glia_annotate::{annotate, read_wav, AnnotateArgs};
use glia_core::GliaConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = AnnotateArgs::parse(std::env::args().skip(1))? else {
        eprintln!("glia-annotate: emotion annotation for call recordings");
        eprintln!("  --wav PATH              Mono 16-bit PCM WAV at the configured sample rate");
        eprintln!("  --direction user|agent  Which call side the recording is (default user)");
        eprintln!("  --frame-ms N            Frame size fed to the worker (default 20)");
        eprintln!();
        eprintln!("Config: GLIA_CONFIG or config/glia.toml, overridden by GLIA__SECTION__KEY.");
        eprintln!("Set GLIA__MODEL__ENDPOINT to use a remote emotion model (else placeholder).");
        return Ok(());
    };

    let config = GliaConfig::load()?;
    let samples = read_wav(&args.wav, config.audio.sample_rate)?;
    info!("Annotate: {} ({} samples)", args.wav.display(), samples.len());

    for line in annotate(&samples, args.direction, args.frame_ms, &config)? {
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}
