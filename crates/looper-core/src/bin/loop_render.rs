//! loop-render - run a looper session offline
//!
//! Feeds a WAV file through a [`Looper`] while replaying a scripted list of
//! button events, and writes what the looper outputs to a new WAV file.
//!
//! ```text
//! loop-render <input.wav> <session.yaml> <output.wav> [--config looper.yaml]
//! ```
//!
//! Session script:
//!
//! ```yaml
//! tail_seconds: 4.0        # silence appended after the input
//! events:
//!   - { at_seconds: 0.5, event: press_rec }
//!   - { at_seconds: 2.5, event: release_rec }
//!   - { at_seconds: 6.0, event: press_rec }
//!   - { at_seconds: 8.0, event: release_rec }
//! ```
//!
//! Events take effect at the first block boundary at or after their time.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use looper_core::config::{load_config, read_yaml, LooperConfig};
use looper_core::{command_channel, Looper, LooperCommand, LooperEvent, Sample};

/// Samples processed between command batches
const BLOCK_SIZE: usize = 256;

const USAGE: &str =
    "usage: loop-render <input.wav> <session.yaml> <output.wav> [--config looper.yaml]";

#[derive(Debug, Deserialize)]
struct Session {
    #[serde(default)]
    tail_seconds: f64,
    events: Vec<TimedEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedEvent {
    at_seconds: f64,
    event: LooperEvent,
}

struct Args {
    input: PathBuf,
    session: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut config = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            config = Some(PathBuf::from(path));
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    let [input, session, output]: [PathBuf; 3] =
        positional.try_into().map_err(|_| anyhow!(USAGE))?;
    Ok(Args {
        input,
        session,
        output,
        config,
    })
}

/// Read a WAV file as mono f32, averaging channels
fn read_mono(path: &Path) -> Result<(Vec<Sample>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<Sample> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("Failed to decode {:?}", path))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("Failed to decode {:?}", path))?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<Sample>() / channels as Sample)
        .collect();

    log::info!(
        "Read {:?}: {} Hz, {} channel(s), {}-bit",
        path,
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );
    Ok((mono, spec.sample_rate))
}

/// Write mono 32-bit float WAV
fn write_mono(path: &Path, samples: &[Sample], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {:?}", path))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    (seconds.max(0.0) * sample_rate as f64).round() as usize
}

fn main() -> Result<()> {
    // Set RUST_LOG=debug to see every transition
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;

    let mut config: LooperConfig = match &args.config {
        Some(path) => load_config(path),
        None => LooperConfig::default(),
    };
    let session: Session = read_yaml(&args.session)?;
    let (input, sample_rate) = read_mono(&args.input)?;

    if config.sample_rate != sample_rate {
        log::info!(
            "Using input sample rate {} Hz instead of configured {} Hz",
            sample_rate,
            config.sample_rate
        );
        config.sample_rate = sample_rate;
    }

    let mut looper = Looper::from_config(&config)?;
    let (mut tx, mut rx) = command_channel();

    let mut schedule: Vec<(usize, LooperEvent)> = session
        .events
        .iter()
        .map(|e| (seconds_to_samples(e.at_seconds, sample_rate), e.event))
        .collect();
    schedule.sort_by_key(|&(at, _)| at);

    let total = input.len() + seconds_to_samples(session.tail_seconds, sample_rate);
    let mut output = vec![0.0; total];
    let mut block = [0.0; BLOCK_SIZE];
    let mut next = 0;

    for start in (0..total).step_by(BLOCK_SIZE) {
        let end = (start + BLOCK_SIZE).min(total);

        while let Some(&(at, event)) = schedule.get(next) {
            if at > start {
                break;
            }
            log::debug!("{:.3}s: {}", start as f64 / sample_rate as f64, event);
            if tx.push(LooperCommand::Event(event)).is_err() {
                bail!("Command queue full at sample {}", start);
            }
            next += 1;
        }
        looper.process_commands(&mut rx);

        let len = end - start;
        for (i, slot) in block[..len].iter_mut().enumerate() {
            *slot = input.get(start + i).copied().unwrap_or(0.0);
        }
        looper.process_block(&block[..len], &mut output[start..end]);
    }

    if next < schedule.len() {
        log::warn!(
            "{} event(s) scheduled past the end of the render were skipped",
            schedule.len() - next
        );
    }

    let atomics = looper.atomics();
    let (_, region_length) = atomics.region();
    log::info!(
        "Rendered {:.2}s, final state {}, loop {} samples",
        total as f64 / sample_rate as f64,
        atomics.state(),
        region_length
    );

    write_mono(&args.output, &output, sample_rate)?;
    log::info!("Wrote {:?}", args.output);
    Ok(())
}
