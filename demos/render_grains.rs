//! Offline granulation of a WAV file.
//!
//! Streams the input file through a grain engine as if it were live input
//! and writes the result, plus one second of tail, to a stereo WAV file.
//!
//! Usage:
//!   cargo run --example render_grains --features wav -- <input.wav> <output.wav> [periodic|random|cloud]
//!
//! The engine runs at 48 kHz; files at other rates are processed sample for
//! sample and therefore change pitch.

use anyhow::{Context, Result, bail};
use graincloud::clock::ClockMode;
use graincloud::{
    Cloud, EngineConfig, Frame, GrainEngine, GrainEnvelope, GrainSettings, HistoryBuffer,
    Periodic, RandomWindow, RingBuffer, Stereo, TriggerStrategy,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SAMPLE_RATE: u32 = 48000;
const GRAINS: usize = 24;

fn strategy_from_name(name: &str) -> Result<TriggerStrategy> {
    Ok(match name {
        "periodic" => Periodic::new(1200.0).into(),
        "random" => RandomWindow::new((0.0, 72000.0), (0.5, 1.0))
            .with_speed_range((0.5, 1.5))
            .into(),
        "cloud" => Cloud::new(24000.0, 9600.0).with_pan_spread(0.7).into(),
        other => bail!("unknown strategy '{other}', expected periodic, random or cloud"),
    })
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!(
            "usage: {} <input.wav> <output.wav> [periodic|random|cloud]",
            args[0]
        );
    }
    let strategy = strategy_from_name(args.get(3).map(String::as_str).unwrap_or("cloud"))?;

    let source = RingBuffer::<Stereo>::from_wav_file(&args[1])
        .with_context(|| format!("failed to load {}", args[1]))?;

    let config = EngineConfig::default()
        .with_history_seconds(2.0)
        .with_max_grain_seconds(0.5)
        .with_clock(ClockMode::Internal {
            bpm: 96.0,
            steps_per_beat: 16,
        })
        .with_jitter(0.3)
        .with_strategy(strategy)
        .with_settings(
            GrainSettings::default()
                .with_density(0.8)
                .with_duration(0.12)
                .with_volume(0.9)
                .with_envelope(GrainEnvelope::attack_decay()),
        );
    let mut engine = GrainEngine::<SAMPLE_RATE, GRAINS, Stereo>::with_parts(
        &config,
        RingBuffer::with_duration(config.history_seconds, SAMPLE_RATE),
        StdRng::seed_from_u64(0x6772_6169_6e73),
    )?;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args[2], spec)
        .with_context(|| format!("failed to create {}", args[2]))?;

    // oldest frame first, then a second of silence to let the last grains ring out
    let input = (0..source.capacity())
        .rev()
        .map(|delay| source.read(delay as f64))
        .chain(std::iter::repeat_n(Stereo::default(), SAMPLE_RATE as usize));

    let mut frames = 0usize;
    let mut peak: f64 = 0.0;
    for frame in input {
        let out = engine.process(frame, 0.0);
        peak = peak.max(out.peak());
        writer.write_sample(out.left as f32)?;
        writer.write_sample(out.right as f32)?;
        frames += 1;
    }
    writer.finalize()?;

    println!(
        "rendered {frames} frames with the {} strategy to {} (peak {peak:.3})",
        engine.strategy().name(),
        args[2]
    );
    Ok(())
}
