//! Audio output and terminal plumbing shared by the live demos.

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, StreamConfig};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use graincloud::Stereo;
use std::io::stdout;
use std::panic;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Audio state that renders one stereo frame at a time.
pub trait DemoAudioState: Send + 'static {
    fn next_frame(&mut self) -> Stereo;
}

/// Key handling result that controls the event loop
pub enum KeyAction {
    Continue,
    Exit,
}

/// Runs a live demo at `sample_rate` with a terminal UI.
///
/// Opens the default output device, puts the terminal in raw mode on the
/// alternate screen, and polls keys until `key_handler` returns
/// [`KeyAction::Exit`]. The terminal is restored on exit and on panic.
pub fn run_live_demo<S, F, K>(
    state: S,
    sample_rate: u32,
    initial_ui: F,
    key_handler: K,
) -> Result<()>
where
    S: DemoAudioState,
    F: FnOnce(&Arc<Mutex<S>>) -> Result<()>,
    K: Fn(&Arc<Mutex<S>>, &KeyEvent) -> Result<KeyAction>,
{
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;

    // the engine's sample rate is fixed at compile time, so the device must match it
    let supported = device
        .supported_output_configs()?
        .find(|c| c.min_sample_rate().0 <= sample_rate && c.max_sample_rate().0 >= sample_rate)
        .ok_or_else(|| anyhow::anyhow!("Output device does not support {sample_rate} Hz"))?
        .with_sample_rate(SampleRate(sample_rate));

    let state = Arc::new(Mutex::new(state));
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();

    let _stream = match sample_format {
        SampleFormat::F32 => create_audio_stream::<f32, S>(&device, &config, state.clone())?,
        SampleFormat::I16 => create_audio_stream::<i16, S>(&device, &config, state.clone())?,
        SampleFormat::U16 => create_audio_stream::<u16, S>(&device, &config, state.clone())?,
        sample_format => {
            return Err(anyhow::anyhow!(
                "Unsupported sample format: {}",
                sample_format
            ));
        }
    };

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(crossterm::cursor::Hide)?;

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal();
        original_hook(panic_info);
    }));

    initial_ui(&state)?;

    loop {
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key_event) = event::read()?
        {
            match key_handler(&state, &key_event)? {
                KeyAction::Continue => {}
                KeyAction::Exit => break,
            }
        }
    }

    cleanup_terminal();

    Ok(())
}

/// Creates an output stream that pulls frames from the audio state.
///
/// Mono devices get the average of both channels; extra channels are silent.
fn create_audio_stream<T, S>(
    device: &cpal::Device,
    config: &StreamConfig,
    state: Arc<Mutex<S>>,
) -> Result<cpal::Stream>
where
    T: Sample + FromSample<f64> + cpal::SizedSample,
    S: DemoAudioState,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut state = state.lock().unwrap();
            for frame in data.chunks_mut(channels) {
                let Stereo { left, right } = state.next_frame();
                if let [mono] = frame {
                    *mono = T::from_sample(0.5 * (left + right));
                    continue;
                }
                for (i, s) in frame.iter_mut().enumerate() {
                    let value = match i {
                        0 => left,
                        1 => right,
                        _ => 0.0,
                    };
                    *s = T::from_sample(value);
                }
            }
        },
        |err| eprintln!("Audio stream error: {}", err),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

/// Restores cursor, main screen and cooked mode.
fn cleanup_terminal() {
    let _ = stdout().execute(crossterm::cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Helper to check if a key code is a quit key (Q, ESC).
pub fn is_quit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}
