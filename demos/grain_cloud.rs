//! Live granular cloud over a built-in test tone.
//!
//! A slowly changing arpeggio is recorded into the engine's history and
//! granulated on an internal 120 BPM clock.
//!
//! Keys:
//!   1 / 2 / 3   periodic / random window / cloud strategy
//!   UP / DOWN   density
//!   LEFT/RIGHT  grain duration
//!   J / K       jitter
//!   S / X       speed, up to two octaves either way
//!   E           next envelope shape
//!   L           toggle looping
//!   SPACE       fire a grain now
//!   Q / ESC     quit

mod common;

use anyhow::Result;
use common::{DemoAudioState, KeyAction, is_quit_key, run_live_demo};
use crossterm::{
    ExecutableCommand,
    event::{KeyCode, KeyEvent, KeyEventKind},
};
use graincloud::clock::ClockMode;
use graincloud::{
    Cloud, EngineConfig, Frame, GrainEngine, GrainEnvelope, GrainSettings, Periodic,
    RandomWindow, SpeedMapping, Stereo,
};
use std::f64::consts::TAU;
use std::io::{Write, stdout};

const SAMPLE_RATE: u32 = 48000;
const GRAINS: usize = 32;

/// Notes of the test arpeggio, in Hz
const NOTES: [f64; 4] = [220.0, 277.18, 329.63, 440.0];
const NOTE_SAMPLES: usize = SAMPLE_RATE as usize / 4;

const SPEED_MAPPING: SpeedMapping = SpeedMapping::Exponential { octaves: 2.0 };
/// Per-sample decay of the level meter
const PEAK_DECAY: f64 = 0.9999;

struct AudioState {
    engine: GrainEngine<SAMPLE_RATE, GRAINS, Stereo>,
    phase: f64,
    sample_index: usize,
    envelope_index: usize,
    /// Bipolar speed control in [-1, 1]
    speed_knob: f64,
    peak: f64,
}

impl AudioState {
    fn new() -> Result<Self> {
        let config = EngineConfig::default()
            .with_history_seconds(2.0)
            .with_max_grain_seconds(0.5)
            .with_clock(ClockMode::Internal {
                bpm: 120.0,
                steps_per_beat: 8,
            })
            .with_strategy(Cloud::new(12000.0, 6000.0).with_pan_spread(0.8))
            .with_settings(GrainSettings::default().with_density(0.7).with_duration(0.15));

        Ok(Self {
            engine: GrainEngine::new(&config)?,
            phase: 0.0,
            sample_index: 0,
            envelope_index: 1,
            speed_knob: 0.0,
            peak: 0.0,
        })
    }

    /// The input tone, a plain sine stepping through the arpeggio.
    fn input(&mut self) -> Stereo {
        let note = NOTES[(self.sample_index / NOTE_SAMPLES) % NOTES.len()];
        self.sample_index = self.sample_index.wrapping_add(1);
        self.phase = (self.phase + note / SAMPLE_RATE as f64).fract();
        Stereo::mono((self.phase * TAU).sin() * 0.5)
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('1') => self.engine.set_strategy(Periodic::new(2400.0)),
            KeyCode::Char('2') => self
                .engine
                .set_strategy(RandomWindow::new((0.0, 48000.0), (0.4, 1.0))),
            KeyCode::Char('3') => self
                .engine
                .set_strategy(Cloud::new(12000.0, 6000.0).with_pan_spread(0.8)),
            KeyCode::Char('j') => self.engine.set_jitter(self.engine.jitter() - 0.1),
            KeyCode::Char('k') => self.engine.set_jitter(self.engine.jitter() + 0.1),
            KeyCode::Char('s') => self.set_speed_knob(self.speed_knob + 0.125),
            KeyCode::Char('x') => self.set_speed_knob(self.speed_knob - 0.125),
            KeyCode::Char(' ') => {
                self.engine.fire();
            }
            KeyCode::Char('e') => {
                self.envelope_index = (self.envelope_index + 1) % GrainEnvelope::ALL.len();
                self.engine.settings_mut().envelope = GrainEnvelope::ALL[self.envelope_index];
            }
            code => adjust_settings(self.engine.settings_mut(), code),
        }
    }

    fn set_speed_knob(&mut self, value: f64) {
        self.speed_knob = value.clamp(-1.0, 1.0);
        self.engine.settings_mut().speed = SPEED_MAPPING.map(self.speed_knob);
    }
}

fn adjust_settings(settings: &mut GrainSettings, code: KeyCode) {
    match code {
        KeyCode::Up => settings.density = (settings.density + 0.1).min(1.0),
        KeyCode::Down => settings.density = (settings.density - 0.1).max(0.0),
        KeyCode::Right => {
            let duration = (settings.duration + 0.02).min(0.5);
            *settings = settings.with_duration(duration);
        }
        KeyCode::Left => {
            let duration = (settings.duration - 0.02).max(0.02);
            *settings = settings.with_duration(duration);
        }
        KeyCode::Char('l') => settings.looping = !settings.looping,
        _ => {}
    }
}

impl DemoAudioState for AudioState {
    fn next_frame(&mut self) -> Stereo {
        let input = self.input();
        let out = self.engine.process(input, 0.0);
        self.peak = out.peak().max(self.peak * PEAK_DECAY);
        Stereo::new(out.left * 0.8, out.right * 0.8)
    }
}

fn draw_ui(state: &AudioState) -> Result<()> {
    let settings = state.engine.settings();
    let mut stdout = stdout();
    stdout.execute(crossterm::terminal::Clear(
        crossterm::terminal::ClearType::All,
    ))?;
    stdout.execute(crossterm::cursor::MoveTo(0, 0))?;
    write!(
        stdout,
        "strategy: {:<8} density: {:.1}  duration: {:.2}s  jitter: {:.1}  envelope: {:<12} loop: {}\r\n",
        state.engine.strategy().name(),
        settings.density,
        settings.duration,
        state.engine.jitter(),
        settings.envelope.name(),
        if settings.looping { "on " } else { "off" },
    )?;
    write!(
        stdout,
        "speed: {:.2}x  grains: {:>2}  level: {:.2}\r\n",
        settings.speed,
        state.engine.active_grain_count(),
        state.peak,
    )?;
    write!(
        stdout,
        "1/2/3=strategy  UP/DOWN=density  LEFT/RIGHT=duration  J/K=jitter  S/X=speed  E=envelope  L=loop  SPACE=fire  Q=quit"
    )?;
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    run_live_demo(
        AudioState::new()?,
        SAMPLE_RATE,
        |state| draw_ui(&state.lock().unwrap()),
        |state, key_event: &KeyEvent| {
            if key_event.kind != KeyEventKind::Press {
                return Ok(KeyAction::Continue);
            }
            if is_quit_key(key_event.code) {
                return Ok(KeyAction::Exit);
            }

            let mut state = state.lock().unwrap();
            state.handle_key(key_event.code);
            draw_ui(&state)?;
            Ok(KeyAction::Continue)
        },
    )?;

    println!("\nGoodbye!");
    Ok(())
}
