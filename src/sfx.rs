//! Procedural sound effects, built as fundsp graphs and detached onto the
//! rodio output mixer. No output device just means a silent game.

use fundsp::prelude::*;
use rodio::{self, Sink, mixer::Mixer};
use std::time::Duration;

/// Short rising blip for a scored point.
pub fn play_score(mixer: &Mixer) {
    let sink = Sink::connect_new(mixer);

    // Frequency ramp (620Hz to 930Hz over 0.06s)
    let freq = lfo(|t: f64| lerp11(620.0, 930.0, (t / 0.06).min(1.0)));

    // Gain ramp (0.12 to 0.0 over 0.12s)
    let gain = lfo(|t: f64| lerp11(0.12, 0.0, (t / 0.12).min(1.0)));

    let sound = freq >> sine() >> mul(gain);

    // fundsp uses 44.1kHz by default
    let source = rodio::source::from_iter(sound.take(44100 * 0.15))
        .convert_samples::<f32>()
        .periodic_samples(Duration::from_secs_f32(1.0 / 44100.0), 1);

    sink.append(source);
    sink.detach(); // Play in background
}

/// Falling sawtooth slide for the game-over hit.
pub fn play_death(mixer: &Mixer) {
    let sink = Sink::connect_new(mixer);

    // Frequency ramp (400Hz to 70Hz over 0.45s)
    let freq = lfo(|t: f64| lerp11(400.0, 70.0, (t / 0.45).min(1.0)));

    // Gain ramp (0.15 to 0.0 over 0.5s)
    let gain = lfo(|t: f64| lerp11(0.15, 0.0, (t / 0.5).min(1.0)));

    let sound = freq >> saw() >> mul(gain);

    let source = rodio::source::from_iter(sound.take(44100 * 0.5))
        .convert_samples::<f32>()
        .periodic_samples(Duration::from_secs_f32(1.0 / 44100.0), 1);

    sink.append(source);
    sink.detach();
}
