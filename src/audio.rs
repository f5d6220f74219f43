//! Microphone level detection.
//!
//! A [`LevelSource`] yields one normalized volume sample per tick. The real
//! implementation captures from the default cpal input device; when no
//! device can be opened the factory hands back a [`NullSource`] and the game
//! plays on under gravity alone (spacebar still works).

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig};
use log::{debug, warn};

use crate::config::Config;

/// Raw volume is measured on the i16 amplitude scale, whatever the device
/// sample format, so the threshold keeps one meaning everywhere.
const I16_SCALE: f32 = 32768.0;

/// Pending magnitudes are capped so a stalled poll loop cannot grow the
/// buffer without bound.
const MAX_PENDING: usize = 16 * 1024;

/// A per-tick source of normalized volume levels.
pub trait LevelSource {
    /// One volume sample: 0.0 (silence/below threshold) to 2.0 (very loud).
    fn poll(&mut self) -> f32;
    /// Most recent raw mean amplitude, for the meter and diagnostics.
    fn last_raw_volume(&self) -> f32;
    /// False when running on the null fallback.
    fn is_available(&self) -> bool;
    /// Release the capture stream. Best-effort and idempotent.
    fn close(&mut self);
}

/// Map a raw mean amplitude to the control level: silence below the
/// threshold, then linear up to a cap of 2.0 at three times the threshold.
pub fn normalize_level(raw: f32, threshold: f32) -> f32 {
    if raw < threshold {
        0.0
    } else {
        ((raw - threshold) / threshold).min(2.0)
    }
}

/// Open the microphone, falling back to the null source on any failure.
/// Failures are logged once and never retried mid-session.
pub fn open(config: &Config) -> Box<dyn LevelSource> {
    match CaptureSource::open(config) {
        Ok(source) => Box::new(source),
        Err(reason) => {
            warn!("microphone unavailable ({reason}); falling back to spacebar control");
            Box::new(NullSource)
        }
    }
}

/// Null object: always silent, always "unavailable".
pub struct NullSource;

impl LevelSource for NullSource {
    fn poll(&mut self) -> f32 {
        0.0
    }

    fn last_raw_volume(&self) -> f32 {
        0.0
    }

    fn is_available(&self) -> bool {
        false
    }

    fn close(&mut self) {}
}

/// Live microphone capture. The cpal callback pushes sample magnitudes into
/// a shared buffer; [`poll`](LevelSource::poll) drains it once per tick and
/// averages. That drain is the only audio touch per frame.
pub struct CaptureSource {
    stream: Option<cpal::Stream>,
    pending: Arc<Mutex<Vec<f32>>>,
    last_raw: f32,
    threshold: f32,
}

impl CaptureSource {
    fn open(config: &Config) -> Result<Self, String> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| "no input device".to_string())?;
        let supported = device
            .default_input_config()
            .map_err(|e| format!("no supported input config: {e}"))?;
        let format = supported.sample_format();

        let pending = Arc::new(Mutex::new(Vec::new()));

        // Ask for mono capture at the configured rate and chunk size first;
        // not every backend honors a fixed buffer, so retry with the
        // device's own default config.
        let requested = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(config.sample_rate),
            buffer_size: BufferSize::Fixed(config.chunk_size),
        };
        let stream = build_stream(&device, &requested, format, Arc::clone(&pending))
            .or_else(|e| {
                debug!("requested capture config rejected ({e}); using device default");
                build_stream(&device, &supported.config(), format, Arc::clone(&pending))
            })
            .map_err(|e| format!("failed to build input stream: {e}"))?;

        stream.play().map_err(|e| format!("failed to start input stream: {e}"))?;
        debug!(
            "microphone open: {} ({format:?})",
            device.name().unwrap_or_else(|_| "unknown device".into())
        );

        Ok(Self {
            stream: Some(stream),
            pending,
            last_raw: 0.0,
            threshold: config.sound_threshold,
        })
    }
}

impl LevelSource for CaptureSource {
    fn poll(&mut self) -> f32 {
        let captured = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            // A panicked callback counts as a failed read: silent tick.
            Err(_) => return 0.0,
        };
        if !captured.is_empty() {
            self.last_raw = captured.iter().sum::<f32>() / captured.len() as f32;
        }
        normalize_level(self.last_raw, self.threshold)
    }

    fn last_raw_volume(&self) -> f32 {
        self.last_raw
    }

    fn is_available(&self) -> bool {
        self.stream.is_some()
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
        }
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Push magnitudes (i16 scale) from whatever sample format the device speaks.
fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    format: SampleFormat,
    pending: Arc<Mutex<Vec<f32>>>,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    let err_fn = |err| warn!("input stream error: {err}");
    match format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                push_magnitudes(&pending, data.iter().map(|s| s.abs() * I16_SCALE));
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                push_magnitudes(&pending, data.iter().map(|s| (*s as f32).abs()));
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                push_magnitudes(&pending, data.iter().map(|s| (*s as f32 - 32768.0).abs()));
            },
            err_fn,
            None,
        ),
        other => {
            debug!("unsupported sample format {other:?}");
            Err(cpal::BuildStreamError::StreamConfigNotSupported)
        }
    }
}

fn push_magnitudes(pending: &Mutex<Vec<f32>>, magnitudes: impl Iterator<Item = f32>) {
    if let Ok(mut buf) = pending.lock() {
        buf.extend(magnitudes);
        if buf.len() > MAX_PENDING {
            let excess = buf.len() - MAX_PENDING;
            buf.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f32 = 300.0;

    #[test]
    fn below_threshold_is_silence() {
        assert_eq!(normalize_level(0.0, THRESHOLD), 0.0);
        assert_eq!(normalize_level(299.9, THRESHOLD), 0.0);
    }

    #[test]
    fn above_threshold_maps_linearly() {
        assert_eq!(normalize_level(300.0, THRESHOLD), 0.0);
        assert_eq!(normalize_level(450.0, THRESHOLD), 0.5);
        assert_eq!(normalize_level(600.0, THRESHOLD), 1.0);
        assert_eq!(normalize_level(900.0, THRESHOLD), 2.0);
    }

    #[test]
    fn very_loud_caps_at_two() {
        assert_eq!(normalize_level(3000.0, THRESHOLD), 2.0);
        assert_eq!(normalize_level(f32::MAX, THRESHOLD), 2.0);
    }

    #[test]
    fn null_source_is_silent_and_unavailable() {
        let mut source = NullSource;
        assert_eq!(source.poll(), 0.0);
        assert_eq!(source.last_raw_volume(), 0.0);
        assert!(!source.is_available());
    }

    #[test]
    fn close_is_idempotent() {
        let mut null = NullSource;
        null.close();
        null.close();

        let mut capture = CaptureSource {
            stream: None,
            pending: Arc::new(Mutex::new(Vec::new())),
            last_raw: 0.0,
            threshold: THRESHOLD,
        };
        capture.close();
        capture.close();
        assert!(!capture.is_available());
    }

    #[test]
    fn poll_averages_pending_magnitudes() {
        let mut capture = CaptureSource {
            stream: None,
            pending: Arc::new(Mutex::new(vec![600.0, 600.0, 600.0, 600.0])),
            last_raw: 0.0,
            threshold: THRESHOLD,
        };
        assert_eq!(capture.poll(), 1.0);
        assert_eq!(capture.last_raw_volume(), 600.0);
        // Nothing new captured: the last reading stands.
        assert_eq!(capture.poll(), 1.0);
    }

    #[test]
    fn pending_buffer_is_bounded() {
        let pending = Mutex::new(Vec::new());
        push_magnitudes(&pending, std::iter::repeat(1.0).take(MAX_PENDING * 2));
        assert_eq!(pending.lock().unwrap().len(), MAX_PENDING);
    }
}
