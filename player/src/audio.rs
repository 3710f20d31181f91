//! Audio output using cpal and ring buffer, and WAV loading for the sound bank

use std::path::Path;

use anyhow::{Context, Result};
use cardhost_core::{SoundBank, SoundClip};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};
use tracing::{debug, error};

use crate::config::AudioConfig;

/// Ring buffer size in samples (~100ms of stereo at 44.1kHz)
const RING_BUFFER_SIZE: usize = 8820;

/// Keep about this many frames queued ahead of the device
const TARGET_LATENCY_FRAMES: usize = 2205;

/// Audio output using cpal and ring buffer
pub struct AudioOutput {
    /// Producer side of the ring buffer (main thread writes here)
    producer: ringbuf::HeapProd<f32>,
    /// The cpal stream (kept alive for the duration)
    _stream: cpal::Stream,
    sample_rate: u32,
    scratch: Vec<f32>,
}

impl AudioOutput {
    /// Open the default output device as an interleaved stereo stream
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .context("No audio output device available")?;

        let supported = device
            .default_output_config()
            .context("Failed to get default output config")?;

        let sample_rate = supported.sample_rate().0;
        let sample_format = supported.sample_format();
        let mut config: cpal::StreamConfig = supported.into();
        config.channels = 2;

        let ring = HeapRb::<f32>::new(RING_BUFFER_SIZE);
        let (producer, mut consumer) = ring.split();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let popped = consumer.pop_slice(data);
                    data[popped..].fill(0.0);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I16 => {
                let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
                device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        if temp_buffer.len() < data.len() {
                            temp_buffer.resize(data.len(), 0.0);
                        }
                        let popped = consumer.pop_slice(&mut temp_buffer[..data.len()]);
                        for (out, &f) in data.iter_mut().zip(&temp_buffer[..popped]) {
                            *out = (f * 32767.0).clamp(-32768.0, 32767.0) as i16;
                        }
                        data[popped..].fill(0);
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )
            }
            cpal::SampleFormat::U16 => {
                let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
                device.build_output_stream(
                    &config,
                    move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                        if temp_buffer.len() < data.len() {
                            temp_buffer.resize(data.len(), 0.0);
                        }
                        let popped = consumer.pop_slice(&mut temp_buffer[..data.len()]);
                        for (out, &f) in data.iter_mut().zip(&temp_buffer[..popped]) {
                            *out = (f * 32767.0 + 32768.0).clamp(0.0, 65535.0) as u16;
                        }
                        // 0x8000 is silence for u16 audio
                        data[popped..].fill(32768);
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )
            }
            other => anyhow::bail!("Unsupported sample format: {:?}", other),
        }
        .context("Failed to build audio stream")?;

        stream.play().context("Failed to play audio stream")?;

        debug!("Audio stream started at {} Hz", sample_rate);

        Ok(Self {
            producer,
            _stream: stream,
            sample_rate,
            scratch: Vec::with_capacity(RING_BUFFER_SIZE),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Top the ring buffer up from `render`
    ///
    /// `render(frames, out)` appends that many interleaved stereo frames.
    pub fn fill(&mut self, render: impl FnOnce(usize, &mut Vec<f32>)) {
        let queued_frames = self.producer.occupied_len() / 2;
        let wanted = TARGET_LATENCY_FRAMES.saturating_sub(queued_frames);
        let frames = wanted.min(self.producer.vacant_len() / 2);
        if frames == 0 {
            return;
        }
        self.scratch.clear();
        render(frames, &mut self.scratch);
        self.push_samples_from_scratch();
    }

    fn push_samples_from_scratch(&mut self) {
        let pushed = self.producer.push_slice(&self.scratch);
        if pushed < self.scratch.len() {
            debug!(
                "Audio buffer overflow: dropped {} samples",
                self.scratch.len() - pushed
            );
        }
    }
}

/// Decode a WAV file into a clip
pub fn load_wav(path: &Path) -> Result<SoundClip> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();
    anyhow::ensure!(
        (1..=2).contains(&spec.channels),
        "{}: {} channels (only mono and stereo are supported)",
        path.display(),
        spec.channels
    );

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("Failed to decode {}", path.display()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?
        }
    };

    Ok(SoundClip::new(samples, spec.channels, spec.sample_rate))
}

/// Build the sound bank from configuration
///
/// Relative paths are resolved against `asset_dir`. Sounds that fail to load
/// are skipped with a warning; the engine's triggers for them become no-ops.
pub fn load_sound_bank(config: &AudioConfig, asset_dir: &Path) -> SoundBank {
    let mut bank = SoundBank::new();
    for (name, sound) in &config.sounds {
        let path = asset_dir.join(&sound.path);
        match load_wav(&path) {
            Ok(clip) => {
                debug!("Loaded sound '{}' from {}", name, path.display());
                bank.insert(name.clone(), clip.with_playback_rate(sound.playback_rate));
            }
            Err(e) => tracing::warn!("Sound '{}' unavailable: {:#}", name, e),
        }
    }
    bank
}
