//! Named sound clips and the voice mixer behind `play_sound`
//!
//! Clips are decoded once at startup and registered by name. The module only
//! ever names a clip; the mixer turns triggered clips into interleaved stereo
//! samples that the player pushes to the audio device after each tick.

use std::sync::Arc;

use hashbrown::HashMap;

/// Default output sample rate
pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;

/// Simultaneous voices; the oldest voice is dropped beyond this
pub const MAX_VOICES: usize = 16;

/// A decoded clip: interleaved f32 samples
#[derive(Debug, Clone)]
pub struct SoundClip {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
    playback_rate: f32,
}

impl SoundClip {
    /// `samples` are interleaved across `channels` (1 or 2)
    pub fn new(samples: impl Into<Arc<[f32]>>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            channels: channels.clamp(1, 2),
            sample_rate,
            playback_rate: 1.0,
        }
    }

    /// Play faster (>1) or slower (<1); pitch shifts with speed
    pub fn with_playback_rate(mut self, rate: f32) -> Self {
        self.playback_rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
        self
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    /// Number of sample frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Stereo frame at `frame`; mono is duplicated
    fn frame(&self, frame: usize) -> (f32, f32) {
        match self.channels {
            1 => {
                let s = self.samples[frame];
                (s, s)
            }
            _ => {
                let i = frame * 2;
                (self.samples[i], self.samples[i + 1])
            }
        }
    }
}

/// Name to clip table
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    clips: HashMap<String, SoundClip>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, clip: SoundClip) {
        self.clips.insert(name.into(), clip);
    }

    pub fn get(&self, name: &str) -> Option<&SoundClip> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(String::as_str)
    }
}

#[derive(Debug)]
struct Voice {
    clip: SoundClip,
    /// Fractional read position in clip frames
    position: f64,
}

/// Mixes triggered clips into interleaved stereo
#[derive(Debug)]
pub struct SoundMixer {
    voices: Vec<Voice>,
    output_rate: u32,
    volume: f32,
}

impl Default for SoundMixer {
    fn default() -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            output_rate: OUTPUT_SAMPLE_RATE,
            volume: 1.0,
        }
    }
}

impl SoundMixer {
    /// Start playing `clip` from the beginning
    pub fn trigger(&mut self, clip: &SoundClip) {
        if clip.frames() == 0 {
            return;
        }
        if self.voices.len() == MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice {
            clip: clip.clone(),
            position: 0.0,
        });
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    pub fn set_output_rate(&mut self, rate: u32) {
        self.output_rate = rate.max(1);
    }

    /// Append `frames` stereo frames to `out`, advancing every voice
    ///
    /// Finished voices are dropped. With no voices the output is silence.
    pub fn render(&mut self, frames: usize, out: &mut Vec<f32>) {
        let start = out.len();
        out.resize(start + frames * 2, 0.0);
        let buffer = &mut out[start..];
        let output_rate = f64::from(self.output_rate);

        for voice in &mut self.voices {
            let step = f64::from(voice.clip.sample_rate) * f64::from(voice.clip.playback_rate)
                / output_rate;
            let len = voice.clip.frames();
            for frame in buffer.chunks_exact_mut(2) {
                let index = voice.position as usize;
                if index >= len {
                    break;
                }
                let (left, right) = voice.clip.frame(index);
                frame[0] += left;
                frame[1] += right;
                voice.position += step;
            }
        }

        self.voices
            .retain(|voice| (voice.position as usize) < voice.clip.frames());

        for sample in buffer {
            *sample = (*sample * self.volume).clamp(-1.0, 1.0);
        }
    }
}
