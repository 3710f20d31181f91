//! Store data for the engine module
//!
//! [`HostContext`] is the wasmtime store data. Every capability import reads
//! or mutates it through its `Caller`, and the host reaches it through
//! [`ModuleInstance`](super::ModuleInstance).

use std::collections::VecDeque;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use wasmtime::{AsContext, Memory, ResourceLimiter};

use super::framebuffer::FramebufferView;
use crate::display::SurfaceSize;
use crate::presenter::{Frame, Presenter};
use crate::sound::{SoundBank, SoundMixer};

/// WASM pages are 64KB
pub const WASM_PAGE_SIZE: usize = 65536;

/// Default linear memory limit (64MB)
///
/// Large enough for a 4K fullscreen framebuffer plus the engine's own heap.
pub const DEFAULT_RAM_LIMIT: usize = 64 * 1024 * 1024;

/// Number of module output lines retained for inspection
pub const CONSOLE_HISTORY: usize = 256;

/// Host state shared with capability imports
pub struct HostContext {
    /// Linear memory (set after instantiation)
    pub memory: Option<Memory>,

    /// Dimensions the module was last told about via init/resize
    pub surface: SurfaceSize,

    /// Current framebuffer view, if one is known
    pub view: Option<FramebufferView>,

    /// Number of frames handed to the presenter
    pub frames_presented: u64,

    /// Fullscreen change requested by the module, applied after the current call
    pub fullscreen_request: Option<bool>,

    /// Name to clip table for `play_sound`
    pub sounds: SoundBank,

    /// Voices started by `play_sound`
    pub mixer: SoundMixer,

    pub(crate) limits: MemoryLimits,
    started: Instant,
    rng: Pcg32,
    presenter: Box<dyn Presenter>,
    scratch: Vec<u8>,
    console: VecDeque<String>,
}

impl HostContext {
    /// Create a context with the default RAM limit and an entropy-seeded RNG
    pub fn new(presenter: Box<dyn Presenter>, sounds: SoundBank) -> Self {
        Self {
            memory: None,
            surface: SurfaceSize::default(),
            view: None,
            frames_presented: 0,
            fullscreen_request: None,
            sounds,
            mixer: SoundMixer::default(),
            limits: MemoryLimits::new(DEFAULT_RAM_LIMIT),
            started: Instant::now(),
            rng: Pcg32::seed_from_u64(rand::random()),
            presenter,
            scratch: Vec::new(),
            console: VecDeque::with_capacity(CONSOLE_HISTORY),
        }
    }

    /// Limit linear memory to `ram_limit` bytes
    pub fn with_ram_limit(mut self, ram_limit: usize) -> Self {
        self.limits.ram_limit = ram_limit;
        self
    }

    /// Use a fixed seed for `get_random_u32` (tests, reproducible deals)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    /// RAM limit enforced by the resource limiter
    pub fn ram_limit(&self) -> usize {
        self.limits.ram_limit
    }

    /// Bumped every time linear memory grows; views from older generations are stale
    pub fn memory_generation(&self) -> u64 {
        self.limits.generation
    }

    /// Milliseconds since the context was created
    pub fn timestamp_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Draw a fresh pseudo-random value
    pub fn next_random(&mut self) -> u32 {
        self.rng.next_u32()
    }

    /// Record a line of module output
    ///
    /// Valid UTF-8 is logged as text; anything else is logged as raw bytes.
    pub fn record_line(&mut self, bytes: &[u8]) {
        let line = match std::str::from_utf8(bytes) {
            Ok(text) => {
                tracing::info!(target: "module", "{}", text);
                text.to_string()
            }
            Err(e) => {
                tracing::warn!(target: "module", "Non-UTF-8 output ({}): {:02x?}", e, bytes);
                String::from_utf8_lossy(bytes).into_owned()
            }
        };
        if self.console.len() == CONSOLE_HISTORY {
            self.console.pop_front();
        }
        self.console.push_back(line);
    }

    /// Recent module output, oldest first
    pub fn console_lines(&self) -> impl Iterator<Item = &str> {
        self.console.iter().map(String::as_str)
    }

    /// Start the clip registered under `name`; unknown names are ignored
    pub fn trigger_sound(&mut self, name: &str) -> bool {
        match self.sounds.get(name) {
            Some(clip) => {
                self.mixer.trigger(clip);
                tracing::debug!("Playing sound '{}'", name);
                true
            }
            None => {
                tracing::trace!("Ignoring unmapped sound '{}'", name);
                false
            }
        }
    }

    /// Presenter receiving published frames
    pub fn presenter_mut(&mut self) -> &mut dyn Presenter {
        self.presenter.as_mut()
    }

    /// Take the scratch buffer used to copy frames out of linear memory
    pub(crate) fn take_scratch(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.scratch)
    }

    pub(crate) fn restore_scratch(&mut self, scratch: Vec<u8>) {
        self.scratch = scratch;
    }

    /// Hand a copied frame to the presenter and adopt its view as current
    pub(crate) fn present(&mut self, view: FramebufferView, pixels: Vec<u8>) {
        if let Some(previous) = self.view
            && previous.offset() != view.offset()
        {
            tracing::debug!(
                "Framebuffer moved from {:#x} to {:#x}",
                previous.offset(),
                view.offset()
            );
        }
        self.view = Some(view);
        self.presenter.present(&Frame {
            width: view.width(),
            height: view.height(),
            pixels: &pixels,
        });
        self.frames_presented += 1;
        self.scratch = pixels;
    }
}

/// Store limiter: RAM cap and growth counter
///
/// Store limiters must be `Send`; the rest of [`HostContext`] is not.
#[derive(Debug, Clone)]
pub struct MemoryLimits {
    ram_limit: usize,
    generation: u64,
}

impl MemoryLimits {
    pub fn new(ram_limit: usize) -> Self {
        Self {
            ram_limit,
            generation: 0,
        }
    }
}

impl ResourceLimiter for MemoryLimits {
    fn memory_growing(
        &mut self,
        current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> Result<bool> {
        if desired > self.ram_limit {
            tracing::warn!(
                "Module memory growth to {} bytes denied (limit {} bytes)",
                desired,
                self.ram_limit
            );
            return Ok(false);
        }
        if desired != current {
            self.generation += 1;
            tracing::trace!(
                "Linear memory grew {} -> {} bytes (generation {})",
                current,
                desired,
                self.generation
            );
        }
        Ok(true)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        _desired: usize,
        _maximum: Option<usize>,
    ) -> Result<bool> {
        Ok(true)
    }
}

/// Copy `len` bytes at `ptr` out of linear memory
pub fn read_bytes_from_memory(
    memory: Memory,
    store: impl AsContext,
    ptr: u32,
    len: u32,
) -> Result<Vec<u8>> {
    let data = memory.data(&store);
    let start = ptr as usize;
    let end = start
        .checked_add(len as usize)
        .context("Pointer + length overflows")?;
    let bytes = data.get(start..end).with_context(|| {
        format!(
            "Range {:#x}..{:#x} outside linear memory of {} bytes",
            start,
            end,
            data.len()
        )
    })?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_limits_are_send() {
        assert_send::<MemoryLimits>();
    }

    #[test]
    fn test_growth_counts_generations() {
        let mut limits = MemoryLimits::new(4 * WASM_PAGE_SIZE);
        assert!(limits.memory_growing(WASM_PAGE_SIZE, 2 * WASM_PAGE_SIZE, None).unwrap());
        assert!(limits.memory_growing(2 * WASM_PAGE_SIZE, 2 * WASM_PAGE_SIZE, None).unwrap());
        assert_eq!(limits.generation, 1);

        assert!(!limits.memory_growing(2 * WASM_PAGE_SIZE, 5 * WASM_PAGE_SIZE, None).unwrap());
        assert_eq!(limits.generation, 1);
    }
}
