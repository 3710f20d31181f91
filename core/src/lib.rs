//! Cardhost Core - host interop layer for the solitaire engine
//!
//! This crate loads the engine's WebAssembly module, injects the host
//! capabilities it imports, and keeps the module's view of input, display
//! mode and framebuffer consistent with the host window.
//!
//! # Architecture
//!
//! - [`WasmEngine`] / [`ModuleInstance`] - wasmtime wrapper with the resolved export table
//! - [`FramebufferView`] - bounds-checked window into linear memory
//! - [`InputSynchronizer`] - pointer messages to ordered module calls
//! - [`DisplayController`] - windowed/fullscreen state machine
//! - [`FrameDriver`] - one tick per host redraw
//! - [`Session`] - owns all of the above for one running module
//!
//! Nothing here touches a window, GPU or audio device. Those are reached
//! through [`Presenter`], [`DisplayHost`] and the [`SoundMixer`] output.

pub mod display;
pub mod driver;
pub mod error;
pub mod ffi;
pub mod input;
#[cfg(test)]
mod integration;
pub mod presenter;
pub mod session;
pub mod sound;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod wasm;

pub use display::{DisplayController, DisplayHost, DisplayMode, DisplayTarget, DisplayTransition, SurfaceSize};
pub use driver::{DriverConfig, FrameDriver, TickReport};
pub use error::StartupError;
pub use input::{ButtonMask, InputCall, InputSink, InputState, InputSynchronizer, MouseButton, PointerEvent};
pub use presenter::{Frame, NullPresenter, Presenter};
pub use session::{HostServices, Session, SessionConfig};
pub use sound::{SoundBank, SoundClip, SoundMixer};
pub use wasm::{
    BYTES_PER_PIXEL, DEFAULT_RAM_LIMIT, FramebufferError, FramebufferView, HostContext,
    ModuleInstance, WasmEngine,
};
