//! WASM runtime wrapper
//!
//! Provides abstractions over wasmtime for loading and executing the engine module.
//!
//! # Module Organization
//!
//! - [`engine`] - Shared wasmtime engine and module validation
//! - [`state`] - Store data: memory handle, clock, RNG, presentation and sound state
//! - [`exports`] - Entry point resolution across harness naming variants
//! - [`framebuffer`] - Bounds-checked framebuffer view
//! - [`instance`] - Instantiated module with lifecycle and input entry points

pub mod engine;
pub mod exports;
pub mod framebuffer;
pub mod instance;
pub mod state;


pub use engine::WasmEngine;
pub use exports::ModuleExports;
pub use framebuffer::{BYTES_PER_PIXEL, FramebufferError, FramebufferView};
pub use instance::ModuleInstance;
pub use state::{
    CONSOLE_HISTORY, DEFAULT_RAM_LIMIT, HostContext, MemoryLimits, WASM_PAGE_SIZE,
    read_bytes_from_memory,
};
