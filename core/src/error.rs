//! Startup error taxonomy
//!
//! Everything that can go wrong before the first tick is fatal: the caller
//! reports it and never schedules the frame driver.

use thiserror::Error;

/// Fatal failure while loading, linking or initializing the engine module
#[derive(Debug, Error)]
pub enum StartupError {
    /// wasmtime rejected the bytes
    #[error("failed to compile WASM module")]
    Compile(#[source] anyhow::Error),

    /// Module declares more memory than the host allows
    #[error("module memory requirements rejected")]
    Memory(#[source] anyhow::Error),

    /// Host capability table could not be registered
    #[error("failed to register host imports")]
    Link(#[source] anyhow::Error),

    /// Import resolution, start function or memory allocation failed
    #[error("failed to instantiate WASM module")]
    Instantiate(#[source] anyhow::Error),

    /// Module neither exports nor imports a linear memory
    #[error("module has no linear memory")]
    MissingMemory,

    /// A required entry point is absent under every accepted name
    #[error("module does not export `{entry}` (accepted names: {accepted})")]
    MissingExport {
        entry: &'static str,
        accepted: String,
    },

    /// An entry point exists but with a signature the host cannot call
    #[error("module export `{name}` has an unexpected signature")]
    BadSignature {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The module's `init` trapped or produced an unusable framebuffer
    #[error("module init({width}, {height}) failed")]
    Init {
        width: u32,
        height: u32,
        #[source]
        source: anyhow::Error,
    },
}
