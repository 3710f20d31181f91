//! WASM engine wrapper for loading and compiling modules

use anyhow::{Context, Result};
use wasmtime::{Engine, ExternType, Module};

use super::state::WASM_PAGE_SIZE;

/// Shared WASM engine (one per application)
pub struct WasmEngine {
    engine: Engine,
}

impl WasmEngine {
    /// Create a new WASM engine with default configuration
    pub fn new() -> Result<Self> {
        let engine = Engine::default();
        Ok(Self { engine })
    }

    /// Get a reference to the underlying wasmtime engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Load a WASM module from bytes
    pub fn load_module(&self, bytes: &[u8]) -> Result<Module> {
        Module::new(&self.engine, bytes).context("Failed to compile WASM module")
    }

    /// Validate that a module's memory requirements fit the host RAM limit
    ///
    /// Checks both exported memories and memories the module expects the
    /// host to allocate. Call this before instantiating so the user gets a
    /// clear message instead of an opaque instantiation failure.
    pub fn validate_module_memory(module: &Module, ram_limit: usize) -> Result<()> {
        let exported = module.exports().map(|e| (e.name().to_string(), e.ty()));
        let imported = module
            .imports()
            .map(|i| (format!("{}.{}", i.module(), i.name()), i.ty()));

        for (name, ty) in exported.chain(imported) {
            if let ExternType::Memory(mem_type) = ty {
                let min_pages = mem_type.minimum();
                let min_bytes = min_pages as usize * WASM_PAGE_SIZE;

                if min_bytes > ram_limit {
                    anyhow::bail!(
                        "Memory '{}' requires {} bytes ({} pages) minimum, \
                         but the host only allows {} bytes",
                        name,
                        min_bytes,
                        min_pages,
                        ram_limit
                    );
                }

                if mem_type.maximum().is_none() {
                    tracing::debug!(
                        "Memory '{}' has no maximum declared; host will limit to {} bytes",
                        name,
                        ram_limit
                    );
                }
            }
        }
        Ok(())
    }
}

// NOTE: WasmEngine intentionally does not implement Default.
// Engine creation is fallible on unsupported platforms, so construction goes
// through WasmEngine::new() which returns Result<Self>.
