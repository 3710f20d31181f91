//! Engine instance implementation for the loaded WASM module

use anyhow::{Context, Result};
use wasmtime::{ExternType, Instance, Linker, Memory, Module, Store};

use super::engine::WasmEngine;
use super::exports::ModuleExports;
use super::framebuffer::{FramebufferError, FramebufferView};
use super::state::HostContext;
use crate::display::{DisplayTarget, SurfaceSize};
use crate::error::StartupError;
use crate::ffi::register_host_ffi;
use crate::input::{InputSink, InputState, MouseButton};

/// A loaded and instantiated engine module
pub struct ModuleInstance {
    store: Store<HostContext>,
    /// The WASM instance.
    /// Not used after export resolution, but kept alive alongside the
    /// exported functions and memory it owns.
    #[allow(dead_code)]
    instance: Instance,
    exports: ModuleExports,
}

impl ModuleInstance {
    /// Link the host capabilities and instantiate `module`
    ///
    /// If the module imports its linear memory, the host allocates it with
    /// the module's declared limits; otherwise the exported `memory` is used.
    pub fn new(
        engine: &WasmEngine,
        module: &Module,
        context: HostContext,
    ) -> Result<Self, StartupError> {
        let mut store = Store::new(engine.engine(), context);

        // Enforces the RAM limit and tracks memory generations
        store.limiter(|state| &mut state.limits);

        let mut linker = Linker::new(engine.engine());
        register_host_ffi(&mut linker).map_err(StartupError::Link)?;
        let host_memory =
            define_imported_memory(&mut linker, &mut store, module).map_err(StartupError::Instantiate)?;

        let instance = linker
            .instantiate(&mut store, module)
            .context("Failed to instantiate WASM module")
            .map_err(StartupError::Instantiate)?;

        let memory = host_memory
            .or_else(|| instance.get_memory(&mut store, "memory"))
            .ok_or(StartupError::MissingMemory)?;
        store.data_mut().memory = Some(memory);

        let exports = ModuleExports::resolve(instance, &mut store)?;

        Ok(Self {
            store,
            instance,
            exports,
        })
    }

    /// Call the module's init entry point
    ///
    /// Must run once before any input or tick call.
    pub fn init(&mut self, size: SurfaceSize) -> Result<()> {
        self.begin_dimension_change(size);
        let returned = self
            .exports
            .init(&mut self.store, size)
            .with_context(|| format!("WASM init({}, {}) failed", size.width, size.height))?;
        self.rebuild_view(returned)
    }

    /// Call the module's resize entry point and rebuild the framebuffer view
    ///
    /// The view is discarded before the call; on failure no view remains.
    pub fn resize(&mut self, size: SurfaceSize) -> Result<()> {
        anyhow::ensure!(
            self.exports.has_resize(),
            "Module does not export resize; cannot change to {}x{}",
            size.width,
            size.height
        );
        self.begin_dimension_change(size);
        let returned = self
            .exports
            .resize(&mut self.store, size)
            .with_context(|| format!("WASM resize({}, {}) failed", size.width, size.height))?;
        self.rebuild_view(returned)
    }

    /// Tell the module whether it is presented fullscreen
    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        let exported = self
            .exports
            .set_fullscreen(&mut self.store, fullscreen)
            .with_context(|| format!("WASM set_fullscreen({}) failed", fullscreen))?;
        if !exported {
            tracing::debug!("Module does not export set_fullscreen; mode change not forwarded");
        }
        self.revalidate_view()
    }

    /// Call the module's tick entry point
    ///
    /// Modules that take input as tick arguments get `input` and the current
    /// timestamp, and the host presents their framebuffer afterwards. If
    /// linear memory grew the view is re-derived before returning.
    pub fn tick(&mut self, input: InputState) -> Result<()> {
        self.exports
            .tick(&mut self.store, input)
            .context("WASM tick() failed")?;
        self.revalidate_view()?;
        if self.exports.ticks_with_input()
            && let Err(e) = self.present_view()
        {
            tracing::debug!("No frame presented after tick: {}", e);
        }
        Ok(())
    }

    /// Current framebuffer view, if the module has told us where it is
    pub fn view(&self) -> Option<FramebufferView> {
        self.store.data().view
    }

    /// Pixels of the current view, validated against the current memory
    pub fn framebuffer_bytes(&self) -> Result<&[u8], FramebufferError> {
        let ctx = self.store.data();
        let memory = ctx.memory.ok_or(FramebufferError::NoMemory)?;
        let view = ctx.view.ok_or(FramebufferError::NoView)?;
        view.bytes(memory.data(&self.store), ctx.memory_generation())
    }

    /// Linear memory size in bytes
    pub fn memory_size(&self) -> usize {
        self.memory()
            .map(|memory| memory.data_size(&self.store))
            .unwrap_or(0)
    }

    /// Dimensions the module was last initialized or resized to
    pub fn surface(&self) -> SurfaceSize {
        self.store.data().surface
    }

    /// Take a fullscreen change the module asked for during its last call
    pub fn take_fullscreen_request(&mut self) -> Option<bool> {
        self.store.data_mut().fullscreen_request.take()
    }

    /// Get reference to the host context
    pub fn context(&self) -> &HostContext {
        self.store.data()
    }

    /// Get mutable reference to the host context
    pub fn context_mut(&mut self) -> &mut HostContext {
        self.store.data_mut()
    }

    /// Get reference to the store
    pub fn store(&self) -> &Store<HostContext> {
        &self.store
    }

    /// Get mutable reference to the store
    pub fn store_mut(&mut self) -> &mut Store<HostContext> {
        &mut self.store
    }

    fn memory(&self) -> Option<Memory> {
        self.store.data().memory
    }

    fn begin_dimension_change(&mut self, size: SurfaceSize) {
        let ctx = self.store.data_mut();
        ctx.surface = size;
        ctx.view = None;
    }

    /// Derive the view from an entry point's return value or the accessor
    fn rebuild_view(&mut self, returned: Option<u32>) -> Result<()> {
        let offset = match returned {
            Some(offset) => Some(offset),
            None => self
                .exports
                .framebuffer(&mut self.store)
                .context("WASM framebuffer() failed")?,
        };

        let view = match offset {
            Some(offset) => Some(self.build_view(offset)?),
            None => {
                // Only a publication during this call can have set a view
                let ctx = self.store.data();
                let published = ctx
                    .view
                    .filter(|view| view.is_current(ctx.memory_generation()));
                if published.is_none() {
                    tracing::debug!("Framebuffer location unknown until the module publishes a frame");
                }
                published
            }
        };
        self.store.data_mut().view = view;
        Ok(())
    }

    /// Drop a view that memory growth made stale, re-deriving it from the
    /// accessor if the module has one
    fn revalidate_view(&mut self) -> Result<()> {
        let generation = self.store.data().memory_generation();
        match self.view() {
            Some(view) if !view.is_current(generation) => {}
            _ => return Ok(()),
        }
        tracing::debug!("Linear memory grew (generation {}); invalidating framebuffer view", generation);
        self.store.data_mut().view = None;
        if self.exports.has_framebuffer_accessor() {
            self.rebuild_view(None)?;
        }
        Ok(())
    }

    /// Copy the current view out of linear memory and present it
    fn present_view(&mut self) -> Result<(), FramebufferError> {
        let view = self.view().ok_or(FramebufferError::NoView)?;
        let mut pixels = self.store.data_mut().take_scratch();
        pixels.clear();
        match self.framebuffer_bytes() {
            Ok(bytes) => pixels.extend_from_slice(bytes),
            Err(e) => {
                self.store.data_mut().restore_scratch(pixels);
                return Err(e);
            }
        }
        self.store.data_mut().present(view, pixels);
        Ok(())
    }

    fn build_view(&self, offset: u32) -> Result<FramebufferView> {
        let ctx = self.store.data();
        let size = ctx.surface;
        let view = FramebufferView::new(
            offset,
            size.width,
            size.height,
            ctx.memory_generation(),
            self.memory_size(),
        )?;
        Ok(view)
    }

    #[cfg(test)]
    pub(crate) fn call_i32(&mut self, name: &str, args: &[i32]) -> Result<i32> {
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .with_context(|| format!("Export '{}' not found", name))?;
        let params: Vec<wasmtime::Val> = args.iter().map(|&a| wasmtime::Val::I32(a)).collect();
        let mut results = [wasmtime::Val::I32(0)];
        func.call(&mut self.store, &params, &mut results)?;
        results[0].i32().context("Export did not return i32")
    }

    #[cfg(test)]
    pub(crate) fn call_unit(&mut self, name: &str, args: &[i32]) -> Result<()> {
        let func = self
            .instance
            .get_func(&mut self.store, name)
            .with_context(|| format!("Export '{}' not found", name))?;
        let params: Vec<wasmtime::Val> = args.iter().map(|&a| wasmtime::Val::I32(a)).collect();
        func.call(&mut self.store, &params, &mut [])
    }
}

impl InputSink for ModuleInstance {
    fn update_mouse_inside(&mut self, inside: bool) -> Result<()> {
        self.exports
            .update_mouse_inside(&mut self.store, inside)
            .with_context(|| format!("WASM update_mouse_inside({}) failed", inside))?;
        self.revalidate_view()
    }

    fn update_mouse_position(&mut self, x: i32, y: i32) -> Result<()> {
        self.exports
            .update_mouse_position(&mut self.store, x, y)
            .with_context(|| format!("WASM update_mouse_position({}, {}) failed", x, y))?;
        self.revalidate_view()
    }

    fn update_mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
        self.exports
            .update_mouse_button(&mut self.store, button.index(), pressed)
            .with_context(|| format!("WASM update_mouse_button({:?}, {}) failed", button, pressed))?;
        self.revalidate_view()
    }
}

impl DisplayTarget for ModuleInstance {
    fn resize(&mut self, size: SurfaceSize) -> Result<()> {
        ModuleInstance::resize(self, size)
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        ModuleInstance::set_fullscreen(self, fullscreen)
    }
}

/// Allocate and define the linear memory if the module imports one
fn define_imported_memory(
    linker: &mut Linker<HostContext>,
    store: &mut Store<HostContext>,
    module: &Module,
) -> Result<Option<Memory>> {
    for import in module.imports() {
        if let ExternType::Memory(ty) = import.ty() {
            let memory = Memory::new(&mut *store, ty)
                .with_context(|| format!("Failed to allocate {}.{}", import.module(), import.name()))?;
            linker.define(&*store, import.module(), import.name(), memory)?;
            tracing::debug!("Host allocated imported memory {}.{}", import.module(), import.name());
            return Ok(Some(memory));
        }
    }
    Ok(None)
}
