//! Entry point resolution
//!
//! Three generations of engine builds exist, each exporting the same entry
//! points under different names. Each entry point is looked up under every
//! accepted name; the first name the module exports wins and must have a
//! callable signature.
//!
//! The oldest builds take input and time as `_frame` arguments and export no
//! mouse entry points; their tick resolves to [`TickEntry::WithInput`].

use anyhow::Result;
use wasmtime::{Instance, Store, TypedFunc};

use super::state::HostContext;
use crate::display::SurfaceSize;
use crate::error::StartupError;
use crate::input::{InputState, MouseButton};

pub const INIT_EXPORTS: &[&str] = &["init", "wasm__init", "_init"];
pub const TICK_EXPORTS: &[&str] = &["tick", "wasm__frame", "_frame"];
pub const RESIZE_EXPORTS: &[&str] = &["resize", "wasm__resize", "_resize"];
pub const SET_FULLSCREEN_EXPORTS: &[&str] =
    &["set_fullscreen", "wasm__set_fullscreen", "_fullscreen_mode"];
pub const MOUSE_POSITION_EXPORTS: &[&str] =
    &["update_mouse_position", "wasm__update_mouse_position"];
pub const MOUSE_INSIDE_EXPORTS: &[&str] = &["update_mouse_inside", "wasm__update_mouse_inside"];
pub const MOUSE_BUTTON_EXPORTS: &[&str] =
    &["update_mouse_button", "wasm__update_mouse_button_state"];
pub const FRAMEBUFFER_EXPORTS: &[&str] = &["framebuffer", "get_framebuffer"];

/// `init`/`resize` shape: dimensions in, framebuffer pointer optionally out
enum DimensionsEntry {
    Returning(TypedFunc<(u32, u32), u32>),
    Plain(TypedFunc<(u32, u32), ()>),
}

impl DimensionsEntry {
    fn lookup(instance: Instance, store: &mut Store<HostContext>, name: &str) -> Result<Self> {
        match instance.get_typed_func::<(u32, u32), u32>(&mut *store, name) {
            Ok(func) => Ok(Self::Returning(func)),
            Err(_) => instance
                .get_typed_func::<(u32, u32), ()>(&mut *store, name)
                .map(Self::Plain),
        }
    }

    fn call(&self, store: &mut Store<HostContext>, size: SurfaceSize) -> Result<Option<u32>> {
        let params = (size.width, size.height);
        match self {
            Self::Returning(func) => func.call(store, params).map(Some),
            Self::Plain(func) => func.call(store, params).map(|()| None),
        }
    }
}

/// `tick` shape
pub enum TickEntry {
    /// `tick()`: input arrives through the mouse entry points
    Plain(TypedFunc<(), ()>),
    /// `_frame(x, y, inside, primary_pressed, timestamp_ms)`
    WithInput(TypedFunc<(i32, i32, i32, i32, f64), ()>),
}

impl TickEntry {
    fn lookup(instance: Instance, store: &mut Store<HostContext>, name: &str) -> Result<Self> {
        match instance.get_typed_func::<(), ()>(&mut *store, name) {
            Ok(func) => Ok(Self::Plain(func)),
            Err(_) => instance
                .get_typed_func::<(i32, i32, i32, i32, f64), ()>(&mut *store, name)
                .map(Self::WithInput),
        }
    }
}

/// Resolved export table of an instantiated engine module
pub struct ModuleExports {
    init: DimensionsEntry,
    tick: TickEntry,
    resize: Option<DimensionsEntry>,
    set_fullscreen: Option<TypedFunc<u32, ()>>,
    update_mouse_position: Option<TypedFunc<(i32, i32), ()>>,
    update_mouse_inside: Option<TypedFunc<u32, ()>>,
    update_mouse_button: Option<TypedFunc<(u32, u32), ()>>,
    framebuffer: Option<TypedFunc<(), u32>>,
}

impl ModuleExports {
    /// Resolve every entry point, failing on missing required ones
    pub fn resolve(instance: Instance, store: &mut Store<HostContext>) -> Result<Self, StartupError> {
        let init = required(
            INIT_EXPORTS,
            find(instance, store, INIT_EXPORTS, |store, name| {
                DimensionsEntry::lookup(instance, store, name)
            })?,
        )?;
        let tick = required(
            TICK_EXPORTS,
            find(instance, store, TICK_EXPORTS, |store, name| {
                TickEntry::lookup(instance, store, name)
            })?,
        )?;
        let resize = find(instance, store, RESIZE_EXPORTS, |store, name| {
            DimensionsEntry::lookup(instance, store, name)
        })?;
        let set_fullscreen = find(instance, store, SET_FULLSCREEN_EXPORTS, |store, name| {
            instance.get_typed_func::<u32, ()>(store, name)
        })?;
        let update_mouse_position = find(instance, store, MOUSE_POSITION_EXPORTS, |store, name| {
            instance.get_typed_func::<(i32, i32), ()>(store, name)
        })?;
        let update_mouse_inside = find(instance, store, MOUSE_INSIDE_EXPORTS, |store, name| {
            instance.get_typed_func::<u32, ()>(store, name)
        })?;
        let update_mouse_button = find(instance, store, MOUSE_BUTTON_EXPORTS, |store, name| {
            instance.get_typed_func::<(u32, u32), ()>(store, name)
        })?;

        // Input reaches a plain tick only through the mouse entry points
        let (update_mouse_position, update_mouse_inside, update_mouse_button) = match tick {
            TickEntry::Plain(_) => (
                Some(required(MOUSE_POSITION_EXPORTS, update_mouse_position)?),
                Some(required(MOUSE_INSIDE_EXPORTS, update_mouse_inside)?),
                Some(required(MOUSE_BUTTON_EXPORTS, update_mouse_button)?),
            ),
            TickEntry::WithInput(_) => {
                tracing::debug!("Module takes input as tick arguments");
                (update_mouse_position, update_mouse_inside, update_mouse_button)
            }
        };
        let framebuffer = find(instance, store, FRAMEBUFFER_EXPORTS, |store, name| {
            instance.get_typed_func::<(), u32>(store, name)
        })?;

        if resize.is_none() {
            tracing::warn!("Module does not export resize; surface dimensions are fixed");
        }

        Ok(Self {
            init,
            tick,
            resize,
            set_fullscreen,
            update_mouse_position,
            update_mouse_inside,
            update_mouse_button,
            framebuffer,
        })
    }

    pub fn init(&self, store: &mut Store<HostContext>, size: SurfaceSize) -> Result<Option<u32>> {
        self.init.call(store, size)
    }

    pub fn resize(&self, store: &mut Store<HostContext>, size: SurfaceSize) -> Result<Option<u32>> {
        match &self.resize {
            Some(resize) => resize.call(store, size),
            None => anyhow::bail!("Module does not export resize"),
        }
    }

    /// Run one tick; `input` is only passed to modules that take it as arguments
    pub fn tick(&self, store: &mut Store<HostContext>, input: InputState) -> Result<()> {
        match &self.tick {
            TickEntry::Plain(func) => func.call(store, ()),
            TickEntry::WithInput(func) => {
                let timestamp = store.data().timestamp_ms();
                let pressed = input.is_pressed(MouseButton::Primary);
                func.call(
                    store,
                    (
                        input.x,
                        input.y,
                        i32::from(input.inside),
                        i32::from(pressed),
                        timestamp,
                    ),
                )
            }
        }
    }

    /// Whether the module reads input from its tick arguments and leaves
    /// presentation to the host
    pub fn ticks_with_input(&self) -> bool {
        matches!(self.tick, TickEntry::WithInput(_))
    }

    /// Returns false if the module does not care about display mode
    pub fn set_fullscreen(&self, store: &mut Store<HostContext>, fullscreen: bool) -> Result<bool> {
        match &self.set_fullscreen {
            Some(func) => func.call(store, u32::from(fullscreen)).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn update_mouse_position(&self, store: &mut Store<HostContext>, x: i32, y: i32) -> Result<()> {
        match &self.update_mouse_position {
            Some(func) => func.call(store, (x, y)),
            None => Ok(()),
        }
    }

    pub fn update_mouse_inside(&self, store: &mut Store<HostContext>, inside: bool) -> Result<()> {
        match &self.update_mouse_inside {
            Some(func) => func.call(store, u32::from(inside)),
            None => Ok(()),
        }
    }

    pub fn update_mouse_button(
        &self,
        store: &mut Store<HostContext>,
        index: u32,
        pressed: bool,
    ) -> Result<()> {
        match &self.update_mouse_button {
            Some(func) => func.call(store, (index, u32::from(pressed))),
            None => Ok(()),
        }
    }

    /// Ask the module where its framebuffer currently lives
    pub fn framebuffer(&self, store: &mut Store<HostContext>) -> Result<Option<u32>> {
        match &self.framebuffer {
            Some(func) => func.call(store, ()).map(Some),
            None => Ok(None),
        }
    }

    pub fn has_resize(&self) -> bool {
        self.resize.is_some()
    }

    pub fn has_framebuffer_accessor(&self) -> bool {
        self.framebuffer.is_some()
    }
}

/// Find the first exported name and type it with `typed`
fn find<F>(
    instance: Instance,
    store: &mut Store<HostContext>,
    names: &[&str],
    typed: impl Fn(&mut Store<HostContext>, &str) -> Result<F>,
) -> Result<Option<F>, StartupError> {
    for &name in names {
        if instance.get_func(&mut *store, name).is_none() {
            continue;
        }
        return typed(&mut *store, name)
            .map(Some)
            .map_err(|source| StartupError::BadSignature {
                name: name.to_string(),
                source,
            });
    }
    Ok(None)
}

fn required<F>(names: &[&'static str], found: Option<F>) -> Result<F, StartupError> {
    found.ok_or_else(|| StartupError::MissingExport {
        entry: names[0],
        accepted: names.join(", "),
    })
}
