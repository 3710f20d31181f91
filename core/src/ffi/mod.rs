//! Capability imports
//!
//! Host functions the engine module imports from `env`. Every capability is
//! registered under each name an engine build might import it as, so a
//! module linking any subset of these names instantiates.

mod audio;
mod display;
mod random;
mod system;
mod video;

#[cfg(test)]
mod tests;

use anyhow::Result;
use wasmtime::Linker;

use crate::wasm::HostContext;

pub const TIMESTAMP_IMPORTS: &[&str] = &["get_timestamp", "js__get_timestamp"];
pub const RANDOM_IMPORTS: &[&str] = &["get_random_u32", "js__get_random_u32", "_seed"];
pub const OUTPUT_LINE_IMPORTS: &[&str] = &["output_line", "js__output_line_to_console", "_print"];
pub const PLAY_SOUND_IMPORTS: &[&str] = &["play_sound", "js__play_sound"];
pub const OUTPUT_IMAGE_IMPORTS: &[&str] = &["output_image", "js__output_image_data"];
pub const FULLSCREEN_IMPORTS: &[&str] = &["request_fullscreen", "_fullscreen"];

/// Register every capability import with the linker
pub fn register_host_ffi(linker: &mut Linker<HostContext>) -> Result<()> {
    for &name in TIMESTAMP_IMPORTS {
        linker.func_wrap("env", name, system::get_timestamp)?;
    }
    for &name in RANDOM_IMPORTS {
        linker.func_wrap("env", name, random::get_random_u32)?;
    }
    for &name in OUTPUT_LINE_IMPORTS {
        linker.func_wrap("env", name, system::output_line)?;
    }
    for &name in PLAY_SOUND_IMPORTS {
        linker.func_wrap("env", name, audio::play_sound)?;
    }
    for &name in OUTPUT_IMAGE_IMPORTS {
        linker.func_wrap("env", name, video::output_image)?;
    }
    for &name in FULLSCREEN_IMPORTS {
        linker.func_wrap("env", name, display::request_fullscreen)?;
    }
    Ok(())
}
