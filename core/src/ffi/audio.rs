//! Sound playback FFI

use wasmtime::Caller;

use crate::wasm::{HostContext, read_bytes_from_memory};

/// Trigger the clip named by the UTF-8 string at `ptr`
///
/// Names without a registered clip are ignored.
pub(super) fn play_sound(mut caller: Caller<'_, HostContext>, ptr: u32, len: u32) {
    let Some(memory) = caller.data().memory else {
        tracing::warn!("play_sound called before memory was attached");
        return;
    };
    let bytes = match read_bytes_from_memory(memory, &caller, ptr, len) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("play_sound({:#x}, {}): {:#}", ptr, len, e);
            return;
        }
    };
    match std::str::from_utf8(&bytes) {
        Ok(name) => {
            caller.data_mut().trigger_sound(name);
        }
        Err(e) => tracing::warn!("play_sound name is not UTF-8 ({}): {:02x?}", e, bytes),
    }
}
