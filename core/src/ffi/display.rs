//! Display mode FFI

use wasmtime::Caller;

use crate::wasm::HostContext;

/// Ask the host to enter (non-zero) or leave (zero) fullscreen
///
/// The request is queued and applied once the current call returns.
pub(super) fn request_fullscreen(mut caller: Caller<'_, HostContext>, fullscreen: u32) {
    let fullscreen = fullscreen != 0;
    tracing::debug!("Module requested fullscreen={}", fullscreen);
    caller.data_mut().fullscreen_request = Some(fullscreen);
}
