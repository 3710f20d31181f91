//! Clock and console output

use wasmtime::Caller;

use crate::wasm::{HostContext, read_bytes_from_memory};

/// Milliseconds since the host started, with sub-millisecond precision
pub(super) fn get_timestamp(caller: Caller<'_, HostContext>) -> f64 {
    caller.data().timestamp_ms()
}

/// Emit one line of text from linear memory
pub(super) fn output_line(mut caller: Caller<'_, HostContext>, ptr: u32, len: u32) {
    let Some(memory) = caller.data().memory else {
        tracing::warn!("output_line called before memory was attached");
        return;
    };
    match read_bytes_from_memory(memory, &caller, ptr, len) {
        Ok(bytes) => caller.data_mut().record_line(&bytes),
        Err(e) => tracing::warn!("output_line({:#x}, {}): {:#}", ptr, len, e),
    }
}
