//! Random number FFI

use wasmtime::Caller;

use crate::wasm::HostContext;

/// Fresh 32-bit value for seeding the engine's own generator
pub(super) fn get_random_u32(mut caller: Caller<'_, HostContext>) -> u32 {
    caller.data_mut().next_random()
}
