//! Frame publication FFI

use wasmtime::Caller;

use crate::wasm::{FramebufferError, FramebufferView, HostContext};

/// Publish `pixel_count` RGBA8 pixels at `ptr`
///
/// The pixel count must match the current surface exactly. The pixels are
/// copied out of linear memory and handed to the presenter; the published
/// location becomes the current framebuffer view.
pub(super) fn output_image(mut caller: Caller<'_, HostContext>, ptr: u32, pixel_count: u32) {
    if let Err(e) = publish(&mut caller, ptr, pixel_count) {
        tracing::warn!("output_image({:#x}, {}) rejected: {}", ptr, pixel_count, e);
    }
}

fn publish(
    caller: &mut Caller<'_, HostContext>,
    ptr: u32,
    pixel_count: u32,
) -> Result<(), FramebufferError> {
    let ctx = caller.data();
    let memory = ctx.memory.ok_or(FramebufferError::NoMemory)?;
    let surface = ctx.surface;
    let generation = ctx.memory_generation();

    let expected = u64::from(surface.width) * u64::from(surface.height);
    if u64::from(pixel_count) != expected {
        return Err(FramebufferError::SizeMismatch {
            published: pixel_count,
            width: surface.width,
            height: surface.height,
        });
    }

    let view = FramebufferView::new(
        ptr,
        surface.width,
        surface.height,
        generation,
        memory.data_size(&*caller),
    )?;

    let mut pixels = caller.data_mut().take_scratch();
    pixels.clear();
    match view.bytes(memory.data(&*caller), generation) {
        Ok(bytes) => pixels.extend_from_slice(bytes),
        Err(e) => {
            caller.data_mut().restore_scratch(pixels);
            return Err(e);
        }
    }
    caller.data_mut().present(view, pixels);
    Ok(())
}
