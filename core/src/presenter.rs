//! Frame presentation seam
//!
//! Published frames are copied out of linear memory and handed to a
//! [`Presenter`]. The player crate implements it on top of wgpu; tests record
//! frames instead.

/// One published frame, borrowed for the duration of [`Presenter::present`]
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `4 * width * height` bytes
    pub pixels: &'a [u8],
}

/// Destination for published frames
pub trait Presenter {
    /// Copy `frame` onto the presentation surface
    ///
    /// The pixel slice is only valid for the duration of the call.
    fn present(&mut self, frame: &Frame<'_>);
}

/// Presenter that discards frames (headless runs)
#[derive(Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _frame: &Frame<'_>) {}
}
