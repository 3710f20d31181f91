//! winit pointer events to [`PointerEvent`] messages
//!
//! winit reports cursor entry without a position, so the enter message is
//! held back until the first cursor move inside the window supplies one.

use cardhost_core::{ButtonMask, MouseButton, PointerEvent};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitButton};

/// Host button code, numbered like the engine expects
pub fn button_code(button: WinitButton) -> u16 {
    match button {
        WinitButton::Left => 0,
        WinitButton::Middle => 1,
        WinitButton::Right => 2,
        WinitButton::Back => 3,
        WinitButton::Forward => 4,
        WinitButton::Other(code) => code,
    }
}

/// Tracks held buttons and pending entry between winit events
#[derive(Debug, Default)]
pub struct PointerTracker {
    held: ButtonMask,
    pending_enter: bool,
}

impl PointerTracker {
    pub fn entered(&mut self) {
        self.pending_enter = true;
    }

    pub fn left(&mut self) -> PointerEvent {
        self.pending_enter = false;
        PointerEvent::Leave
    }

    /// Cursor moved to `position` in surface pixels
    pub fn moved(&mut self, position: PhysicalPosition<f64>) -> PointerEvent {
        let x = position.x.floor() as i32;
        let y = position.y.floor() as i32;
        if std::mem::take(&mut self.pending_enter) {
            PointerEvent::Enter {
                x,
                y,
                buttons: self.held,
            }
        } else {
            PointerEvent::Move { x, y }
        }
    }

    pub fn button(&mut self, button: WinitButton, state: ElementState) -> PointerEvent {
        let code = button_code(button);
        let pressed = state == ElementState::Pressed;
        if let Some(button) = MouseButton::from_code(code) {
            self.held = if pressed {
                self.held.with(button)
            } else {
                self.held.without(button)
            };
        }
        if pressed {
            PointerEvent::Down { button: code }
        } else {
            PointerEvent::Up { button: code }
        }
    }
}
