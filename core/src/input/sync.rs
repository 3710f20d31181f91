//! Event to call translation

use anyhow::Result;
use smallvec::SmallVec;

use super::{InputCall, InputSink, InputState, MouseButton, PointerEvent};

/// Calls produced by one event; enter is the largest at five
pub type InputCalls = SmallVec<[InputCall; 5]>;

/// Translates pointer events into module input calls
#[derive(Debug, Default)]
pub struct InputSynchronizer {
    state: InputState,
}

impl InputSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// State the module has been told so far
    pub fn state(&self) -> InputState {
        self.state
    }

    /// Calls implied by `event`, updating the mirrored state
    ///
    /// Every event maps to its own calls; nothing is coalesced, so a press
    /// followed by a release yields both.
    pub fn translate(&mut self, event: PointerEvent) -> InputCalls {
        let mut calls = InputCalls::new();
        match event {
            PointerEvent::Enter { x, y, buttons } => {
                self.state.inside = true;
                self.state.x = x;
                self.state.y = y;
                calls.push(InputCall::Inside(true));
                calls.push(InputCall::Position { x, y });
                // Buttons may have changed while the pointer was outside
                for button in MouseButton::ALL {
                    let pressed = buttons.contains(button);
                    self.state.buttons[button.index() as usize] = pressed;
                    calls.push(InputCall::Button { button, pressed });
                }
            }
            PointerEvent::Leave => {
                // Held buttons stay held so drags survive a brief exit
                self.state.inside = false;
                calls.push(InputCall::Inside(false));
            }
            PointerEvent::Move { x, y } => {
                self.state.x = x;
                self.state.y = y;
                calls.push(InputCall::Position { x, y });
            }
            PointerEvent::Down { button } | PointerEvent::Up { button } => {
                let pressed = matches!(event, PointerEvent::Down { .. });
                match MouseButton::from_code(button) {
                    Some(button) => {
                        self.state.buttons[button.index() as usize] = pressed;
                        calls.push(InputCall::Button { button, pressed });
                    }
                    None => tracing::trace!("Ignoring mouse button code {}", button),
                }
            }
        }
        calls
    }

    /// Translate `event` and forward each call to `sink` in order
    ///
    /// Stops at the first failing call.
    pub fn dispatch(&mut self, event: PointerEvent, sink: &mut impl InputSink) -> Result<()> {
        for call in self.translate(event) {
            sink.apply(call)?;
        }
        Ok(())
    }
}
