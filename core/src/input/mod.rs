//! Pointer input normalization
//!
//! Host pointer events arrive as [`PointerEvent`] messages. The
//! [`InputSynchronizer`] mirrors the pointer state and turns each event into
//! the discrete module calls it implies, in order.

mod sync;


use anyhow::Result;

pub use sync::InputSynchronizer;

/// Mouse buttons the engine understands
///
/// Indices follow the host button codes: 0 primary, 1 middle, 2 secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseButton {
    Primary = 0,
    Middle = 1,
    Secondary = 2,
}

impl MouseButton {
    /// Every button, in the order they are synchronized on enter
    pub const ALL: [MouseButton; 3] = [Self::Primary, Self::Secondary, Self::Middle];

    /// Map a host button code; unrecognized codes (back, forward, ...) yield `None`
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }

    /// Index passed to `update_mouse_button`
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Bit in a held-buttons mask (primary 1, secondary 2, middle 4)
    pub fn mask_bit(self) -> u16 {
        match self {
            Self::Primary => 1,
            Self::Secondary => 2,
            Self::Middle => 4,
        }
    }
}

/// Buttons held when an event was generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonMask(pub u16);

impl ButtonMask {
    pub const NONE: ButtonMask = ButtonMask(0);

    pub fn contains(self, button: MouseButton) -> bool {
        self.0 & button.mask_bit() != 0
    }

    pub fn with(self, button: MouseButton) -> Self {
        Self(self.0 | button.mask_bit())
    }

    pub fn without(self, button: MouseButton) -> Self {
        Self(self.0 & !button.mask_bit())
    }
}

/// One host pointer event, coordinates relative to the surface origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Enter { x: i32, y: i32, buttons: ButtonMask },
    Leave,
    Move { x: i32, y: i32 },
    Down { button: u16 },
    Up { button: u16 },
}

/// Host mirror of what the module has been told
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub x: i32,
    pub y: i32,
    pub inside: bool,
    /// Indexed by [`MouseButton::index`]
    pub buttons: [bool; 3],
}

impl InputState {
    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button.index() as usize]
    }
}

/// A single module input call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCall {
    Inside(bool),
    Position { x: i32, y: i32 },
    Button { button: MouseButton, pressed: bool },
}

/// Receiver of input calls (the module instance, or a recorder in tests)
pub trait InputSink {
    fn update_mouse_inside(&mut self, inside: bool) -> Result<()>;
    fn update_mouse_position(&mut self, x: i32, y: i32) -> Result<()>;
    fn update_mouse_button(&mut self, button: MouseButton, pressed: bool) -> Result<()>;

    fn apply(&mut self, call: InputCall) -> Result<()> {
        match call {
            InputCall::Inside(inside) => self.update_mouse_inside(inside),
            InputCall::Position { x, y } => self.update_mouse_position(x, y),
            InputCall::Button { button, pressed } => self.update_mouse_button(button, pressed),
        }
    }
}
