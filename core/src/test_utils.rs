//! Shared test utilities for integration and unit tests

use std::cell::RefCell;
use std::rc::Rc;

use crate::display::{DisplayHost, SurfaceSize};
use crate::presenter::{Frame, Presenter};
use crate::session::{HostServices, Session, SessionConfig};
use crate::sound::{SoundBank, SoundClip};
use crate::wasm::WasmEngine;

// ============================================================================
// Fixture engine module
// ============================================================================

/// Stand-in engine module using the canonical import and export names
///
/// - `init`/`resize` bump-allocate a new framebuffer after the previous one
///   (so every resize moves it), grow memory to fit, and return its offset
/// - `tick` counts ticks, stores the count in the first pixel and publishes
///   the framebuffer through `output_image` (unless publishing is disabled)
/// - input entry points store what they were told; pressing any button plays
///   "card"
/// - getters expose the stored state to tests
pub const FIXTURE_WAT: &str = r#"
(module
    (import "env" "get_timestamp" (func $get_timestamp (result f64)))
    (import "env" "get_random_u32" (func $get_random_u32 (result i32)))
    (import "env" "output_line" (func $output_line (param i32 i32)))
    (import "env" "play_sound" (func $play_sound (param i32 i32)))
    (import "env" "output_image" (func $output_image (param i32 i32)))
    (import "env" "request_fullscreen" (func $request_fullscreen (param i32)))

    (memory (export "memory") 1)
    (data (i32.const 16) "ready")
    (data (i32.const 32) "card")
    (data (i32.const 48) "win")
    (data (i32.const 64) "shuffle")
    (data (i32.const 80) "\ff\fe")

    (global $fb (mut i32) (i32.const 0))
    (global $w (mut i32) (i32.const 0))
    (global $h (mut i32) (i32.const 0))
    (global $ticks (mut i32) (i32.const 0))
    (global $resizes (mut i32) (i32.const 0))
    (global $inside (mut i32) (i32.const 0))
    (global $x (mut i32) (i32.const 0))
    (global $y (mut i32) (i32.const 0))
    (global $buttons (mut i32) (i32.const 0))
    (global $fullscreen (mut i32) (i32.const -1))
    (global $publish (mut i32) (i32.const 1))
    (global $grow_pages (mut i32) (i32.const 0))

    ;; Grow memory until [0, end) is addressable
    (func $ensure (param $end i32)
        (local $need i32)
        (local.set $need
            (i32.sub
                (i32.shr_u (i32.add (local.get $end) (i32.const 65535)) (i32.const 16))
                (memory.size)))
        (if (i32.gt_s (local.get $need) (i32.const 0))
            (then (drop (memory.grow (local.get $need))))))

    (func $alloc (param $w i32) (param $h i32) (result i32)
        (if (i32.eqz (global.get $fb))
            (then (global.set $fb (i32.const 1024)))
            (else
                (global.set $fb
                    (i32.add
                        (global.get $fb)
                        (i32.mul (i32.const 4) (i32.mul (global.get $w) (global.get $h)))))))
        (global.set $w (local.get $w))
        (global.set $h (local.get $h))
        (call $ensure
            (i32.add
                (global.get $fb)
                (i32.mul (i32.const 4) (i32.mul (local.get $w) (local.get $h)))))
        (global.get $fb))

    (func (export "init") (param $w i32) (param $h i32) (result i32)
        (call $output_line (i32.const 16) (i32.const 5))
        (call $alloc (local.get $w) (local.get $h)))

    (func (export "resize") (param $w i32) (param $h i32) (result i32)
        (global.set $resizes (i32.add (global.get $resizes) (i32.const 1)))
        (call $alloc (local.get $w) (local.get $h)))

    (func (export "set_fullscreen") (param $flag i32)
        (global.set $fullscreen (local.get $flag)))

    (func (export "tick")
        (global.set $ticks (i32.add (global.get $ticks) (i32.const 1)))
        (if (global.get $grow_pages)
            (then
                (drop (memory.grow (global.get $grow_pages)))
                (global.set $grow_pages (i32.const 0))))
        (i32.store (global.get $fb) (global.get $ticks))
        (if (global.get $publish)
            (then
                (call $output_image
                    (global.get $fb)
                    (i32.mul (global.get $w) (global.get $h))))))

    (func (export "update_mouse_inside") (param $flag i32)
        (global.set $inside (local.get $flag)))

    (func (export "update_mouse_position") (param $x i32) (param $y i32)
        (global.set $x (local.get $x))
        (global.set $y (local.get $y)))

    (func (export "update_mouse_button") (param $index i32) (param $pressed i32)
        (local $bit i32)
        (local.set $bit (i32.shl (i32.const 1) (local.get $index)))
        (if (local.get $pressed)
            (then
                (global.set $buttons (i32.or (global.get $buttons) (local.get $bit)))
                (call $play_sound (i32.const 32) (i32.const 4)))
            (else
                (global.set $buttons
                    (i32.and (global.get $buttons) (i32.xor (local.get $bit) (i32.const -1)))))))

    ;; Test controls
    (func (export "set_publish") (param $flag i32) (global.set $publish (local.get $flag)))
    (func (export "grow_next_tick") (param $pages i32) (global.set $grow_pages (local.get $pages)))
    (func (export "grow") (param $pages i32) (result i32) (memory.grow (local.get $pages)))
    (func (export "play_win") (call $play_sound (i32.const 48) (i32.const 3)))
    (func (export "play_unknown") (call $play_sound (i32.const 64) (i32.const 7)))
    (func (export "print_invalid") (call $output_line (i32.const 80) (i32.const 2)))
    (func (export "publish_short") (call $output_image (global.get $fb) (i32.const 1)))
    (func (export "publish_at") (param $ptr i32)
        (call $output_image (local.get $ptr) (i32.mul (global.get $w) (global.get $h))))
    (func (export "ask_fullscreen") (param $flag i32) (call $request_fullscreen (local.get $flag)))
    (func (export "random") (result i32) (call $get_random_u32))
    (func (export "timestamp") (result f64) (call $get_timestamp))

    ;; Getters
    (func (export "get_fb") (result i32) (global.get $fb))
    (func (export "get_ticks") (result i32) (global.get $ticks))
    (func (export "get_resizes") (result i32) (global.get $resizes))
    (func (export "get_inside") (result i32) (global.get $inside))
    (func (export "get_x") (result i32) (global.get $x))
    (func (export "get_y") (result i32) (global.get $y))
    (func (export "get_buttons") (result i32) (global.get $buttons))
    (func (export "get_fullscreen") (result i32) (global.get $fullscreen))
)
"#;

pub fn fixture_wasm() -> Vec<u8> {
    wat::parse_str(FIXTURE_WAT).expect("fixture WAT should parse")
}

// ============================================================================
// Recording host services
// ============================================================================

/// What the presenter saw of one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedFrame {
    pub width: u32,
    pub height: u32,
    pub len: usize,
    /// First pixel as a little-endian word (the fixture's tick counter)
    pub first_word: u32,
}

/// Presenter that records frames into a shared list
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    pub frames: Rc<RefCell<Vec<PresentedFrame>>>,
}

impl Presenter for RecordingPresenter {
    fn present(&mut self, frame: &Frame<'_>) {
        let first_word = frame
            .pixels
            .get(..4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .unwrap_or(0);
        self.frames.borrow_mut().push(PresentedFrame {
            width: frame.width,
            height: frame.height,
            len: frame.pixels.len(),
            first_word,
        });
    }
}

/// Display host that records fullscreen requests
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub requests: Vec<bool>,
}

impl DisplayHost for RecordingHost {
    fn request_fullscreen(&mut self, fullscreen: bool) {
        self.requests.push(fullscreen);
    }
}

/// Sound bank with the engine's two sounds as short silent clips
pub fn test_sounds() -> SoundBank {
    let mut sounds = SoundBank::new();
    sounds.insert("win", SoundClip::new(vec![0.0; 441], 1, 44_100));
    sounds.insert(
        "card",
        SoundClip::new(vec![0.0; 441], 1, 44_100).with_playback_rate(1.5),
    );
    sounds
}

pub fn recording_services() -> (HostServices, Rc<RefCell<Vec<PresentedFrame>>>) {
    let presenter = RecordingPresenter::default();
    let frames = presenter.frames.clone();
    let services = HostServices {
        presenter: Box::new(presenter),
        sounds: test_sounds(),
    };
    (services, frames)
}

/// Start the fixture module at `width`x`height` with a fixed seed
pub fn fixture_session(width: u32, height: u32) -> (Session, Rc<RefCell<Vec<PresentedFrame>>>) {
    let engine = WasmEngine::new().unwrap();
    let (services, frames) = recording_services();
    let config = SessionConfig {
        size: SurfaceSize::new(width, height),
        seed: Some(7),
        ..SessionConfig::default()
    };
    let session = Session::start(&engine, &fixture_wasm(), config, services).unwrap();
    (session, frames)
}
