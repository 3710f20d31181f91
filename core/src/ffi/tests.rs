//! Tests for capability imports

use super::*;
use crate::presenter::NullPresenter;
use crate::sound::SoundBank;
use wasmtime::{Engine, Linker, Module, Store};

fn context() -> HostContext {
    HostContext::new(Box::new(NullPresenter), SoundBank::new()).with_seed(42)
}

fn instantiate(wat: &str) -> (Store<HostContext>, wasmtime::Instance) {
    let engine = Engine::default();
    let mut linker: Linker<HostContext> = Linker::new(&engine);
    register_host_ffi(&mut linker).unwrap();

    let wasm = wat::parse_str(wat).unwrap();
    let module = Module::new(&engine, wasm).unwrap();
    let mut store = Store::new(&engine, context());
    let instance = linker.instantiate(&mut store, &module).unwrap();
    let memory = instance.get_memory(&mut store, "memory");
    store.data_mut().memory = memory;
    (store, instance)
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_register_host_ffi() {
    let engine = Engine::default();
    let mut linker: Linker<HostContext> = Linker::new(&engine);
    assert!(register_host_ffi(&mut linker).is_ok());
}

#[test]
fn test_every_alias_links() {
    let signatures = [
        (TIMESTAMP_IMPORTS, "(result f64)"),
        (RANDOM_IMPORTS, "(result i32)"),
        (OUTPUT_LINE_IMPORTS, "(param i32 i32)"),
        (PLAY_SOUND_IMPORTS, "(param i32 i32)"),
        (OUTPUT_IMAGE_IMPORTS, "(param i32 i32)"),
        (FULLSCREEN_IMPORTS, "(param i32)"),
    ];
    let mut imports = String::new();
    for (names, signature) in signatures {
        for name in names {
            imports.push_str(&format!("(import \"env\" \"{}\" (func {}))\n", name, signature));
        }
    }
    let wat = format!("(module\n{}(memory (export \"memory\") 1))", imports);

    // instantiate() unwraps, so reaching the assertion means every import resolved
    let (store, _) = instantiate(&wat);
    assert!(store.data().memory.is_some());
}

// ============================================================================
// Individual capabilities
// ============================================================================

#[test]
fn test_random_values_are_fresh() {
    let (mut store, instance) = instantiate(
        r#"
        (module
            (import "env" "get_random_u32" (func $random (result i32)))
            (memory (export "memory") 1)
            (func (export "draw") (result i32) call $random)
        )
    "#,
    );
    let draw = instance
        .get_typed_func::<(), u32>(&mut store, "draw")
        .unwrap();

    let values: Vec<u32> = (0..8).map(|_| draw.call(&mut store, ()).unwrap()).collect();
    let mut unique = values.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), values.len());
}

#[test]
fn test_seeded_random_is_reproducible() {
    let mut a = context();
    let mut b = context();
    assert_eq!(a.next_random(), b.next_random());
}

#[test]
fn test_timestamp_is_monotonic() {
    let (mut store, instance) = instantiate(
        r#"
        (module
            (import "env" "js__get_timestamp" (func $now (result f64)))
            (memory (export "memory") 1)
            (func (export "now") (result f64) call $now)
        )
    "#,
    );
    let now = instance
        .get_typed_func::<(), f64>(&mut store, "now")
        .unwrap();

    let first = now.call(&mut store, ()).unwrap();
    let second = now.call(&mut store, ()).unwrap();
    assert!(first >= 0.0);
    assert!(second >= first);
}

#[test]
fn test_output_line_records_text_and_invalid_bytes() {
    let (mut store, instance) = instantiate(
        r#"
        (module
            (import "env" "_print" (func $print (param i32 i32)))
            (memory (export "memory") 1)
            (data (i32.const 0) "hello")
            (data (i32.const 8) "\c3\28")
            (func (export "run")
                (call $print (i32.const 0) (i32.const 5))
                (call $print (i32.const 8) (i32.const 2))
                ;; Out of bounds: logged and skipped
                (call $print (i32.const 65530) (i32.const 100)))
        )
    "#,
    );
    let run = instance.get_typed_func::<(), ()>(&mut store, "run").unwrap();
    run.call(&mut store, ()).unwrap();

    let lines: Vec<String> = store.data().console_lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "hello");
    assert!(lines[1].contains('\u{FFFD}'));
}

#[test]
fn test_request_fullscreen_is_queued() {
    let (mut store, instance) = instantiate(
        r#"
        (module
            (import "env" "_fullscreen" (func $fullscreen (param i32)))
            (memory (export "memory") 1)
            (func (export "run") (call $fullscreen (i32.const 1)))
        )
    "#,
    );
    let run = instance.get_typed_func::<(), ()>(&mut store, "run").unwrap();
    run.call(&mut store, ()).unwrap();

    assert_eq!(store.data_mut().fullscreen_request.take(), Some(true));
}

#[test]
fn test_output_image_requires_matching_size() {
    let (mut store, instance) = instantiate(
        r#"
        (module
            (import "env" "output_image" (func $output_image (param i32 i32)))
            (memory (export "memory") 1)
            (func (export "publish") (param i32 i32)
                (call $output_image (local.get 0) (local.get 1)))
        )
    "#,
    );
    store.data_mut().surface = crate::display::SurfaceSize::new(4, 4);
    let publish = instance
        .get_typed_func::<(u32, u32), ()>(&mut store, "publish")
        .unwrap();

    // Wrong pixel count
    publish.call(&mut store, (0, 15)).unwrap();
    // Runs past the end of memory
    publish.call(&mut store, (65536 - 32, 16)).unwrap();
    assert_eq!(store.data().frames_presented, 0);
    assert!(store.data().view.is_none());

    publish.call(&mut store, (256, 16)).unwrap();
    assert_eq!(store.data().frames_presented, 1);
    let view = store.data().view.unwrap();
    assert_eq!(view.offset(), 256);
    assert_eq!(view.byte_len(), 64);
}
