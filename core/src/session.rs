//! Harness session
//!
//! A [`Session`] owns everything one running module needs: the instance,
//! the input mirror, the display controller and the frame driver. Host
//! events come in as method calls; nothing lives in globals.

use anyhow::Result;

use crate::display::{DisplayController, DisplayHost, DisplayMode, DisplayTransition, SurfaceSize};
use crate::driver::{DriverConfig, FrameDriver, TickReport};
use crate::error::StartupError;
use crate::input::{InputState, InputSynchronizer, PointerEvent};
use crate::presenter::Presenter;
use crate::sound::{SoundBank, SoundMixer};
use crate::wasm::{DEFAULT_RAM_LIMIT, FramebufferView, HostContext, ModuleInstance, WasmEngine};

/// Startup parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Windowed surface size passed to `init`
    pub size: SurfaceSize,
    pub ram_limit: usize,
    /// Fixed seed for `get_random_u32`; entropy if `None`
    pub seed: Option<u64>,
    /// Sample rate the mixer renders at
    pub output_rate: u32,
    pub driver: DriverConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            size: SurfaceSize::new(800, 600),
            ram_limit: DEFAULT_RAM_LIMIT,
            seed: None,
            output_rate: crate::sound::OUTPUT_SAMPLE_RATE,
            driver: DriverConfig::default(),
        }
    }
}

/// Host services handed to the module's capability imports
pub struct HostServices {
    pub presenter: Box<dyn Presenter>,
    pub sounds: SoundBank,
}

/// A running module and its host-side state
pub struct Session {
    instance: ModuleInstance,
    input: InputSynchronizer,
    display: DisplayController,
    driver: FrameDriver,
}

impl Session {
    /// Compile, instantiate and initialize `wasm`
    ///
    /// Any error is fatal: no session exists, so no frame can be driven.
    pub fn start(
        engine: &WasmEngine,
        wasm: &[u8],
        config: SessionConfig,
        services: HostServices,
    ) -> Result<Self, StartupError> {
        let module = engine.load_module(wasm).map_err(StartupError::Compile)?;
        WasmEngine::validate_module_memory(&module, config.ram_limit).map_err(StartupError::Memory)?;

        let mut context =
            HostContext::new(services.presenter, services.sounds).with_ram_limit(config.ram_limit);
        if let Some(seed) = config.seed {
            context = context.with_seed(seed);
        }
        context.mixer.set_output_rate(config.output_rate);

        let mut instance = ModuleInstance::new(engine, &module, context)?;

        let size = config.size;
        instance.init(size).map_err(|source| StartupError::Init {
            width: size.width,
            height: size.height,
            source,
        })?;
        tracing::info!("Module initialized at {}", size);

        Ok(Self {
            instance,
            input: InputSynchronizer::new(),
            display: DisplayController::new(size),
            driver: FrameDriver::new(config.driver),
        })
    }

    /// Forward one pointer event to the module
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<()> {
        self.input.dispatch(event, &mut self.instance)
    }

    pub fn enter_fullscreen(&mut self, host: &mut impl DisplayHost) {
        self.display.enter_fullscreen(host);
    }

    pub fn exit_fullscreen(&mut self, host: &mut impl DisplayHost) {
        self.display.exit_fullscreen(host);
    }

    pub fn toggle_fullscreen(&mut self, host: &mut impl DisplayHost) {
        self.display.toggle(host);
    }

    /// The host reports its current fullscreen state and surface size
    pub fn on_display_changed(
        &mut self,
        fullscreen: bool,
        surface: SurfaceSize,
    ) -> Result<DisplayTransition> {
        self.display
            .on_fullscreen_changed(fullscreen, surface, &mut self.instance)
    }

    /// Run one tick, then hand any fullscreen request the module made to `host`
    pub fn tick(&mut self, host: &mut impl DisplayHost) -> TickReport {
        let report = self.driver.tick(&mut self.instance, self.input.state());
        if let Some(fullscreen) = self.instance.take_fullscreen_request() {
            if fullscreen {
                self.display.enter_fullscreen(host);
            } else {
                self.display.exit_fullscreen(host);
            }
        }
        report
    }

    pub fn instance(&self) -> &ModuleInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut ModuleInstance {
        &mut self.instance
    }

    pub fn view(&self) -> Option<FramebufferView> {
        self.instance.view()
    }

    pub fn input_state(&self) -> InputState {
        self.input.state()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display.mode()
    }

    pub fn display(&self) -> &DisplayController {
        &self.display
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn presenter_mut(&mut self) -> &mut dyn Presenter {
        self.instance.context_mut().presenter_mut()
    }

    pub fn mixer_mut(&mut self) -> &mut SoundMixer {
        &mut self.instance.context_mut().mixer
    }
}
