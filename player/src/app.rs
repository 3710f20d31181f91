//! winit application: window events into the session, one tick per redraw

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use cardhost_core::{
    DisplayHost, HostServices, PointerEvent, Session, SessionConfig, SurfaceSize, WasmEngine,
};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::audio::{AudioOutput, load_sound_bank};
use crate::config::Config;
use crate::graphics::{Graphics, SurfacePresenter};
use crate::input::PointerTracker;

/// Window as seen by the display controller
struct WindowHost<'a>(&'a Window);

impl DisplayHost for WindowHost<'_> {
    fn request_fullscreen(&mut self, fullscreen: bool) {
        if fullscreen {
            self.0.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            self.0.set_fullscreen(None);
        }
    }
}

/// Everything that exists once the window is up and the module started
struct Running {
    window: Arc<Window>,
    graphics: Rc<RefCell<Graphics>>,
    session: Session,
    audio: Option<AudioOutput>,
    pointer: PointerTracker,
}

pub struct App {
    config: Config,
    module: Vec<u8>,
    engine: WasmEngine,
    running: Option<Running>,
    fatal: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: Config, module: Vec<u8>) -> Result<Self> {
        Ok(Self {
            config,
            module,
            engine: WasmEngine::new()?,
            running: None,
            fatal: None,
        })
    }

    /// Run until the window closes
    ///
    /// Returns the startup error if the module never started.
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        match self.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let video = &self.config.video;
        let window_attributes = Window::default_attributes()
            .with_title(video.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(video.width, video.height))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let graphics = Rc::new(RefCell::new(Graphics::new(window.clone(), video.vsync)?));

        let audio = match AudioOutput::new() {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!("Audio disabled: {:#}", e);
                None
            }
        };

        let sounds = load_sound_bank(&self.config.audio, &self.config.module.asset_dir());
        tracing::info!("Loaded {} of {} sounds", sounds.len(), self.config.audio.sounds.len());

        let mut session_config = SessionConfig {
            size: SurfaceSize::new(video.width, video.height),
            ram_limit: self.config.module.ram_limit_bytes(),
            seed: self.config.module.seed,
            ..SessionConfig::default()
        };
        if let Some(audio) = &audio {
            session_config.output_rate = audio.sample_rate();
        }
        let services = HostServices {
            presenter: Box::new(SurfacePresenter::new(graphics.clone())),
            sounds,
        };
        let mut session = Session::start(&self.engine, &self.module, session_config, services)?;
        session.mixer_mut().set_volume(self.config.audio.master_volume);

        if video.fullscreen {
            session.enter_fullscreen(&mut WindowHost(&window));
        }

        Ok(Running {
            window,
            graphics,
            session,
            audio,
            pointer: PointerTracker::default(),
        })
    }
}

impl Running {
    fn pointer(&mut self, event: PointerEvent) {
        if let Err(e) = self.session.handle_pointer(event) {
            tracing::warn!("Input {:?} not delivered: {:#}", event, e);
        }
    }

    fn key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let mut host = WindowHost(&self.window);
        match event.physical_key {
            PhysicalKey::Code(KeyCode::F11) => self.session.toggle_fullscreen(&mut host),
            PhysicalKey::Code(KeyCode::Escape) if self.window.fullscreen().is_some() => {
                self.session.exit_fullscreen(&mut host);
            }
            _ => {}
        }
    }

    fn resized(&mut self, width: u32, height: u32) {
        self.graphics.borrow_mut().resize(width, height);
        let fullscreen = self.window.fullscreen().is_some();
        if let Err(e) = self
            .session
            .on_display_changed(fullscreen, SurfaceSize::new(width, height))
        {
            tracing::error!("Display change not applied: {:#}", e);
        }
    }

    fn redraw(&mut self) {
        let report = self.session.tick(&mut WindowHost(&self.window));
        tracing::trace!(
            "Tick {} took {:?} (presented: {})",
            report.tick,
            report.elapsed,
            report.presented
        );

        if let Some(audio) = &mut self.audio {
            let mixer = self.session.mixer_mut();
            audio.fill(|frames, out| mixer.render(frames, out));
        }

        if let Err(e) = self.graphics.borrow_mut().render() {
            tracing::error!("Render error: {:#}", e);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.fatal.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                // No session, so no frame is ever driven
                tracing::error!("Startup failed: {:#}", e);
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => running.resized(size.width, size.height),
            WindowEvent::CursorEntered { .. } => running.pointer.entered(),
            WindowEvent::CursorLeft { .. } => {
                let event = running.pointer.left();
                running.pointer(event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let event = running.pointer.moved(position);
                running.pointer(event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let event = running.pointer.button(button, state);
                running.pointer(event);
            }
            WindowEvent::KeyboardInput { event, .. } => running.key(&event),
            WindowEvent::RedrawRequested => running.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            event_loop.set_control_flow(ControlFlow::Wait);
            running.window.request_redraw();
        }
    }
}
