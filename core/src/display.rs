//! Display lifecycle: windowed ⇄ fullscreen
//!
//! The controller never assumes a requested transition happened. It asks the
//! [`DisplayHost`] for a mode change and waits for the host to confirm the
//! mode through [`DisplayController::on_fullscreen_changed`]. Confirmations the
//! controller never asked for (the user pressing escape, the window manager
//! dropping fullscreen) are handled exactly like requested ones.

use anyhow::Result;

/// Surface dimensions in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero (minimized windows report this)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    Windowed,
    Fullscreen,
}

/// Host side of the display: the window or page that actually changes mode
pub trait DisplayHost {
    /// Ask for a mode change; the outcome arrives later as a confirmation
    fn request_fullscreen(&mut self, fullscreen: bool);
}

/// Module side of the display: the entry points a mode change drives
pub trait DisplayTarget {
    fn resize(&mut self, size: SurfaceSize) -> Result<()>;
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()>;
}

/// What a confirmation did to the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTransition {
    /// Nothing changed
    None,
    Entered(SurfaceSize),
    /// Returned to windowed mode at the restored size
    Exited(SurfaceSize),
    /// Same mode, new dimensions
    Resized(SurfaceSize),
}

/// Tracks the confirmed display mode and the size to restore on exit
#[derive(Debug)]
pub struct DisplayController {
    mode: DisplayMode,
    windowed_size: SurfaceSize,
    current_size: SurfaceSize,
    requested: Option<DisplayMode>,
}

impl DisplayController {
    /// Start windowed at `size` (the size the module was initialized with)
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            mode: DisplayMode::Windowed,
            windowed_size: size,
            current_size: size,
            requested: None,
        }
    }

    /// Last confirmed mode
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Size restored when fullscreen ends
    pub fn windowed_size(&self) -> SurfaceSize {
        self.windowed_size
    }

    /// Size the module was last resized to
    pub fn current_size(&self) -> SurfaceSize {
        self.current_size
    }

    /// Mode requested from the host and not yet confirmed
    pub fn pending(&self) -> Option<DisplayMode> {
        self.requested
    }

    pub fn enter_fullscreen(&mut self, host: &mut impl DisplayHost) {
        self.request(DisplayMode::Fullscreen, host);
    }

    /// Ask the host to leave fullscreen; the module is resynchronized on confirmation
    pub fn exit_fullscreen(&mut self, host: &mut impl DisplayHost) {
        self.request(DisplayMode::Windowed, host);
    }

    pub fn toggle(&mut self, host: &mut impl DisplayHost) {
        match self.mode {
            DisplayMode::Windowed => self.enter_fullscreen(host),
            DisplayMode::Fullscreen => self.exit_fullscreen(host),
        }
    }

    fn request(&mut self, mode: DisplayMode, host: &mut impl DisplayHost) {
        if self.mode == mode && self.requested.is_none() {
            tracing::debug!("Already {:?}; ignoring request", mode);
            return;
        }
        self.requested = Some(mode);
        host.request_fullscreen(mode == DisplayMode::Fullscreen);
    }

    /// Apply a host-confirmed display state
    ///
    /// `fullscreen` is what the host reports now, regardless of what was
    /// requested. `surface` is the host's current surface size; it is only
    /// used while fullscreen, since leaving fullscreen always restores the
    /// size the module had before entering.
    pub fn on_fullscreen_changed(
        &mut self,
        fullscreen: bool,
        surface: SurfaceSize,
        target: &mut impl DisplayTarget,
    ) -> Result<DisplayTransition> {
        let confirmed = if fullscreen {
            DisplayMode::Fullscreen
        } else {
            DisplayMode::Windowed
        };
        if self.requested.is_some_and(|requested| requested != confirmed) {
            tracing::debug!(
                "Host reported {:?} while {:?} was pending; following the host",
                confirmed,
                self.requested
            );
        }
        self.requested = None;

        match (self.mode, confirmed) {
            (DisplayMode::Windowed, DisplayMode::Fullscreen) => {
                if surface.is_empty() {
                    tracing::debug!("Ignoring fullscreen confirmation with empty surface {}", surface);
                    return Ok(DisplayTransition::None);
                }
                self.mode = DisplayMode::Fullscreen;
                self.current_size = surface;
                tracing::info!("Entered fullscreen at {}", surface);
                target.resize(surface)?;
                target.set_fullscreen(true)?;
                Ok(DisplayTransition::Entered(surface))
            }
            (DisplayMode::Fullscreen, DisplayMode::Windowed) => {
                // Mode flips first so a failed resize cannot leave us thinking
                // we are still fullscreen
                self.mode = DisplayMode::Windowed;
                let restored = self.windowed_size;
                self.current_size = restored;
                tracing::info!("Left fullscreen; restoring {}", restored);
                let resized = target.resize(restored);
                let notified = target.set_fullscreen(false);
                resized?;
                notified?;
                Ok(DisplayTransition::Exited(restored))
            }
            (DisplayMode::Fullscreen, DisplayMode::Fullscreen) => {
                if surface.is_empty() || surface == self.current_size {
                    return Ok(DisplayTransition::None);
                }
                self.current_size = surface;
                target.resize(surface)?;
                Ok(DisplayTransition::Resized(surface))
            }
            (DisplayMode::Windowed, DisplayMode::Windowed) => Ok(DisplayTransition::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Resize(u32, u32),
        SetFullscreen(bool),
    }

    #[derive(Default)]
    struct RecordingTarget {
        calls: Vec<Call>,
        fail_resize: bool,
    }

    impl DisplayTarget for RecordingTarget {
        fn resize(&mut self, size: SurfaceSize) -> Result<()> {
            self.calls.push(Call::Resize(size.width, size.height));
            if self.fail_resize {
                anyhow::bail!("resize failed");
            }
            Ok(())
        }

        fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
            self.calls.push(Call::SetFullscreen(fullscreen));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        requests: Vec<bool>,
    }

    impl DisplayHost for RecordingHost {
        fn request_fullscreen(&mut self, fullscreen: bool) {
            self.requests.push(fullscreen);
        }
    }

    const WINDOW: SurfaceSize = SurfaceSize::new(800, 600);
    const SCREEN: SurfaceSize = SurfaceSize::new(1920, 1080);

    #[test]
    fn test_request_does_not_change_mode() {
        let mut controller = DisplayController::new(WINDOW);
        let mut host = RecordingHost::default();

        controller.enter_fullscreen(&mut host);

        assert_eq!(host.requests, vec![true]);
        assert_eq!(controller.mode(), DisplayMode::Windowed);
        assert_eq!(controller.pending(), Some(DisplayMode::Fullscreen));
    }

    #[test]
    fn test_enter_then_escape_restores_window_size() {
        let mut controller = DisplayController::new(WINDOW);
        let mut host = RecordingHost::default();
        let mut target = RecordingTarget::default();

        controller.enter_fullscreen(&mut host);
        let entered = controller
            .on_fullscreen_changed(true, SCREEN, &mut target)
            .unwrap();
        assert_eq!(entered, DisplayTransition::Entered(SCREEN));

        // Escape: the host leaves fullscreen without being asked
        let exited = controller
            .on_fullscreen_changed(false, SCREEN, &mut target)
            .unwrap();
        assert_eq!(exited, DisplayTransition::Exited(WINDOW));

        assert_eq!(
            target.calls,
            vec![
                Call::Resize(1920, 1080),
                Call::SetFullscreen(true),
                Call::Resize(800, 600),
                Call::SetFullscreen(false),
            ]
        );
        assert_eq!(controller.mode(), DisplayMode::Windowed);
    }

    #[test]
    fn test_repeated_exit_confirmation_is_noop() {
        let mut controller = DisplayController::new(WINDOW);
        let mut target = RecordingTarget::default();

        controller.on_fullscreen_changed(true, SCREEN, &mut target).unwrap();
        controller.on_fullscreen_changed(false, WINDOW, &mut target).unwrap();
        let again = controller
            .on_fullscreen_changed(false, WINDOW, &mut target)
            .unwrap();

        assert_eq!(again, DisplayTransition::None);
        let exits = target
            .calls
            .iter()
            .filter(|call| **call == Call::SetFullscreen(false))
            .count();
        assert_eq!(exits, 1);
    }

    #[test]
    fn test_unrequested_fullscreen_is_followed() {
        let mut controller = DisplayController::new(WINDOW);
        let mut target = RecordingTarget::default();

        let transition = controller
            .on_fullscreen_changed(true, SCREEN, &mut target)
            .unwrap();

        assert_eq!(transition, DisplayTransition::Entered(SCREEN));
        assert_eq!(controller.mode(), DisplayMode::Fullscreen);
    }

    #[test]
    fn test_explicit_exit_waits_for_confirmation() {
        let mut controller = DisplayController::new(WINDOW);
        let mut host = RecordingHost::default();
        let mut target = RecordingTarget::default();
        controller.on_fullscreen_changed(true, SCREEN, &mut target).unwrap();
        target.calls.clear();

        controller.exit_fullscreen(&mut host);
        assert_eq!(host.requests, vec![false]);
        assert!(target.calls.is_empty());
        assert_eq!(controller.mode(), DisplayMode::Fullscreen);

        controller.on_fullscreen_changed(false, SCREEN, &mut target).unwrap();
        assert_eq!(
            target.calls,
            vec![Call::Resize(800, 600), Call::SetFullscreen(false)]
        );
    }

    #[test]
    fn test_toggle_alternates_requests() {
        let mut controller = DisplayController::new(WINDOW);
        let mut host = RecordingHost::default();
        let mut target = RecordingTarget::default();

        controller.toggle(&mut host);
        controller.on_fullscreen_changed(true, SCREEN, &mut target).unwrap();
        controller.toggle(&mut host);

        assert_eq!(host.requests, vec![true, false]);
    }

    #[test]
    fn test_redundant_request_is_ignored() {
        let mut controller = DisplayController::new(WINDOW);
        let mut host = RecordingHost::default();

        controller.exit_fullscreen(&mut host);

        assert!(host.requests.is_empty());
        assert_eq!(controller.pending(), None);
    }

    #[test]
    fn test_fullscreen_resize_forwards_new_size() {
        let mut controller = DisplayController::new(WINDOW);
        let mut target = RecordingTarget::default();
        controller.on_fullscreen_changed(true, SCREEN, &mut target).unwrap();
        target.calls.clear();

        let moved = SurfaceSize::new(2560, 1440);
        let transition = controller
            .on_fullscreen_changed(true, moved, &mut target)
            .unwrap();
        assert_eq!(transition, DisplayTransition::Resized(moved));
        assert_eq!(target.calls, vec![Call::Resize(2560, 1440)]);

        // Same size again does nothing
        let transition = controller
            .on_fullscreen_changed(true, moved, &mut target)
            .unwrap();
        assert_eq!(transition, DisplayTransition::None);
    }

    #[test]
    fn test_empty_surface_does_not_enter() {
        let mut controller = DisplayController::new(WINDOW);
        let mut target = RecordingTarget::default();

        let transition = controller
            .on_fullscreen_changed(true, SurfaceSize::new(0, 0), &mut target)
            .unwrap();

        assert_eq!(transition, DisplayTransition::None);
        assert_eq!(controller.mode(), DisplayMode::Windowed);
        assert!(target.calls.is_empty());
    }

    #[test]
    fn test_failed_restore_still_notifies_and_leaves_fullscreen() {
        let mut controller = DisplayController::new(WINDOW);
        let mut target = RecordingTarget::default();
        controller.on_fullscreen_changed(true, SCREEN, &mut target).unwrap();
        target.calls.clear();
        target.fail_resize = true;

        let result = controller.on_fullscreen_changed(false, SCREEN, &mut target);

        assert!(result.is_err());
        assert_eq!(controller.mode(), DisplayMode::Windowed);
        assert_eq!(
            target.calls,
            vec![Call::Resize(800, 600), Call::SetFullscreen(false)]
        );
    }
}
