//! Render-surface lifecycle controller.
//!
//! Receives the platform's surface callbacks on the rendering thread,
//! tracks the lifecycle phase, and owns the watchdog that recovers a
//! surface the OS dropped without a destroy callback.

use crate::engine::EngineHooks;
use crate::renderer::{FirstSurfaceToken, FrameRenderer};
use crate::surface::{PlatformSurface, SurfaceEvent};
use crate::watchdog::{Watchdog, WatchdogConfig};
use crossbeam_channel::Sender;
use scrim_overlay::UiDispatcher;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Lifecycle phase of the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    /// No surface has ever been attached.
    Uninitialized,
    /// A surface exists but no viewport has been established.
    SurfaceReady,
    /// The viewport is established; frames may be attempted.
    Rendering,
    /// The surface was destroyed.
    SurfaceLost,
}

pub struct SurfaceController {
    renderer: Arc<FrameRenderer>,
    engine: Arc<dyn EngineHooks>,
    surface: Mutex<Option<Arc<dyn PlatformSurface>>>,
    phase: Mutex<SurfacePhase>,
    watchdog: Mutex<Option<Watchdog>>,
    watchdog_config: WatchdogConfig,
    dispatcher: UiDispatcher,
}

impl SurfaceController {
    pub fn new(
        engine: Arc<dyn EngineHooks>,
        first_surface: Arc<FirstSurfaceToken>,
        events: Sender<SurfaceEvent>,
        dispatcher: UiDispatcher,
        watchdog_config: WatchdogConfig,
    ) -> Arc<Self> {
        let renderer = Arc::new(FrameRenderer::new(engine.clone(), first_surface, events));
        Arc::new(Self {
            renderer,
            engine,
            surface: Mutex::new(None),
            phase: Mutex::new(SurfacePhase::Uninitialized),
            watchdog: Mutex::new(None),
            watchdog_config,
            dispatcher,
        })
    }

    /// Platform callback: a surface was created.
    pub fn on_surface_created(&self, surface: Arc<dyn PlatformSurface>) {
        info!("render surface created");
        *self.surface.lock().unwrap() = Some(surface);
        self.set_phase(SurfacePhase::SurfaceReady);
        self.renderer.on_surface_created();
    }

    /// Platform callback: the surface changed size or finished setup.
    ///
    /// Also the watchdog's synthetic recovery entry point. Ignored while no
    /// usable surface handle exists.
    pub fn on_surface_changed(&self, width: u32, height: u32) {
        if !self.surface_is_valid() {
            debug!("surface-changed with no usable surface, ignoring");
            return;
        }
        self.renderer.on_surface_changed(width, height);
        self.set_phase(SurfacePhase::Rendering);
    }

    /// Platform callback: the surface is going away.
    pub fn on_surface_destroyed(&self) {
        info!("render surface destroyed");
        self.stop_watchdog();
        *self.surface.lock().unwrap() = None;
        self.set_phase(SurfacePhase::SurfaceLost);
    }

    /// Platform callback: draw one frame. Returns whether one was drawn.
    pub fn on_draw_frame(&self) -> bool {
        self.renderer.on_draw_frame(self.can_render())
    }

    /// Whether a frame can be attempted right now: the renderer has a
    /// viewport, the engine reports ready, and the OS handle is valid.
    pub fn can_render(&self) -> bool {
        self.renderer.can_render() && self.engine.is_render_ready() && self.surface_is_valid()
    }

    pub fn phase(&self) -> SurfacePhase {
        *self.phase.lock().unwrap()
    }

    pub fn renderer(&self) -> &Arc<FrameRenderer> {
        &self.renderer
    }

    /// Host resumed: start watching for a stalled surface.
    pub fn resume(self: &Arc<Self>) {
        let mut watchdog = self.watchdog.lock().unwrap();
        if watchdog.is_none() {
            *watchdog = Some(Watchdog::start(
                Arc::downgrade(self),
                self.dispatcher.clone(),
                self.watchdog_config.clone(),
            ));
        }
    }

    /// Host suspended: stop the watchdog.
    pub fn suspend(&self) {
        self.stop_watchdog();
    }

    /// Treat the next surface as a cold start again. For full teardown and
    /// recreation of the owning view.
    pub fn clear_first_surface(&self) {
        self.renderer.clear_first_surface();
    }

    /// One watchdog pass, run on the UI message loop.
    ///
    /// Certain OS/driver states drop a surface without a destroy callback;
    /// when a surface exists but cannot render, the surface-changed path is
    /// re-run with the current dimensions to force recreation.
    pub(crate) fn watchdog_check(&self) {
        let surface = self.surface.lock().unwrap().clone();
        let Some(surface) = surface else {
            return;
        };
        if !surface.is_valid() {
            return;
        }
        if self.can_render() {
            return;
        }

        let (width, height) = surface.size();
        warn!(
            "render surface stalled, forcing surface-changed {}x{}",
            width, height
        );
        self.on_surface_changed(width, height);
    }

    fn surface_is_valid(&self) -> bool {
        self.surface
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.is_valid())
            .unwrap_or(false)
    }

    fn stop_watchdog(&self) {
        if let Some(watchdog) = self.watchdog.lock().unwrap().take() {
            watchdog.stop();
        }
    }

    fn set_phase(&self, next: SurfacePhase) {
        let mut phase = self.phase.lock().unwrap();
        if *phase != next {
            debug!("surface phase {:?} -> {:?}", *phase, next);
            *phase = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use scrim_overlay::UiThread;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ReadyEngine {
        ready: AtomicBool,
    }

    impl ReadyEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                ready: AtomicBool::new(true),
            })
        }
    }

    impl EngineHooks for ReadyEngine {
        fn on_context_lost(&self) {}
        fn on_viewport_resized(&self, _width: u32, _height: u32) {}
        fn on_frame_requested(&self, can_render: bool) -> bool {
            can_render
        }
        fn is_render_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }
    }

    struct StaticSurface {
        valid: AtomicBool,
    }

    impl PlatformSurface for StaticSurface {
        fn is_valid(&self) -> bool {
            self.valid.load(Ordering::SeqCst)
        }
        fn size(&self) -> (u32, u32) {
            (320, 240)
        }
    }

    #[test]
    fn test_phase_transitions() {
        let ui = UiThread::spawn();
        let (tx, _rx) = unbounded();
        let controller = SurfaceController::new(
            ReadyEngine::new(),
            Arc::new(FirstSurfaceToken::new()),
            tx,
            ui.dispatcher(),
            WatchdogConfig::default(),
        );
        assert_eq!(controller.phase(), SurfacePhase::Uninitialized);
        assert!(!controller.can_render());

        let surface = Arc::new(StaticSurface {
            valid: AtomicBool::new(true),
        });
        controller.on_surface_created(surface);
        assert_eq!(controller.phase(), SurfacePhase::SurfaceReady);
        assert!(!controller.can_render());

        controller.on_surface_changed(320, 240);
        assert_eq!(controller.phase(), SurfacePhase::Rendering);
        assert!(controller.can_render());
        assert!(controller.on_draw_frame());

        controller.on_surface_destroyed();
        assert_eq!(controller.phase(), SurfacePhase::SurfaceLost);
        assert!(!controller.can_render());
        assert!(!controller.on_draw_frame());
    }

    #[test]
    fn test_can_render_requires_all_three_legs() {
        let ui = UiThread::spawn();
        let (tx, _rx) = unbounded();
        let engine = ReadyEngine::new();
        let controller = SurfaceController::new(
            engine.clone(),
            Arc::new(FirstSurfaceToken::new()),
            tx,
            ui.dispatcher(),
            WatchdogConfig::default(),
        );

        let surface = Arc::new(StaticSurface {
            valid: AtomicBool::new(true),
        });
        controller.on_surface_created(surface.clone());
        controller.on_surface_changed(320, 240);
        assert!(controller.can_render());

        engine.ready.store(false, Ordering::SeqCst);
        assert!(!controller.can_render());
        engine.ready.store(true, Ordering::SeqCst);

        surface.valid.store(false, Ordering::SeqCst);
        assert!(!controller.can_render());
        surface.valid.store(true, Ordering::SeqCst);

        controller.renderer().invalidate();
        assert!(!controller.can_render());
    }

    #[test]
    fn test_changed_without_surface_is_ignored() {
        let ui = UiThread::spawn();
        let (tx, _rx) = unbounded();
        let controller = SurfaceController::new(
            ReadyEngine::new(),
            Arc::new(FirstSurfaceToken::new()),
            tx,
            ui.dispatcher(),
            WatchdogConfig::default(),
        );

        controller.on_surface_changed(320, 240);
        assert_eq!(controller.phase(), SurfacePhase::Uninitialized);
        assert!(!controller.can_render());
    }
}
