//! A fully wired scrim instance over the headless seams.

use crate::engine::RecordingEngine;
use crate::surface::FakeSurface;
use crate::toolkit::{HeadlessPane, HeadlessToolkit};
use crossbeam_channel::{Receiver, unbounded};
use scrim_overlay::{OverlayCompositor, OverlayRegistry, UiThread, UiToolkit, View};
use scrim_surface::{FirstSurfaceToken, SurfaceController, SurfaceEvent, WatchdogConfig};
use std::sync::Arc;
use std::time::Duration;

/// Everything wired together: UI thread, registry, compositor, surface
/// controller, and the scripted collaborators behind them.
pub struct Session {
    pub ui: UiThread,
    pub toolkit: Arc<dyn UiToolkit>,
    pub compositor: Arc<OverlayCompositor>,
    pub registry: Arc<OverlayRegistry>,
    pub engine: Arc<RecordingEngine>,
    pub controller: Arc<SurfaceController>,
    pub surface: Arc<FakeSurface>,
    pub events: Receiver<SurfaceEvent>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_watchdog_config(WatchdogConfig::default())
    }

    /// A session whose watchdog checks at the given interval; tests use a
    /// short one to keep recovery scenarios fast.
    pub fn with_watchdog_interval(interval: Duration) -> Self {
        Self::with_watchdog_config(WatchdogConfig { interval })
    }

    fn with_watchdog_config(config: WatchdogConfig) -> Self {
        let ui = UiThread::spawn();
        let toolkit: Arc<dyn UiToolkit> = Arc::new(HeadlessToolkit);
        let compositor = Arc::new(OverlayCompositor::new());
        let registry = Arc::new(OverlayRegistry::new(
            ui.dispatcher(),
            toolkit.clone(),
            compositor.clone(),
        ));

        let engine = RecordingEngine::new();
        let (event_tx, event_rx) = unbounded();
        let controller = SurfaceController::new(
            engine.clone(),
            Arc::new(FirstSurfaceToken::new()),
            event_tx,
            ui.dispatcher(),
            config,
        );
        let surface = Arc::new(FakeSurface::new(100, 200));

        Self {
            ui,
            toolkit,
            compositor,
            registry,
            engine,
            controller,
            surface,
            events: event_rx,
        }
    }

    /// Build the overlay stack on the UI thread and wait for it.
    pub fn attach_compositor(&self) {
        let compositor = self.compositor.clone();
        let toolkit = self.toolkit.clone();
        self.ui.dispatcher().run_on_ui(move || {
            let pane: Arc<dyn View> = Arc::new(HeadlessPane::new());
            compositor.attach(&toolkit, pane);
        });
        self.sync();
    }

    /// Block until every task posted to the UI thread so far has run.
    pub fn sync(&self) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.ui.dispatcher().post(move || {
            let _ = tx.send(());
        });
        let _ = rx.recv_timeout(Duration::from_secs(5));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
