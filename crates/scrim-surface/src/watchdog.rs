//! Stalled-surface watchdog.
//!
//! Some OS/driver states drop a render surface without delivering a
//! destroy callback; with no recreation attempt, rendering would hang on a
//! blank screen forever. The watchdog bounds that window: a timer thread
//! posts a check onto the UI message loop, and the check forces the
//! surface-changed path when a surface exists but cannot render.

use crate::controller::SurfaceController;
use scrim_overlay::UiDispatcher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Default check cadence: fast enough to recover within a user-perceptible
/// window, slow enough not to thrash a transition already in progress.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the watchdog.
#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    /// How often to check the surface.
    pub interval: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Handle to the running watchdog timer thread.
///
/// The checks themselves run on the UI message loop while real surface
/// callbacks arrive on the rendering thread; a check only fires the
/// synthetic surface-changed call when it observes no healthy transition,
/// so the two paths stay apart in practice without a shared lock.
pub struct Watchdog {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Spawn the timer thread.
    ///
    /// Only a weak reference to the controller is held: when the controller
    /// goes away the timer winds down on its own.
    pub fn start(
        controller: Weak<SurfaceController>,
        dispatcher: UiDispatcher,
        config: WatchdogConfig,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name("scrim-watchdog".to_string())
            .spawn(move || {
                debug!("watchdog started");
                while thread_running.load(Ordering::Relaxed) {
                    thread::sleep(config.interval);
                    if !thread_running.load(Ordering::Relaxed) {
                        break;
                    }
                    let Some(controller) = controller.upgrade() else {
                        break;
                    };
                    dispatcher.run_on_ui(move || controller.watchdog_check());
                }
                debug!("watchdog stopped");
            })
            .expect("Failed to spawn watchdog thread");

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the timer. Idempotent; the thread exits at most one interval
    /// later.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop();
        // Detach rather than join: the thread wakes from its sleep and
        // exits without touching the controller again.
        let _ = self.handle.take();
    }
}
