//! Rendering-thread callback glue.
//!
//! Invoked by the platform's dedicated rendering thread, never the UI
//! thread. Updates readiness state and forwards viewport changes to the
//! engine; frame content is wholly delegated.

use crate::engine::EngineHooks;
use crate::surface::SurfaceEvent;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use tracing::debug;

/// Sentinel for "no dimension observed yet".
const SIZE_UNKNOWN: i32 = -1;

/// Tracks whether the next surface is the first since engine cold start.
///
/// The first surface draws into a fresh context and needs no forced
/// present; every later surface replaces a lost context, whose last frame
/// must be presented again even if content is unchanged. Shared explicitly
/// between the renderer and whoever tears the owning view down.
#[derive(Debug)]
pub struct FirstSurfaceToken {
    armed: AtomicBool,
}

impl FirstSurfaceToken {
    pub fn new() -> Self {
        Self {
            armed: AtomicBool::new(true),
        }
    }

    /// Consume the token. True only for the first surface after (re)arming.
    fn begin_surface(&self) -> bool {
        self.armed.swap(false, Ordering::SeqCst)
    }

    /// Re-arm, on full teardown and recreation of the owning view.
    pub fn clear(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl Default for FirstSurfaceToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-surface rendering state driven by the platform callbacks.
pub struct FrameRenderer {
    engine: Arc<dyn EngineHooks>,
    first_surface: Arc<FirstSurfaceToken>,
    events: Sender<SurfaceEvent>,
    can_render: AtomicBool,
    needs_swap: AtomicBool,
    last_width: AtomicI32,
    last_height: AtomicI32,
}

impl FrameRenderer {
    pub fn new(
        engine: Arc<dyn EngineHooks>,
        first_surface: Arc<FirstSurfaceToken>,
        events: Sender<SurfaceEvent>,
    ) -> Self {
        Self {
            engine,
            first_surface,
            events,
            can_render: AtomicBool::new(false),
            needs_swap: AtomicBool::new(false),
            last_width: AtomicI32::new(SIZE_UNKNOWN),
            last_height: AtomicI32::new(SIZE_UNKNOWN),
        }
    }

    /// A new surface exists.
    ///
    /// Every surface after the first replaces a lost context: the next
    /// frame must be force-presented to clear the transient black frame,
    /// and cached GPU resources are invalid.
    pub fn on_surface_created(&self) {
        if !self.first_surface.begin_surface() {
            self.needs_swap.store(true, Ordering::SeqCst);
        }
        self.engine.on_context_lost();
    }

    /// The surface changed size or finished (re)initialization.
    pub fn on_surface_changed(&self, width: u32, height: u32) {
        // First-time engine attachment happens here too: this is the first
        // callback guaranteed to carry a valid size.
        self.engine.on_viewport_resized(width, height);
        self.can_render.store(true, Ordering::SeqCst);

        let last_width = self.last_width.load(Ordering::SeqCst);
        let last_height = self.last_height.load(Ordering::SeqCst);
        let new_width = width as i32;
        let new_height = height as i32;
        if last_width >= 0
            && last_height >= 0
            && (last_width != new_width || last_height != new_height)
        {
            debug!(
                "surface resized {}x{} -> {}x{}",
                last_width, last_height, width, height
            );
            let _ = self.events.send(SurfaceEvent::Resized { width, height });
        }
        self.last_width.store(new_width, Ordering::SeqCst);
        self.last_height.store(new_height, Ordering::SeqCst);
    }

    /// Draw tick: ask the engine to advance one frame.
    pub fn on_draw_frame(&self, can_render: bool) -> bool {
        self.engine.on_frame_requested(can_render)
    }

    /// Renderer-side readiness: a surface-changed callback has completed
    /// since the renderer was last invalidated.
    pub fn can_render(&self) -> bool {
        self.can_render.load(Ordering::SeqCst)
    }

    /// Drop renderer readiness.
    ///
    /// For platform glue that observes a dead pipeline without a destroy
    /// callback (driver loss); the watchdog will then force recreation.
    pub fn invalidate(&self) {
        self.can_render.store(false, Ordering::SeqCst);
    }

    /// Whether the next frame must be presented even if unchanged. Reading
    /// clears the flag.
    pub fn take_needs_swap(&self) -> bool {
        self.needs_swap.swap(false, Ordering::SeqCst)
    }

    /// Last observed surface size, once one has been observed.
    pub fn last_size(&self) -> Option<(u32, u32)> {
        let width = self.last_width.load(Ordering::SeqCst);
        let height = self.last_height.load(Ordering::SeqCst);
        if width >= 0 && height >= 0 {
            Some((width as u32, height as u32))
        } else {
            None
        }
    }

    /// Treat the next surface as a cold start again.
    pub fn clear_first_surface(&self) {
        self.first_surface.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    struct NullEngine;

    impl EngineHooks for NullEngine {
        fn on_context_lost(&self) {}
        fn on_viewport_resized(&self, _width: u32, _height: u32) {}
        fn on_frame_requested(&self, can_render: bool) -> bool {
            can_render
        }
        fn is_render_ready(&self) -> bool {
            true
        }
    }

    fn renderer() -> (FrameRenderer, crossbeam_channel::Receiver<SurfaceEvent>) {
        let (tx, rx) = unbounded();
        let renderer = FrameRenderer::new(
            Arc::new(NullEngine),
            Arc::new(FirstSurfaceToken::new()),
            tx,
        );
        (renderer, rx)
    }

    #[test]
    fn test_resize_event_only_after_dimensions_known() {
        let (renderer, rx) = renderer();
        assert_eq!(renderer.last_size(), None);

        renderer.on_surface_changed(100, 200);
        assert_eq!(renderer.last_size(), Some((100, 200)));
        assert!(rx.try_recv().is_err());

        renderer.on_surface_changed(150, 200);
        assert_eq!(
            rx.try_recv().unwrap(),
            SurfaceEvent::Resized {
                width: 150,
                height: 200
            }
        );

        // Same size again: no further event.
        renderer.on_surface_changed(150, 200);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_needs_swap_only_after_first_surface() {
        let (renderer, _rx) = renderer();

        renderer.on_surface_created();
        assert!(!renderer.take_needs_swap());

        renderer.on_surface_created();
        assert!(renderer.take_needs_swap());
        // take clears the flag
        assert!(!renderer.take_needs_swap());
    }

    #[test]
    fn test_clear_first_surface_rearms() {
        let (renderer, _rx) = renderer();

        renderer.on_surface_created();
        renderer.clear_first_surface();
        renderer.on_surface_created();
        assert!(!renderer.take_needs_swap());
    }

    #[test]
    fn test_invalidate_drops_readiness() {
        let (renderer, _rx) = renderer();
        assert!(!renderer.can_render());

        renderer.on_surface_changed(100, 200);
        assert!(renderer.can_render());

        renderer.invalidate();
        assert!(!renderer.can_render());
    }
}
