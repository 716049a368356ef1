//! Recording engine stub.

use scrim_surface::EngineHooks;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One observed engine notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    ContextLost,
    ViewportResized { width: u32, height: u32 },
    FrameRequested { can_render: bool },
}

/// An engine that records every notification for assertions.
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    render_ready: AtomicBool,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            render_ready: AtomicBool::new(true),
        })
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The viewport sizes received so far, in order.
    pub fn resize_calls(&self) -> Vec<(u32, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::ViewportResized { width, height } => Some((width, height)),
                _ => None,
            })
            .collect()
    }

    pub fn context_losses(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, EngineCall::ContextLost))
            .count()
    }

    /// Script the engine-side readiness leg.
    pub fn set_render_ready(&self, ready: bool) {
        self.render_ready.store(ready, Ordering::SeqCst);
    }
}

impl EngineHooks for RecordingEngine {
    fn on_context_lost(&self) {
        self.calls.lock().unwrap().push(EngineCall::ContextLost);
    }

    fn on_viewport_resized(&self, width: u32, height: u32) {
        self.calls
            .lock()
            .unwrap()
            .push(EngineCall::ViewportResized { width, height });
    }

    fn on_frame_requested(&self, can_render: bool) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push(EngineCall::FrameRequested { can_render });
        can_render
    }

    fn is_render_ready(&self) -> bool {
        self.render_ready.load(Ordering::SeqCst)
    }
}
