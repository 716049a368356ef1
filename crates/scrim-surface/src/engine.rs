//! Notification interface to the external rendering engine.

/// Callbacks consumed by the surface controller and frame renderer.
///
/// The engine is the sole owner of draw-call content and GPU resource
/// state; scrim only tells it when the context, viewport, or frame cadence
/// changes.
pub trait EngineHooks: Send + Sync {
    /// The GPU context was lost. Cached resources tied to it (texture
    /// handles, buffers) are invalid and must be re-created lazily.
    fn on_context_lost(&self);

    /// The drawable viewport changed size. The first call doubles as the
    /// "engine is now attachable" signal: it is the first callback
    /// guaranteed to carry a valid size.
    fn on_viewport_resized(&self, width: u32, height: u32);

    /// Advance and render one frame. Returns whether a frame was drawn.
    fn on_frame_requested(&self, can_render: bool) -> bool;

    /// Engine-side readiness, one leg of the renderability check.
    fn is_render_ready(&self) -> bool;
}
