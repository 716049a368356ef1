//! The OS-owned drawable surface, as seen by scrim.

/// Handle to the platform's drawable surface.
///
/// The OS creates and destroys the underlying handle on rotation,
/// backgrounding, and driver resets; scrim only ever inspects it.
pub trait PlatformSurface: Send + Sync {
    /// Whether the OS handle still exists and is usable.
    fn is_valid(&self) -> bool;

    /// Current surface dimensions in pixels.
    fn size(&self) -> (u32, u32);
}

/// Notifications emitted by the frame renderer toward the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The surface dimensions changed after they were first known. Not
    /// emitted for the initial sizing that accompanies (re)initialization,
    /// so orientation changes are observable on their own.
    Resized { width: u32, height: u32 },
}
