//! scrim Render-Surface Lifecycle
//!
//! Tracks the OS-driven churn of the drawable surface (creation, resize,
//! destruction, silent driver drops), keeps the external rendering engine
//! informed, and bounds recovery time for stalled surfaces with a watchdog.

mod controller;
mod engine;
mod renderer;
mod surface;
mod watchdog;

pub use controller::{SurfaceController, SurfacePhase};
pub use engine::EngineHooks;
pub use renderer::{FirstSurfaceToken, FrameRenderer};
pub use surface::{PlatformSurface, SurfaceEvent};
pub use watchdog::{Watchdog, WatchdogConfig};
