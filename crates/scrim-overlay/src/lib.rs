//! scrim Overlay Runtime
//!
//! Manages toolkit-native overlay objects layered on top of a render
//! surface:
//! - A single UI thread that owns every toolkit object, fed by an ordered
//!   work queue
//! - A thread-safe registry addressing overlay objects by integer id
//! - A compositor owning the render-surface / overlay / absolute-layer stack

mod compositor;
mod dispatch;
mod object;
mod registry;
mod toolkit;

pub use compositor::OverlayCompositor;
pub use dispatch::{UiDispatcher, UiTask, UiThread};
pub use object::{
    Background, Bounds, ObjectState, OverlayError, OverlayFactory, OverlayId, OverlayObject,
    TextInput, VideoPlayer,
};
pub use registry::OverlayRegistry;
pub use toolkit::{ContainerView, UiToolkit, View};
