//! scrim Harness
//!
//! Headless implementations of every external seam (toolkit, rendering
//! engine, platform surface) plus a pre-wired [`Session`]. Used by the
//! demo binary and the integration tests; nothing here talks to a real
//! windowing system.

mod engine;
mod session;
mod surface;
mod toolkit;

pub use engine::{EngineCall, RecordingEngine};
pub use session::Session;
pub use surface::FakeSurface;
pub use toolkit::{
    HeadlessContainer, HeadlessPane, HeadlessTextField, HeadlessToolkit, HeadlessVideoView,
    TextFieldFactory, VideoFactory,
};
