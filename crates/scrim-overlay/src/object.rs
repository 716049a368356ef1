//! Overlay object model: identity, geometry, cached per-object state, and
//! the capability traits concrete toolkit elements implement.

use crate::toolkit::{UiToolkit, View};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Unique identifier for an overlay object.
///
/// `0` is the invalid id: objects read it back after they have been
/// tombstoned, so toolkit events still in flight against a destroyed
/// element are recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub i32);

impl OverlayId {
    /// The id of a destroyed or not-yet-registered object.
    pub const INVALID: OverlayId = OverlayId(0);

    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Whether this id can address a live object.
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Overlay({})", self.0)
    }
}

/// Absolute pixel rectangle, relative to the overlay layer's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Grow the rectangle outward by per-edge padding, keeping the inner
    /// rect where it was requested.
    pub fn inflate(&self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: self.left - left,
            top: self.top - top,
            width: self.width + left + right,
            height: self.height + top + bottom,
        }
    }
}

/// An opaque background fill, stored as ARGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background(pub u32);

impl Background {
    pub const WHITE: Background = Background(0xFFFF_FFFF);
}

/// Per-object cached state.
///
/// The registry caches the clamped alpha here so alpha getters never
/// round-trip through the toolkit, and stashes a hidden background fill so
/// it can be restored when the background is shown again.
#[derive(Debug)]
pub struct ObjectState {
    alpha_bits: AtomicU32,
    stashed_background: Mutex<Option<Background>>,
}

impl ObjectState {
    pub fn new() -> Self {
        Self {
            alpha_bits: AtomicU32::new(1.0f32.to_bits()),
            stashed_background: Mutex::new(None),
        }
    }

    pub fn alpha(&self) -> f32 {
        f32::from_bits(self.alpha_bits.load(Ordering::Relaxed))
    }

    pub fn set_alpha(&self, alpha: f32) {
        self.alpha_bits.store(alpha.to_bits(), Ordering::Relaxed);
    }

    pub fn stash_background(&self, background: Option<Background>) {
        *self.stashed_background.lock().unwrap() = background;
    }

    pub fn take_stashed_background(&self) -> Option<Background> {
        self.stashed_background.lock().unwrap().take()
    }
}

impl Default for ObjectState {
    fn default() -> Self {
        Self::new()
    }
}

/// A toolkit-native element layered over the render surface.
///
/// The element itself is owned by the UI thread. Everything reachable
/// through this trait is either atomic or replaced whole in one call, so a
/// cross-thread read returns the old value or the new one, never a torn
/// one.
pub trait OverlayObject: View {
    /// Current id. Reads [`OverlayId::INVALID`] once the object has been
    /// tombstoned.
    fn id(&self) -> OverlayId;

    /// Reassign the id. Passing [`OverlayId::INVALID`] tombstones the
    /// object.
    fn set_id(&self, id: OverlayId);

    fn state(&self) -> &ObjectState;

    /// Position the element. Kinds may adjust the rect first: a text field
    /// inflates it by its border padding so the requested rect frames the
    /// editable area, not the border.
    fn apply_bounds(&self, bounds: Bounds);

    fn bounds(&self) -> Bounds;

    /// Blend the element at the given opacity.
    fn apply_blend(&self, alpha: f32);

    /// Remove any blend effect, restoring full opacity.
    fn clear_blend(&self);

    fn background(&self) -> Option<Background>;

    fn set_background(&self, background: Option<Background>);

    /// Text-editing capability, when this kind has one.
    fn as_text_input(&self) -> Option<&dyn TextInput> {
        None
    }

    /// Video playback capability, when this kind has one.
    fn as_video_player(&self) -> Option<&dyn VideoPlayer> {
        None
    }

    /// Stop whatever the element is doing while the host is backgrounded.
    fn suspend(&self) {}

    /// Undo [`suspend`](OverlayObject::suspend).
    fn resume(&self) {}

    /// Teardown hook, run on the UI thread after the element has been
    /// detached from its parent and before its id is tombstoned. Detachment
    /// may emit toolkit events carrying the old id; they still resolve here.
    fn released(&self) {}
}

/// Text-editing capability of an overlay object.
///
/// Selection positions are character offsets. Implementations replace state
/// whole per call; clamping policy lives in the registry.
pub trait TextInput: Send + Sync {
    fn text(&self) -> String;
    fn set_text(&self, text: &str);

    fn selection(&self) -> (usize, usize);
    fn set_selection(&self, start: usize, end: usize);

    fn placeholder(&self) -> Option<String>;
    fn set_placeholder(&self, placeholder: &str);

    fn is_editable(&self) -> bool;
    fn set_editable(&self, editable: bool);

    fn is_single_line(&self) -> bool;
    fn set_single_line(&self, single_line: bool);

    fn is_password(&self) -> bool;
    fn set_password(&self, password: bool);
}

/// Video playback capability of an overlay object.
///
/// Positions and durations are whole seconds at this seam; players that
/// track milliseconds convert internally.
pub trait VideoPlayer: Send + Sync {
    /// Load a media source. Playback state is unchanged on error.
    fn load(&self, source: &str) -> Result<(), OverlayError>;

    fn play(&self);
    fn pause(&self);
    fn is_playing(&self) -> bool;

    fn seek(&self, seconds: u32);

    /// Current playback position in seconds.
    fn position(&self) -> u32;

    /// Total duration in seconds, `0` while unknown.
    fn duration(&self) -> u32;

    fn set_muted(&self, muted: bool);
    fn is_muted(&self) -> bool;
}

/// Per-kind creation interface consumed by the registry.
pub trait OverlayFactory: Send + Sync {
    /// Build a fully constructed, not-yet-registered element.
    fn create(&self, toolkit: &Arc<dyn UiToolkit>) -> Arc<dyn OverlayObject>;
}

/// Errors surfaced by overlay capabilities.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("unusable media source: {0:?}")]
    MediaSource(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_id() {
        assert!(!OverlayId::INVALID.is_valid());
        assert!(OverlayId::new(7).is_valid());
        assert_eq!(OverlayId::new(7).to_string(), "Overlay(7)");
    }

    #[test]
    fn test_bounds_inflate() {
        let bounds = Bounds::new(10, 20, 100, 40);
        let inflated = bounds.inflate(4, 4, 4, 4);

        assert_eq!(inflated, Bounds::new(6, 16, 108, 48));
    }

    #[test]
    fn test_object_state_defaults_opaque() {
        let state = ObjectState::new();
        assert_eq!(state.alpha(), 1.0);

        state.set_alpha(0.25);
        assert_eq!(state.alpha(), 0.25);
    }

    #[test]
    fn test_background_stash_roundtrip() {
        let state = ObjectState::new();
        assert!(state.take_stashed_background().is_none());

        state.stash_background(Some(Background(0xFF00_FF00)));
        assert_eq!(
            state.take_stashed_background(),
            Some(Background(0xFF00_FF00))
        );
        // take empties the stash
        assert!(state.take_stashed_background().is_none());
    }
}
