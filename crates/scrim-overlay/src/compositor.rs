//! Overlay compositor: owns the three-layer view stack.
//!
//! Bottom to top: the render surface, a transparent overlay container, and
//! an absolute-position layer that receives registry objects. Overlay
//! positions are independent of surface resizes beyond explicit re-layout
//! calls.

use crate::toolkit::{ContainerView, UiToolkit, View};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// The assembled stack, bottom to top.
struct ViewStack {
    root: Arc<dyn ContainerView>,
    overlay: Arc<dyn ContainerView>,
    absolute: Arc<dyn ContainerView>,
}

/// Builds and owns the view stack around the render surface.
pub struct OverlayCompositor {
    stack: Mutex<Option<ViewStack>>,
}

impl OverlayCompositor {
    pub fn new() -> Self {
        Self {
            stack: Mutex::new(None),
        }
    }

    /// Build the view stack around the given render surface view.
    ///
    /// One-time initializer, to be run on the UI thread. Calling it again
    /// replaces the whole stack: objects registered against the previous
    /// stack keep their ids but lose their parent.
    pub fn attach(&self, toolkit: &Arc<dyn UiToolkit>, render_surface: Arc<dyn View>) {
        // The render surface goes in first so every other view stacks above
        // it.
        let root = toolkit.new_container();
        root.add_child(render_surface);

        // The overlay container only exists to host the absolute layer; it
        // stays transparent over the surface.
        let overlay = toolkit.new_container();
        let absolute = toolkit.new_container();
        let absolute_view: Arc<dyn View> = absolute.clone();
        overlay.add_child(absolute_view);
        let overlay_view: Arc<dyn View> = overlay.clone();
        root.add_child(overlay_view);

        let mut stack = self.stack.lock().unwrap();
        if stack.is_some() {
            warn!("overlay stack rebuilt; previously registered objects are orphaned");
        }
        *stack = Some(ViewStack {
            root,
            overlay,
            absolute,
        });
        debug!("overlay stack attached");
    }

    pub fn is_attached(&self) -> bool {
        self.stack.lock().unwrap().is_some()
    }

    /// The root container holding the whole stack, for host embedding.
    pub fn root_view(&self) -> Option<Arc<dyn ContainerView>> {
        self.stack.lock().unwrap().as_ref().map(|s| s.root.clone())
    }

    /// The container overlaid on the render surface.
    pub fn overlay_layer(&self) -> Option<Arc<dyn ContainerView>> {
        self.stack
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.overlay.clone())
    }

    /// The absolute-position layer that receives registry objects, once the
    /// stack has been built.
    pub fn absolute_layer(&self) -> Option<Arc<dyn ContainerView>> {
        self.stack
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.absolute.clone())
    }

    /// Tear the stack down. Registered objects must be removed first.
    pub fn release(&self) {
        if self.stack.lock().unwrap().take().is_some() {
            debug!("overlay stack released");
        }
    }
}

impl Default for OverlayCompositor {
    fn default() -> Self {
        Self::new()
    }
}
