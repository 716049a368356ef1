//! Thread-safe registry of overlay objects addressed by integer id.
//!
//! Membership (insert, remove, scan) is guarded by a single lock and the
//! lock is never held across a toolkit call. Mutations of the underlying
//! elements are marshalled to the UI thread and fire-and-forget; getters
//! read directly on the calling thread and may race an in-flight setter,
//! returning either the old or the new value.

use crate::compositor::OverlayCompositor;
use crate::dispatch::UiDispatcher;
use crate::object::{
    Background, Bounds, OverlayFactory, OverlayId, OverlayObject, TextInput, VideoPlayer,
};
use crate::toolkit::{UiToolkit, View};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Alpha at or above this is treated as fully opaque: the blend effect is
/// removed entirely instead of leaving a near-1.0 blend behind.
const OPAQUE_ALPHA: f32 = 0.9999;

type ObjectList = Arc<Mutex<Vec<Arc<dyn OverlayObject>>>>;

pub struct OverlayRegistry {
    objects: ObjectList,
    dispatcher: UiDispatcher,
    toolkit: Arc<dyn UiToolkit>,
    compositor: Arc<OverlayCompositor>,
}

impl OverlayRegistry {
    pub fn new(
        dispatcher: UiDispatcher,
        toolkit: Arc<dyn UiToolkit>,
        compositor: Arc<OverlayCompositor>,
    ) -> Self {
        Self {
            objects: Arc::new(Mutex::new(Vec::new())),
            dispatcher,
            toolkit,
            compositor,
        }
    }

    /// Create an overlay object on the UI thread and register it.
    ///
    /// A silent no-op until the compositor has been attached: with no
    /// parent container there is nothing to hold the object, and callers
    /// may legitimately race engine startup. Ids must be non-zero and
    /// unused; a conflicting create is dropped.
    pub fn create_object(&self, factory: Arc<dyn OverlayFactory>, id: OverlayId, bounds: Bounds) {
        if !id.is_valid() {
            warn!("refusing to create overlay with the invalid id");
            return;
        }
        let objects = self.objects.clone();
        let toolkit = self.toolkit.clone();
        let compositor = self.compositor.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(layer) = compositor.absolute_layer() else {
                debug!("create {} before compositor attach, ignoring", id);
                return;
            };
            if objects.lock().unwrap().iter().any(|o| o.id() == id) {
                warn!("overlay id {} already registered, dropping create", id);
                return;
            }

            let object = factory.create(&toolkit);
            object.apply_bounds(bounds);
            let view: Arc<dyn View> = object.clone();
            layer.add_child(view);
            object.set_id(id);

            objects.lock().unwrap().push(object);
            debug!("created overlay {}", id);
        });
    }

    /// Fetch an overlay object by id. Callable from any thread.
    ///
    /// A linear scan under the membership lock; overlay counts are tens,
    /// not thousands.
    pub fn find_by_id(&self, id: OverlayId) -> Option<Arc<dyn OverlayObject>> {
        if !id.is_valid() {
            return None;
        }
        let objects = self.objects.lock().unwrap();
        objects.iter().find(|o| o.id() == id).cloned()
    }

    /// Fetch an object by id only when it has the text capability.
    pub fn find_text_input(&self, id: OverlayId) -> Option<Arc<dyn OverlayObject>> {
        self.find_by_id(id).filter(|o| o.as_text_input().is_some())
    }

    /// Fetch an object by id only when it has the video capability.
    pub fn find_video_player(&self, id: OverlayId) -> Option<Arc<dyn OverlayObject>> {
        self.find_by_id(id).filter(|o| o.as_video_player().is_some())
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }

    /// Remove the object with the given id. A no-op for unknown ids.
    ///
    /// Membership is dropped under the lock first, so no later lookup can
    /// resolve the id. Detachment and the tombstone then run on the UI
    /// thread, tombstone last: detachment may emit toolkit events that
    /// still carry the old id, and those must resolve against the object
    /// while it is being torn down.
    pub fn remove(&self, id: OverlayId) {
        let object = {
            let mut objects = self.objects.lock().unwrap();
            match objects.iter().position(|o| o.id() == id) {
                Some(index) => objects.remove(index),
                None => return,
            }
        };

        let compositor = self.compositor.clone();
        self.dispatcher.run_on_ui(move || {
            if let Some(layer) = compositor.absolute_layer() {
                let view: Arc<dyn View> = object.clone();
                layer.remove_child(&view);
            }
            object.released();
            object.set_id(OverlayId::INVALID);
            debug!("removed overlay {}", id);
        });
    }

    /// Remove every object, newest first.
    ///
    /// Draining from the tail destroys in reverse creation order, which
    /// keeps container views that are still iterating stable.
    pub fn remove_all(&self) {
        loop {
            let id = {
                let objects = self.objects.lock().unwrap();
                match objects.last() {
                    Some(object) => object.id(),
                    None => break,
                }
            };
            self.remove(id);
        }
    }

    /// Show or hide an object. Showing re-applies the cached alpha effect;
    /// hiding drops any blend so the next show starts clean.
    pub fn set_visible(&self, id: OverlayId, visible: bool) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            object.set_visible(visible);
            if visible {
                apply_alpha(object.as_ref(), object.state().alpha());
            } else {
                object.clear_blend();
            }
        });
    }

    pub fn is_visible(&self, id: OverlayId) -> bool {
        self.find_by_id(id).map(|o| o.is_visible()).unwrap_or(false)
    }

    /// Set an object's alpha, clamped to `[0.0, 1.0]`.
    ///
    /// The clamped value is cached for [`alpha`](Self::alpha). A blend is
    /// applied only while the object is visible and below the opaque
    /// threshold; at exactly `1.0` any blend effect is removed.
    pub fn set_alpha(&self, id: OverlayId, alpha: f32) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            let alpha = alpha.clamp(0.0, 1.0);
            object.state().set_alpha(alpha);
            apply_alpha(object.as_ref(), alpha);
        });
    }

    /// Cached alpha for an object, `1.0` when the id is unknown.
    pub fn alpha(&self, id: OverlayId) -> f32 {
        self.find_by_id(id).map(|o| o.state().alpha()).unwrap_or(1.0)
    }

    /// Show or hide an object's background fill.
    ///
    /// Hiding stashes the current fill so a later show restores it; showing
    /// with nothing stashed falls back to the default white fill.
    pub fn set_background_visible(&self, id: OverlayId, visible: bool) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            let current = object.background();
            if visible == current.is_some() {
                return;
            }
            if visible {
                let restored = object
                    .state()
                    .take_stashed_background()
                    .unwrap_or(Background::WHITE);
                object.set_background(Some(restored));
            } else {
                object.state().stash_background(current);
                object.set_background(None);
            }
        });
    }

    pub fn has_background(&self, id: OverlayId) -> bool {
        self.find_by_id(id)
            .map(|o| o.background().is_some())
            .unwrap_or(false)
    }

    /// Hint that an object should use a hardware-composited layer.
    /// Best-effort: views without the capability ignore it.
    pub fn set_hardware_accelerated(&self, id: OverlayId, enabled: bool) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            object.set_hardware_accelerated(enabled);
        });
    }

    /// Re-position an object, applying its kind's bounds policy.
    pub fn update_bounds(&self, id: OverlayId, bounds: Bounds) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            object.apply_bounds(bounds);
        });
    }

    pub fn bounds(&self, id: OverlayId) -> Option<Bounds> {
        self.find_by_id(id).map(|o| o.bounds())
    }

    /// Pause whatever every registered object is doing (host backgrounded).
    pub fn suspend_all(&self) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            for object in snapshot(&objects) {
                object.suspend();
            }
        });
    }

    /// Restart what [`suspend_all`](Self::suspend_all) paused.
    pub fn resume_all(&self) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            for object in snapshot(&objects) {
                object.resume();
            }
        });
    }

    // ---- text fields -----------------------------------------------------

    /// Replace a text field's value, preserving the cursor.
    ///
    /// The selection is captured before the swap and re-applied clamped to
    /// the new text length.
    pub fn set_text(&self, id: OverlayId, text: String) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            let Some(input) = object.as_text_input() else {
                return;
            };
            let (start, end) = input.selection();
            input.set_text(&text);
            let len = input.text().chars().count();
            input.set_selection(start.min(len), end.min(len));
        });
    }

    /// Current text value, empty when the id does not resolve to a text
    /// field.
    pub fn text(&self, id: OverlayId) -> String {
        self.find_by_id(id)
            .and_then(|o| o.as_text_input().map(|t| t.text()))
            .unwrap_or_default()
    }

    /// Set a text field's selection range, clamped to the current text.
    ///
    /// A start past the end of the text collapses the whole range there;
    /// negative positions clamp to zero; an inverted range collapses to its
    /// end position.
    pub fn set_selection(&self, id: OverlayId, start: i32, end: i32) {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            let Some(input) = object.as_text_input() else {
                return;
            };
            let len = input.text().chars().count() as i32;
            let mut start = start;
            let mut end = end;
            if start > len {
                start = len;
                end = len;
            }
            if end > len {
                end = len;
            }
            if start < 0 {
                start = 0;
            }
            if end < 0 {
                end = 0;
            }
            if start > end {
                start = end;
            }
            input.set_selection(start as usize, end as usize);
        });
    }

    pub fn selection(&self, id: OverlayId) -> Option<(usize, usize)> {
        self.find_by_id(id)
            .and_then(|o| o.as_text_input().map(|t| t.selection()))
    }

    pub fn set_placeholder(&self, id: OverlayId, placeholder: String) {
        self.with_text_input(id, move |input| input.set_placeholder(&placeholder));
    }

    pub fn placeholder(&self, id: OverlayId) -> Option<String> {
        self.find_by_id(id)
            .and_then(|o| o.as_text_input().and_then(|t| t.placeholder()))
    }

    pub fn set_editable(&self, id: OverlayId, editable: bool) {
        self.with_text_input(id, move |input| input.set_editable(editable));
    }

    pub fn is_editable(&self, id: OverlayId) -> bool {
        self.find_by_id(id)
            .and_then(|o| o.as_text_input().map(|t| t.is_editable()))
            .unwrap_or(true)
    }

    pub fn set_single_line(&self, id: OverlayId, single_line: bool) {
        self.with_text_input(id, move |input| input.set_single_line(single_line));
    }

    pub fn is_single_line(&self, id: OverlayId) -> bool {
        self.find_by_id(id)
            .and_then(|o| o.as_text_input().map(|t| t.is_single_line()))
            .unwrap_or(true)
    }

    pub fn set_password(&self, id: OverlayId, password: bool) {
        self.with_text_input(id, move |input| input.set_password(password));
    }

    pub fn is_password(&self, id: OverlayId) -> bool {
        self.find_by_id(id)
            .and_then(|o| o.as_text_input().map(|t| t.is_password()))
            .unwrap_or(false)
    }

    /// Marshal a closure against a text field, dropping it on a miss.
    fn with_text_input<F>(&self, id: OverlayId, f: F)
    where
        F: FnOnce(&dyn TextInput) + Send + 'static,
    {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            if let Some(input) = object.as_text_input() {
                f(input);
            }
        });
    }

    // ---- video overlays --------------------------------------------------

    /// Load a media source into a video overlay. Failures degrade playback,
    /// not correctness, and are only logged.
    pub fn video_load(&self, id: OverlayId, source: String) {
        self.with_video_player(id, move |player| {
            if let Err(error) = player.load(&source) {
                warn!("video {} load failed: {}", id, error);
            }
        });
    }

    pub fn video_play(&self, id: OverlayId) {
        self.with_video_player(id, |player| player.play());
    }

    pub fn video_pause(&self, id: OverlayId) {
        self.with_video_player(id, |player| player.pause());
    }

    pub fn video_seek(&self, id: OverlayId, seconds: u32) {
        self.with_video_player(id, move |player| player.seek(seconds));
    }

    pub fn video_set_muted(&self, id: OverlayId, muted: bool) {
        self.with_video_player(id, move |player| player.set_muted(muted));
    }

    pub fn video_position(&self, id: OverlayId) -> u32 {
        self.find_by_id(id)
            .and_then(|o| o.as_video_player().map(|p| p.position()))
            .unwrap_or(0)
    }

    pub fn video_duration(&self, id: OverlayId) -> u32 {
        self.find_by_id(id)
            .and_then(|o| o.as_video_player().map(|p| p.duration()))
            .unwrap_or(0)
    }

    pub fn video_is_playing(&self, id: OverlayId) -> bool {
        self.find_by_id(id)
            .and_then(|o| o.as_video_player().map(|p| p.is_playing()))
            .unwrap_or(false)
    }

    pub fn video_is_muted(&self, id: OverlayId) -> bool {
        self.find_by_id(id)
            .and_then(|o| o.as_video_player().map(|p| p.is_muted()))
            .unwrap_or(false)
    }

    /// Marshal a closure against a video overlay, dropping it on a miss.
    fn with_video_player<F>(&self, id: OverlayId, f: F)
    where
        F: FnOnce(&dyn VideoPlayer) + Send + 'static,
    {
        let objects = self.objects.clone();
        self.dispatcher.run_on_ui(move || {
            let Some(object) = find_in(&objects, id) else {
                return;
            };
            if let Some(player) = object.as_video_player() {
                f(player);
            }
        });
    }
}

fn find_in(objects: &ObjectList, id: OverlayId) -> Option<Arc<dyn OverlayObject>> {
    let objects = objects.lock().unwrap();
    objects.iter().find(|o| o.id() == id).cloned()
}

/// Clone the membership so per-object calls run with the lock released.
fn snapshot(objects: &ObjectList) -> Vec<Arc<dyn OverlayObject>> {
    objects.lock().unwrap().clone()
}

/// Apply the cached alpha as a blend effect, or remove the effect entirely
/// when the object is effectively opaque or hidden.
fn apply_alpha(object: &dyn OverlayObject, alpha: f32) {
    if alpha < OPAQUE_ALPHA && object.is_visible() {
        object.apply_blend(alpha);
    } else {
        object.clear_blend();
    }
}
