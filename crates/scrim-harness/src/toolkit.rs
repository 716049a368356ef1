//! In-memory toolkit: containers and two overlay kinds.
//!
//! Behaves like a real toolkit as far as the overlay runtime can observe
//! (child bookkeeping, per-kind bounds policies, blend state) without a
//! windowing system underneath.

use scrim_overlay::{
    Background, Bounds, ContainerView, ObjectState, OverlayError, OverlayFactory, OverlayId,
    OverlayObject, TextInput, UiToolkit, VideoPlayer, View,
};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Per-edge border padding a text field adds around its editable area.
const TEXT_BORDER_PADDING: i32 = 4;

/// Factory for in-memory containers.
pub struct HeadlessToolkit;

impl UiToolkit for HeadlessToolkit {
    fn new_container(&self) -> Arc<dyn ContainerView> {
        Arc::new(HeadlessContainer::new())
    }
}

/// A container recording its children in stacking order.
pub struct HeadlessContainer {
    visible: AtomicBool,
    children: Mutex<Vec<Arc<dyn View>>>,
}

impl HeadlessContainer {
    pub fn new() -> Self {
        Self {
            visible: AtomicBool::new(true),
            children: Mutex::new(Vec::new()),
        }
    }

    pub fn has_child(&self, child: &Arc<dyn View>) -> bool {
        self.children
            .lock()
            .unwrap()
            .iter()
            .any(|c| Arc::ptr_eq(c, child))
    }
}

impl Default for HeadlessContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl View for HeadlessContainer {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }
}

impl ContainerView for HeadlessContainer {
    fn add_child(&self, child: Arc<dyn View>) {
        self.children.lock().unwrap().push(child);
    }

    fn remove_child(&self, child: &Arc<dyn View>) {
        self.children
            .lock()
            .unwrap()
            .retain(|c| !Arc::ptr_eq(c, child));
    }

    fn clear(&self) {
        self.children.lock().unwrap().clear();
    }

    fn child_count(&self) -> usize {
        self.children.lock().unwrap().len()
    }
}

/// A leaf view standing in for the render surface inside the view stack.
pub struct HeadlessPane {
    visible: AtomicBool,
}

impl HeadlessPane {
    pub fn new() -> Self {
        Self {
            visible: AtomicBool::new(true),
        }
    }
}

impl Default for HeadlessPane {
    fn default() -> Self {
        Self::new()
    }
}

impl View for HeadlessPane {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }
}

/// An editable text field overlay.
pub struct HeadlessTextField {
    id: AtomicI32,
    visible: AtomicBool,
    bounds: Mutex<Bounds>,
    blend: Mutex<Option<f32>>,
    background: Mutex<Option<Background>>,
    state: ObjectState,
    text: Mutex<String>,
    selection: Mutex<(usize, usize)>,
    placeholder: Mutex<Option<String>>,
    editable: AtomicBool,
    single_line: AtomicBool,
    password: AtomicBool,
    release_log: Option<Arc<Mutex<Vec<OverlayId>>>>,
}

impl HeadlessTextField {
    fn new(single_line: bool, release_log: Option<Arc<Mutex<Vec<OverlayId>>>>) -> Self {
        Self {
            id: AtomicI32::new(OverlayId::INVALID.0),
            visible: AtomicBool::new(true),
            bounds: Mutex::new(Bounds::new(0, 0, 0, 0)),
            blend: Mutex::new(None),
            background: Mutex::new(Some(Background::WHITE)),
            state: ObjectState::new(),
            text: Mutex::new(String::new()),
            selection: Mutex::new((0, 0)),
            placeholder: Mutex::new(None),
            editable: AtomicBool::new(true),
            single_line: AtomicBool::new(single_line),
            password: AtomicBool::new(false),
            release_log,
        }
    }

    /// Current blend opacity, `None` when no blend effect is applied.
    pub fn blend(&self) -> Option<f32> {
        *self.blend.lock().unwrap()
    }
}

impl View for HeadlessTextField {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }
}

impl OverlayObject for HeadlessTextField {
    fn id(&self) -> OverlayId {
        OverlayId(self.id.load(Ordering::SeqCst))
    }

    fn set_id(&self, id: OverlayId) {
        self.id.store(id.0, Ordering::SeqCst);
    }

    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn apply_bounds(&self, bounds: Bounds) {
        // The requested rect frames the editable area; the border sits
        // outside it.
        *self.bounds.lock().unwrap() = bounds.inflate(
            TEXT_BORDER_PADDING,
            TEXT_BORDER_PADDING,
            TEXT_BORDER_PADDING,
            TEXT_BORDER_PADDING,
        );
    }

    fn bounds(&self) -> Bounds {
        *self.bounds.lock().unwrap()
    }

    fn apply_blend(&self, alpha: f32) {
        *self.blend.lock().unwrap() = Some(alpha);
    }

    fn clear_blend(&self) {
        *self.blend.lock().unwrap() = None;
    }

    fn background(&self) -> Option<Background> {
        *self.background.lock().unwrap()
    }

    fn set_background(&self, background: Option<Background>) {
        *self.background.lock().unwrap() = background;
    }

    fn as_text_input(&self) -> Option<&dyn TextInput> {
        Some(self)
    }

    fn released(&self) {
        if let Some(log) = &self.release_log {
            log.lock().unwrap().push(self.id());
        }
    }
}

impl TextInput for HeadlessTextField {
    fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = text.to_string();
    }

    fn selection(&self) -> (usize, usize) {
        *self.selection.lock().unwrap()
    }

    fn set_selection(&self, start: usize, end: usize) {
        *self.selection.lock().unwrap() = (start, end);
    }

    fn placeholder(&self) -> Option<String> {
        self.placeholder.lock().unwrap().clone()
    }

    fn set_placeholder(&self, placeholder: &str) {
        *self.placeholder.lock().unwrap() = Some(placeholder.to_string());
    }

    fn is_editable(&self) -> bool {
        self.editable.load(Ordering::SeqCst)
    }

    fn set_editable(&self, editable: bool) {
        self.editable.store(editable, Ordering::SeqCst);
    }

    fn is_single_line(&self) -> bool {
        self.single_line.load(Ordering::SeqCst)
    }

    fn set_single_line(&self, single_line: bool) {
        self.single_line.store(single_line, Ordering::SeqCst);
    }

    fn is_password(&self) -> bool {
        self.password.load(Ordering::SeqCst)
    }

    fn set_password(&self, password: bool) {
        self.password.store(password, Ordering::SeqCst);
    }
}

/// Creates text field overlays.
pub struct TextFieldFactory {
    single_line: bool,
    release_log: Option<Arc<Mutex<Vec<OverlayId>>>>,
    created: Option<Arc<Mutex<Vec<Arc<HeadlessTextField>>>>>,
}

impl TextFieldFactory {
    pub fn new(single_line: bool) -> Self {
        Self {
            single_line,
            release_log: None,
            created: None,
        }
    }

    /// Record the id of every released field into `log`, in release order.
    pub fn with_release_log(mut self, log: Arc<Mutex<Vec<OverlayId>>>) -> Self {
        self.release_log = Some(log);
        self
    }

    /// Hand every created field to `slot` so tests can reach the concrete
    /// type.
    pub fn capture_created(mut self, slot: Arc<Mutex<Vec<Arc<HeadlessTextField>>>>) -> Self {
        self.created = Some(slot);
        self
    }
}

impl OverlayFactory for TextFieldFactory {
    fn create(&self, _toolkit: &Arc<dyn UiToolkit>) -> Arc<dyn OverlayObject> {
        let field = Arc::new(HeadlessTextField::new(
            self.single_line,
            self.release_log.clone(),
        ));
        if let Some(slot) = &self.created {
            slot.lock().unwrap().push(field.clone());
        }
        field
    }
}

/// A video playback overlay. Tracks milliseconds internally; the playback
/// capability converts at its seam.
pub struct HeadlessVideoView {
    id: AtomicI32,
    visible: AtomicBool,
    bounds: Mutex<Bounds>,
    blend: Mutex<Option<f32>>,
    background: Mutex<Option<Background>>,
    state: ObjectState,
    source: Mutex<Option<String>>,
    playing: AtomicBool,
    muted: AtomicBool,
    position_ms: AtomicU32,
    duration_ms: AtomicU32,
    resume_playing: AtomicBool,
    hardware_layer: AtomicBool,
}

impl HeadlessVideoView {
    fn new() -> Self {
        Self {
            id: AtomicI32::new(OverlayId::INVALID.0),
            visible: AtomicBool::new(true),
            bounds: Mutex::new(Bounds::new(0, 0, 0, 0)),
            blend: Mutex::new(None),
            background: Mutex::new(None),
            state: ObjectState::new(),
            source: Mutex::new(None),
            playing: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            position_ms: AtomicU32::new(0),
            duration_ms: AtomicU32::new(0),
            resume_playing: AtomicBool::new(false),
            hardware_layer: AtomicBool::new(false),
        }
    }

    pub fn is_hardware_accelerated(&self) -> bool {
        self.hardware_layer.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> Option<String> {
        self.source.lock().unwrap().clone()
    }

    /// Script the clip length, as a real player would learn it from the
    /// loaded media.
    pub fn set_media_duration(&self, seconds: u32) {
        self.duration_ms.store(seconds * 1000, Ordering::SeqCst);
    }
}

impl View for HeadlessVideoView {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    // Video surfaces composite through a hardware layer when asked; the
    // text field keeps the no-op default.
    fn set_hardware_accelerated(&self, enabled: bool) {
        self.hardware_layer.store(enabled, Ordering::SeqCst);
    }
}

impl OverlayObject for HeadlessVideoView {
    fn id(&self) -> OverlayId {
        OverlayId(self.id.load(Ordering::SeqCst))
    }

    fn set_id(&self, id: OverlayId) {
        self.id.store(id.0, Ordering::SeqCst);
    }

    fn state(&self) -> &ObjectState {
        &self.state
    }

    fn apply_bounds(&self, bounds: Bounds) {
        *self.bounds.lock().unwrap() = bounds;
    }

    fn bounds(&self) -> Bounds {
        *self.bounds.lock().unwrap()
    }

    fn apply_blend(&self, alpha: f32) {
        *self.blend.lock().unwrap() = Some(alpha);
    }

    fn clear_blend(&self) {
        *self.blend.lock().unwrap() = None;
    }

    fn background(&self) -> Option<Background> {
        *self.background.lock().unwrap()
    }

    fn set_background(&self, background: Option<Background>) {
        *self.background.lock().unwrap() = background;
    }

    fn as_video_player(&self) -> Option<&dyn VideoPlayer> {
        Some(self)
    }

    fn suspend(&self) {
        if self.playing.swap(false, Ordering::SeqCst) {
            self.resume_playing.store(true, Ordering::SeqCst);
        }
    }

    fn resume(&self) {
        if self.resume_playing.swap(false, Ordering::SeqCst) {
            self.playing.store(true, Ordering::SeqCst);
        }
    }

    fn released(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }
}

impl VideoPlayer for HeadlessVideoView {
    fn load(&self, source: &str) -> Result<(), OverlayError> {
        if source.is_empty() {
            return Err(OverlayError::MediaSource(source.to_string()));
        }
        *self.source.lock().unwrap() = Some(source.to_string());
        self.position_ms.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn seek(&self, seconds: u32) {
        self.position_ms.store(seconds * 1000, Ordering::SeqCst);
    }

    fn position(&self) -> u32 {
        self.position_ms.load(Ordering::SeqCst) / 1000
    }

    fn duration(&self) -> u32 {
        self.duration_ms.load(Ordering::SeqCst) / 1000
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }
}

/// Creates video overlays.
pub struct VideoFactory {
    created: Option<Arc<Mutex<Vec<Arc<HeadlessVideoView>>>>>,
}

impl VideoFactory {
    pub fn new() -> Self {
        Self { created: None }
    }

    /// Hand every created view to `slot` so tests can reach the concrete
    /// type.
    pub fn capture_created(mut self, slot: Arc<Mutex<Vec<Arc<HeadlessVideoView>>>>) -> Self {
        self.created = Some(slot);
        self
    }
}

impl Default for VideoFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayFactory for VideoFactory {
    fn create(&self, _toolkit: &Arc<dyn UiToolkit>) -> Arc<dyn OverlayObject> {
        let view = Arc::new(HeadlessVideoView::new());
        if let Some(slot) = &self.created {
            slot.lock().unwrap().push(view.clone());
        }
        view
    }
}
