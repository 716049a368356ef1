//! Scriptable platform surface.

use scrim_surface::PlatformSurface;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A platform surface whose validity and size tests control directly.
pub struct FakeSurface {
    valid: AtomicBool,
    size: Mutex<(u32, u32)>,
}

impl FakeSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            valid: AtomicBool::new(true),
            size: Mutex::new((width, height)),
        }
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }

    pub fn set_size(&self, width: u32, height: u32) {
        *self.size.lock().unwrap() = (width, height);
    }
}

impl PlatformSurface for FakeSurface {
    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn size(&self) -> (u32, u32) {
        *self.size.lock().unwrap()
    }
}
