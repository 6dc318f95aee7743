use tiny_skia::{Pixmap, PixmapMut};

/// Something that can put a finished frame on screen.
pub trait PublishTarget {
    /// Returns `false` when the surface cannot accept a frame yet
    /// (not created or not configured). The frame is kept for later.
    fn present(&mut self, frame: &Pixmap) -> bool;
}

/// The launcher's own off-screen buffer. Drawing always happens here; the
/// last drawn frame is retained until a target accepts it.
pub struct FrameBuffer {
    pixmap: Pixmap,
    pending: bool,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width.max(1), height.max(1))?,
            pending: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Reallocates the buffer when the size changed. Returns whether it did.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width == self.width() && height == self.height()) {
            return false;
        }
        match Pixmap::new(width, height) {
            Some(pixmap) => {
                self.pixmap = pixmap;
                self.pending = false;
                true
            }
            None => false,
        }
    }

    pub fn canvas(&mut self) -> PixmapMut<'_> {
        self.pixmap.as_mut()
    }

    pub fn frame(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn mark_drawn(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Hands the retained frame to `target` if there is a new one.
    /// Safe to call repeatedly and with no target at all.
    pub fn publish(&mut self, target: Option<&mut dyn PublishTarget>) -> bool {
        if !self.pending {
            return false;
        }
        let Some(target) = target else {
            log::debug!("No surface yet, deferring frame publish");
            return false;
        };
        if target.present(&self.pixmap) {
            self.pending = false;
            true
        } else {
            false
        }
    }
}
