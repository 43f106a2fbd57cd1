//! GPU texture handles and their deferred release
//!
//! Texture names may only be deleted on the thread that owns the rendering
//! context. Pixel buffers therefore never delete their texture themselves:
//! they post the handle to a [`TextureReclaimer`], and the renderer drains the
//! paired [`ReclaimQueue`] once per frame.

use depthview_core::Result;
use log::{debug, warn};

/// Name of a texture living on the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Uploads pixel data on behalf of a buffer; implemented by the renderer
pub trait TextureUploader {
    /// Upload `rgba` as a `width` x `height` texture.
    ///
    /// `existing` is the texture previously uploaded for the same buffer, which
    /// the uploader may reuse.
    fn upload(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
        existing: Option<TextureId>,
    ) -> Result<TextureId>;
}

/// Sending half of the release queue, held by pixel buffers
#[derive(Debug, Clone)]
pub struct TextureReclaimer {
    sender: flume::Sender<TextureId>,
}

/// Receiving half of the release queue, owned by the renderer
#[derive(Debug)]
pub struct ReclaimQueue {
    receiver: flume::Receiver<TextureId>,
}

/// Create a connected reclaimer/queue pair
pub fn reclaim_channel() -> (TextureReclaimer, ReclaimQueue) {
    let (sender, receiver) = flume::unbounded();
    (TextureReclaimer { sender }, ReclaimQueue { receiver })
}

impl TextureReclaimer {
    /// Schedule a texture for deletion on the render thread
    pub fn release(&self, texture: TextureId) {
        if self.sender.send(texture).is_err() {
            warn!("reclaim queue is gone, leaking texture {}", texture.0);
        } else {
            debug!("texture {} queued for release", texture.0);
        }
    }
}

impl ReclaimQueue {
    /// Take every texture released since the last drain.
    ///
    /// Call once per rendered frame from the thread owning the GPU context.
    pub fn drain(&self) -> Vec<TextureId> {
        self.receiver.try_iter().collect()
    }

    /// Number of textures waiting for release
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}
