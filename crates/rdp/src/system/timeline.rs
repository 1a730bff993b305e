//! Synchronization with the GPU timeline.
use crate::modules::backend::BackendModule;
use crate::system::dirty::DirtyBitmap;
use crate::system::fb::Range;

/// A point in the GPU timeline. Zero means "nothing to wait for".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fence(pub u64);

impl Fence {
    pub const NONE: Self = Self(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Timeline bookkeeping of the command processor.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// Fence covering the latest signaled work, if not waited on yet.
    outstanding: Fence,
    /// Displayed frames so far.
    frame: u64,
    /// Frame in which the last signal was issued.
    signaled_frame: Option<u64>,
    /// Whether commands were enqueued after the last signal.
    unsignaled_work: bool,
}

impl Timeline {
    pub fn outstanding(&self) -> Fence {
        self.outstanding
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Records that a command was sent to the backend.
    #[inline(always)]
    pub fn note_work(&mut self) {
        self.unsignaled_work = true;
    }

    /// Advances to the next displayed frame.
    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    fn signal(&mut self, backend: &mut dyn BackendModule) {
        self.outstanding = backend.signal_timeline();
        self.signaled_frame = Some(self.frame);
        self.unsignaled_work = false;
        tracing::trace!(fence = self.outstanding.0, frame = self.frame, "signaled timeline");
    }

    /// Handles a frame boundary (full sync). Only the first boundary of each displayed frame
    /// issues a signal, later ones keep the outstanding fence as it is.
    pub fn signal_frame_boundary(&mut self, backend: &mut dyn BackendModule) {
        if self.signaled_frame == Some(self.frame) {
            return;
        }

        self.signal(backend);
    }

    /// Waits until every command sent so far has completed and starts a new dirty epoch.
    pub fn wait_idle(&mut self, backend: &mut dyn BackendModule, dirty: &mut DirtyBitmap) {
        if self.unsignaled_work {
            self.signal(backend);
        }

        let fence = std::mem::take(&mut self.outstanding);
        if !fence.is_none() {
            tracing::trace!(fence = fence.0, "waiting for timeline");
            backend.wait_for_timeline(fence);
        }

        dirty.clear();
    }

    /// Waits for the GPU if any block in `range` is dirty. Returns whether a wait happened.
    pub fn check_and_wait(
        &mut self,
        backend: &mut dyn BackendModule,
        dirty: &mut DirtyBitmap,
        range: Range,
    ) -> bool {
        if !dirty.is_dirty(range) {
            return false;
        }

        self.wait_idle(backend, dirty);
        true
    }
}
