//! GPU backend module interface.

use crate::system::timeline::Fence;
use crate::system::vi;

/// Identifies an image owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageId(pub u64);

/// A completed frame ready to be scanned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanoutImage {
    pub id: ImageId,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanoutOptions {
    /// Keep presenting the last valid frame when the VI registers describe an invalid one.
    pub persist_frame: bool,
}

/// The GPU command processor that actually executes RDP commands.
///
/// Commands are executed asynchronously. The only way to observe their completion is through the
/// timeline: [`BackendModule::signal_timeline`] returns a fence which
/// [`BackendModule::wait_for_timeline`] blocks on.
pub trait BackendModule: Send {
    /// Whether the underlying device can run the backend at all.
    fn device_is_supported(&self) -> bool {
        true
    }

    /// Enqueues a single raw command. `words` always contains an even number of words.
    fn enqueue_command(&mut self, words: &[u32]);

    /// Flushes enqueued work and returns a fence that resolves once it has completed.
    fn signal_timeline(&mut self) -> Fence;

    /// Blocks until `fence` has resolved.
    fn wait_for_timeline(&mut self, fence: Fence);

    /// Updates a display register used during scanout.
    fn set_display_register(&mut self, reg: vi::Reg, value: u32);

    /// Returns the most recently completed frame, if any.
    fn scanout(&mut self, options: &ScanoutOptions) -> Option<ScanoutImage>;
}

/// An implementation of [`BackendModule`] that does nothing.
#[derive(Debug, Clone, Copy)]
pub struct NopBackendModule;

impl BackendModule for NopBackendModule {
    fn enqueue_command(&mut self, _: &[u32]) {}

    fn signal_timeline(&mut self) -> Fence {
        Fence::NONE
    }

    fn wait_for_timeline(&mut self, _: Fence) {}

    fn set_display_register(&mut self, _: vi::Reg, _: u32) {}

    fn scanout(&mut self, _: &ScanoutOptions) -> Option<ScanoutImage> {
        None
    }
}
