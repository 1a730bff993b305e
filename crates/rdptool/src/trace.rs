//! A backend that executes nothing and only records what it was asked to do.
use std::sync::{Arc, Mutex, MutexGuard};

use rdp::modules::backend::{BackendModule, ScanoutImage, ScanoutOptions};
use rdp::system::cmd::opcode;
use rdp::system::timeline::Fence;
use rdp::system::vi;

#[derive(Debug, Clone)]
pub struct Trace {
    /// Forwarded commands, per opcode.
    pub commands: [u64; 64],
    /// Forwarded command slots.
    pub slots: u64,
    /// Last fence handed out.
    pub signaled: Fence,
    /// Fences waited on, in order.
    pub waits: Vec<Fence>,
    /// Display register writes.
    pub registers: u64,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            commands: [0; 64],
            slots: 0,
            signaled: Fence::NONE,
            waits: Vec::new(),
            registers: 0,
        }
    }
}

impl Trace {
    pub fn total_commands(&self) -> u64 {
        self.commands.iter().sum()
    }
}

/// Since work is "done" as soon as it's enqueued, waits always return immediately.
///
/// This type is reference counted and therefore cheaply clonable.
#[derive(Debug, Clone, Default)]
pub struct TraceBackend {
    trace: Arc<Mutex<Trace>>,
}

impl TraceBackend {
    pub fn trace(&self) -> MutexGuard<'_, Trace> {
        self.trace.lock().unwrap()
    }
}

impl BackendModule for TraceBackend {
    fn enqueue_command(&mut self, words: &[u32]) {
        let op = opcode::of(words[0]);
        tracing::trace!(op, len = words.len(), "enqueued command");

        let mut trace = self.trace();
        trace.commands[op as usize] += 1;
        trace.slots += words.len() as u64 / 2;
    }

    fn signal_timeline(&mut self) -> Fence {
        let mut trace = self.trace();
        trace.signaled = Fence(trace.signaled.0 + 1);
        trace.signaled
    }

    fn wait_for_timeline(&mut self, fence: Fence) {
        let mut trace = self.trace();
        if fence > trace.signaled {
            tracing::warn!(fence = fence.0, "waiting on a fence that was never signaled");
        }

        trace.waits.push(fence);
    }

    fn set_display_register(&mut self, reg: vi::Reg, value: u32) {
        tracing::debug!("display register {reg:?} = 0x{value:08X}");
        self.trace().registers += 1;
    }

    fn scanout(&mut self, _: &ScanoutOptions) -> Option<ScanoutImage> {
        None
    }
}
