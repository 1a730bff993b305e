//! Command list processing for the N64 RDP.
//!
//! Commands are fetched from emulated memory, forwarded to a GPU backend which executes them
//! asynchronously, and tracked just enough to know which regions of RAM the GPU might still be
//! writing to.

pub mod modules;
pub mod system;


use crate::system::fb::{ADDRESS_MASK, Range};
use crate::system::{Config, InitError, Modules, System, cmd, dpc, scanout, snapshot, vi};

/// The command processor.
pub struct Rdp {
    /// System state.
    pub sys: System,
}

impl Rdp {
    /// Creates a processor. Fails without retaining any state if the backend can't be used.
    pub fn new(modules: Modules, config: Config) -> Result<Self, InitError> {
        let sys = System::new(modules, config)?;
        tracing::info!(ram_size = sys.config.ram_size, "created RDP command processor");

        Ok(Self { sys })
    }

    /// Runs a processing cycle over the commands in `current..end`.
    ///
    /// Returns the delay until the DP interrupt should be raised, zero if none.
    pub fn process_commands(&mut self) -> u64 {
        cmd::process(&mut self.sys)
    }

    /// Reads a DPC register.
    pub fn read_dpc(&self, reg: dpc::Reg) -> u32 {
        self.sys.dpc.read(reg)
    }

    /// Writes a DPC register. See [`dpc::write`].
    pub fn write_dpc(&mut self, reg: dpc::Reg, value: u32) -> u64 {
        dpc::write(&mut self.sys, reg, value)
    }

    /// Must be called before the CPU reads `length` bytes at `address`. Blocks until the GPU is
    /// done with the region if it has pending writes to it.
    pub fn check_framebuffer_dirty(&mut self, address: u32, length: u32) -> bool {
        let range = Range {
            start: (address & ADDRESS_MASK) as u64,
            len: length as u64,
        };

        self.sys
            .timeline
            .check_and_wait(self.sys.modules.backend.as_mut(), &mut self.sys.dirty, range)
    }

    /// Waits for every command sent so far to complete.
    pub fn full_sync(&mut self) {
        self.sys
            .timeline
            .wait_idle(self.sys.modules.backend.as_mut(), &mut self.sys.dirty);
    }

    /// Updates a display register. Returns whether `index` named a known register.
    pub fn set_display_register(&mut self, index: u32, value: u32) -> bool {
        let Some(reg) = u8::try_from(index).ok().and_then(vi::Reg::from_repr) else {
            tracing::warn!("write to unknown display register {index}: 0x{value:08X}");
            return false;
        };

        self.sys.video.set(reg, value);
        self.sys.modules.backend.set_display_register(reg, value);
        true
    }

    /// Presents the latest completed frame.
    pub fn present_frame(&mut self) {
        scanout::present(&mut self.sys);
    }

    /// Size of a snapshot, in bytes.
    pub const fn snapshot_size() -> usize {
        snapshot::SIZE
    }

    /// Saves a snapshot into `out`. See [`snapshot::save`].
    pub fn save(&mut self, out: &mut [u8]) -> Result<(), snapshot::SnapshotError> {
        snapshot::save(&mut self.sys, out)
    }

    /// Loads a snapshot from `data`. See [`snapshot::load`].
    pub fn load(&mut self, data: &[u8]) -> Result<(), snapshot::SnapshotError> {
        snapshot::load(&mut self.sys, data)
    }

    /// Returns the processor to its initial state.
    pub fn reset(&mut self) {
        self.sys.reset();
        tracing::info!("reset RDP command processor");
    }

    /// Tears the processor down once the GPU is idle, giving the modules back.
    pub fn destroy(mut self) -> Modules {
        self.full_sync();
        tracing::info!("destroyed RDP command processor");
        self.sys.modules
    }
}
