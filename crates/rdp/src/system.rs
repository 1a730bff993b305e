//! State of the command processor.

pub mod cmd;
pub mod dirty;
pub mod dpc;
pub mod fb;
pub mod mem;
pub mod scanout;
pub mod snapshot;
pub mod timeline;
pub mod vi;

use easyerr::Error;
use serde::{Deserialize, Serialize};

use crate::modules::backend::BackendModule;
use crate::modules::display::DisplayModule;
use crate::system::dirty::DirtyBitmap;
use crate::system::mem::{Memory, RAM_MAX_LEN};
use crate::system::scanout::Scaling;
use crate::system::timeline::Timeline;

/// Default RAM size, with the expansion pak.
pub const DEFAULT_RAM_LEN: usize = 0x0080_0000;

/// Processor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size of the shared RAM, in bytes.
    pub ram_size: usize,
    /// How frames are scaled to the output.
    pub scaling: Scaling,
    /// Whether content is displayed as 16:9.
    pub widescreen: bool,
    /// Whether to remove the letterbox of widescreen content.
    pub crop_overscan: bool,
    /// Whether the backend should keep the last valid frame around on invalid scanout settings.
    pub persist_frame: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ram_size: DEFAULT_RAM_LEN,
            scaling: Scaling::default(),
            widescreen: false,
            crop_overscan: false,
            persist_frame: true,
        }
    }
}

/// External modules.
pub struct Modules {
    pub backend: Box<dyn BackendModule>,
    pub display: Box<dyn DisplayModule>,
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("the GPU backend is not supported by this device")]
    UnsupportedBackend,
    #[error("invalid RAM size {size:#X}: must be a non-zero multiple of 8 up to 16 MiB")]
    InvalidRamSize { size: usize },
}

/// System state.
pub struct System {
    /// Processor configuration.
    pub config: Config,
    /// External modules.
    pub modules: Modules,
    /// Memory regions commands are fetched from.
    pub mem: Memory,
    /// DP command registers.
    pub dpc: dpc::Interface,
    /// Video interface registers.
    pub video: vi::Interface,
    /// Command processing state.
    pub cmd: cmd::Interface,
    /// Regions of RAM with pending GPU writes.
    pub dirty: DirtyBitmap,
    /// GPU timeline bookkeeping.
    pub timeline: Timeline,
}

impl System {
    pub fn new(modules: Modules, config: Config) -> Result<Self, InitError> {
        let size = config.ram_size;
        if size == 0 || size % 8 != 0 || size > RAM_MAX_LEN {
            return Err(InitError::InvalidRamSize { size });
        }

        if !modules.backend.device_is_supported() {
            return Err(InitError::UnsupportedBackend);
        }

        Ok(Self {
            mem: Memory::new(size),
            dpc: dpc::Interface::default(),
            video: vi::Interface::default(),
            cmd: cmd::Interface::default(),
            dirty: DirtyBitmap::new(size),
            timeline: Timeline::default(),

            config,
            modules,
        })
    }

    /// Returns the processor to its initial state, keeping memory and display registers.
    pub fn reset(&mut self) {
        self.timeline
            .wait_idle(self.modules.backend.as_mut(), &mut self.dirty);

        self.timeline = Timeline::default();
        self.cmd = cmd::Interface::default();
        self.dpc = dpc::Interface::default();
    }
}
