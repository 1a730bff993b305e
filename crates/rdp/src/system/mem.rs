//! Memory regions shared with the host.

/// Length of the RSP data memory (DMEM).
pub const DMEM_LEN: usize = 0x1000;
/// Largest RAM size addressable by the DP.
pub const RAM_MAX_LEN: usize = 0x0100_0000;

/// Memory regions the command processor reads from.
pub struct Memory {
    ram: Box<[u8]>,
    dmem: Box<[u8; DMEM_LEN]>,
}

impl Memory {
    pub fn new(ram_len: usize) -> Self {
        Self {
            ram: vec![0; ram_len].into_boxed_slice(),
            dmem: Box::new([0; DMEM_LEN]),
        }
    }

    /// The shared RAM (RDRAM). Words are stored in host byte order.
    #[inline(always)]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    #[inline(always)]
    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    /// The scratch region (DMEM). Words are stored big-endian.
    #[inline(always)]
    pub fn dmem(&self) -> &[u8; DMEM_LEN] {
        &self.dmem
    }

    #[inline(always)]
    pub fn dmem_mut(&mut self) -> &mut [u8; DMEM_LEN] {
        &mut self.dmem
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("ram_len", &self.ram.len())
            .finish_non_exhaustive()
    }
}
