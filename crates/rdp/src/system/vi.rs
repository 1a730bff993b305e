//! Video interface (VI) registers relevant to scanout.
use strum::{EnumCount, FromRepr};

/// A video interface register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, EnumCount)]
#[repr(u8)]
pub enum Reg {
    Status  = 0,
    Origin  = 1,
    Width   = 2,
    VIntr   = 3,
    Current = 4,
    Burst   = 5,
    VSync   = 6,
    HSync   = 7,
    Leap    = 8,
    HStart  = 9,
    VStart  = 10,
    VBurst  = 11,
    XScale  = 12,
    YScale  = 13,
}

/// Last known values of the VI registers.
#[derive(Debug, Clone, Default)]
pub struct Interface {
    regs: [u32; Reg::COUNT],
}

impl Interface {
    pub fn get(&self, reg: Reg) -> u32 {
        self.regs[reg as usize]
    }

    pub fn set(&mut self, reg: Reg, value: u32) {
        self.regs[reg as usize] = value;
    }
}
