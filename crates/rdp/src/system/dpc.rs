//! DP command interface (DPC).
use bitos::{BitUtils, bitos};
use strum::FromRepr;

use crate::system::{System, cmd};

/// Mask applied to the start, end and current registers.
pub const ADDRESS_MASK: u32 = 0x00FF_FFF8;

/// A DP command register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum Reg {
    Start    = 0,
    End      = 1,
    Current  = 2,
    Status   = 3,
    Clock    = 4,
    BufBusy  = 5,
    PipeBusy = 6,
    Tmem     = 7,
}

/// DPC status register, as read.
#[bitos(32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Commands are fetched from DMEM instead of RDRAM.
    #[bits(0)]
    pub xbus_dmem_dma: bool,
    #[bits(1)]
    pub freeze: bool,
    #[bits(2)]
    pub flush: bool,
    #[bits(3)]
    pub start_gclk: bool,
    #[bits(4)]
    pub tmem_busy: bool,
    #[bits(5)]
    pub pipe_busy: bool,
    #[bits(6)]
    pub cmd_busy: bool,
    #[bits(7)]
    pub cbuf_ready: bool,
    #[bits(8)]
    pub dma_busy: bool,
    #[bits(9)]
    pub end_valid: bool,
    #[bits(10)]
    pub start_valid: bool,
}

impl Default for Status {
    fn default() -> Self {
        Self::from_bits(0)
            .with_start_gclk(true)
            .with_pipe_busy(true)
            .with_cbuf_ready(true)
    }
}

/// DPC interface registers.
#[derive(Debug, Clone, Default)]
pub struct Interface {
    pub start: u32,
    pub end: u32,
    pub current: u32,
    pub status: Status,
    pub clock: u32,
    pub buf_busy: u32,
    pub pipe_busy: u32,
    pub tmem: u32,
}

impl Interface {
    /// Reads a register.
    pub fn read(&self, reg: Reg) -> u32 {
        match reg {
            Reg::Start => self.start,
            Reg::End => self.end,
            Reg::Current => self.current,
            Reg::Status => self.status.to_bits(),
            Reg::Clock => self.clock,
            Reg::BufBusy => self.buf_busy,
            Reg::PipeBusy => self.pipe_busy,
            Reg::Tmem => self.tmem,
        }
    }

    /// Write a value to the status register. Writes are pairs of set/clear requests rather than
    /// raw values.
    pub fn write_status(&mut self, value: u32) {
        if value.bit(0) {
            self.status.set_xbus_dmem_dma(false);
        }

        if value.bit(1) {
            self.status.set_xbus_dmem_dma(true);
        }

        if value.bit(2) {
            self.status.set_freeze(false);
        }

        if value.bit(3) {
            tracing::warn!("DP freeze requested, ignoring");
            self.status.set_freeze(true);
        }

        if value.bit(4) {
            self.status.set_flush(false);
        }

        if value.bit(5) {
            self.status.set_flush(true);
        }

        if value.bit(6) {
            self.status.set_tmem_busy(false);
            self.tmem = 0;
        }

        if value.bit(7) {
            self.status.set_pipe_busy(false);
            self.pipe_busy = 0;
        }

        if value.bit(8) {
            self.status.set_cmd_busy(false);
            self.buf_busy = 0;
        }

        if value.bit(9) {
            self.clock = 0;
        }
    }
}

/// Writes a DPC register. Writing the end register kicks off a processing cycle, in which case
/// the returned value is the delay until the DP interrupt should be raised (zero means none).
pub fn write(sys: &mut System, reg: Reg, value: u32) -> u64 {
    let dpc = &mut sys.dpc;
    match reg {
        Reg::Start => {
            if !dpc.status.start_valid() {
                dpc.start = value & ADDRESS_MASK;
            }

            dpc.status.set_start_valid(true);
            0
        }
        Reg::End => {
            dpc.end = value & ADDRESS_MASK;
            if dpc.status.start_valid() {
                dpc.current = dpc.start;
                dpc.status.set_start_valid(false);
            }

            cmd::process(sys)
        }
        Reg::Status => {
            dpc.write_status(value);
            0
        }
        Reg::Current | Reg::Clock | Reg::BufBusy | Reg::PipeBusy | Reg::Tmem => {
            tracing::trace!("ignoring write to read-only DPC register {reg:?}");
            0
        }
    }
}
