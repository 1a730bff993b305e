//! Feeding a command list dump through the processor.
use easyerr::Error;
use rdp::Rdp;
use rdp::system::dpc;
use rdp::system::mem::DMEM_LEN;

/// Where the list is placed before submitting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Ram { address: u32 },
    Dmem,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("list address {address:#X} is not 8 byte aligned")]
    Misaligned { address: u32 },
    #[error("list of {len} bytes doesn't fit in the {available} bytes available")]
    TooLarge { len: usize, available: usize },
}

/// Outcome of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// END register writes performed.
    pub submissions: u64,
    /// Submissions that asked for a DP interrupt.
    pub interrupts: u64,
    /// Delay of the last interrupt.
    pub last_delay: u64,
}

/// Decodes a dump into words. Trailing bytes that don't form a whole slot are dropped.
pub fn words(dump: &[u8]) -> Vec<u32> {
    let whole = dump.len() & !0x7;
    if whole != dump.len() {
        tracing::warn!(
            dropped = dump.len() - whole,
            "dump is not made of whole command slots"
        );
    }

    dump[..whole]
        .chunks_exact(4)
        .map(|word| u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
        .collect()
}

/// Places `words` where `placement` says, the way the CPU would have written them.
pub fn place(rdp: &mut Rdp, placement: Placement, words: &[u32]) -> Result<(), ReplayError> {
    let len = words.len() * 4;
    match placement {
        Placement::Ram { address } => {
            if address % 8 != 0 {
                return Err(ReplayError::Misaligned { address });
            }

            let ram = rdp.sys.mem.ram_mut();
            let available = ram.len().saturating_sub(address as usize);
            if len > available {
                return Err(ReplayError::TooLarge { len, available });
            }

            // RAM holds words in host order
            let base = address as usize;
            for (i, word) in words.iter().enumerate() {
                ram[base + 4 * i..][..4].copy_from_slice(&word.to_ne_bytes());
            }
        }
        Placement::Dmem => {
            if len > DMEM_LEN {
                return Err(ReplayError::TooLarge {
                    len,
                    available: DMEM_LEN,
                });
            }

            let dmem = rdp.sys.mem.dmem_mut();
            for (i, word) in words.iter().enumerate() {
                dmem[4 * i..][..4].copy_from_slice(&word.to_be_bytes());
            }
        }
    }

    Ok(())
}

/// Submits `slots` slots placed at `placement`, `chunk` slots per END write (all at once if
/// zero).
pub fn submit(rdp: &mut Rdp, placement: Placement, slots: usize, chunk: usize) -> Summary {
    let start = match placement {
        Placement::Ram { address } => address,
        Placement::Dmem => {
            // set XBUS DMEM DMA
            rdp.write_dpc(dpc::Reg::Status, 1 << 1);
            0
        }
    };

    let chunk = if chunk == 0 { slots.max(1) } else { chunk };
    let mut summary = Summary::default();

    rdp.write_dpc(dpc::Reg::Start, start);
    let mut submitted = 0;
    while submitted < slots {
        submitted = (submitted + chunk).min(slots);

        let end = start + 8 * submitted as u32;
        let delay = rdp.write_dpc(dpc::Reg::End, end);
        summary.submissions += 1;

        if delay != 0 {
            tracing::debug!(end, delay, "DP interrupt requested");
            summary.interrupts += 1;
            summary.last_delay = delay;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use rdp::modules::display::NopDisplayModule;
    use rdp::system::{Config, Modules};

    use super::*;
    use crate::trace::TraceBackend;

    fn setup() -> (Rdp, TraceBackend) {
        let backend = TraceBackend::default();
        let modules = Modules {
            backend: Box::new(backend.clone()),
            display: Box::new(NopDisplayModule),
        };

        (Rdp::new(modules, Config::default()).unwrap(), backend)
    }

    /// Scissor to 320x240, fill a rectangle, one triangle and a full sync.
    fn list() -> Vec<u32> {
        vec![
            0x2D00_0000,
            (1280 << 12) | 960,
            0x3600_0000,
            0,
            0x0800_0000,
            0,
            0,
            0,
            0,
            0,
            0,
            0,
            0x2900_0000,
            0,
        ]
    }

    fn dump(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|word| word.to_be_bytes()).collect()
    }

    #[test]
    fn dump_words_are_big_endian() {
        let mut bytes = dump(&[0xE900_0000, 0x1234_5678]);
        bytes.push(0xFF);

        assert_eq!(words(&bytes), vec![0xE900_0000, 0x1234_5678]);
    }

    #[test]
    fn whole_list_from_ram() {
        let (mut rdp, backend) = setup();
        let words = list();
        let placement = Placement::Ram { address: 0x1000 };

        place(&mut rdp, placement, &words).unwrap();
        let summary = submit(&mut rdp, placement, words.len() / 2, 0);

        assert_eq!(summary, Summary {
            submissions: 1,
            interrupts: 1,
            last_delay: 76800,
        });
        assert_eq!(backend.trace().total_commands(), 4);
        assert_eq!(backend.trace().slots, 7);
    }

    #[test]
    fn slot_by_slot_from_dmem() {
        let (mut rdp, backend) = setup();
        let words = list();

        place(&mut rdp, Placement::Dmem, &words).unwrap();
        let summary = submit(&mut rdp, Placement::Dmem, words.len() / 2, 1);

        assert_eq!(summary.submissions, 7);
        assert_eq!(summary.interrupts, 1);
        assert_eq!(backend.trace().commands[0x08], 1);
        assert_eq!(backend.trace().total_commands(), 4);
    }

    #[test]
    fn placement_errors() {
        let (mut rdp, _) = setup();
        let words = list();

        assert!(matches!(
            place(&mut rdp, Placement::Ram { address: 0x1004 }, &words),
            Err(ReplayError::Misaligned { address: 0x1004 })
        ));
        assert!(matches!(
            place(&mut rdp, Placement::Ram { address: 0x7F_FFF8 }, &words),
            Err(ReplayError::TooLarge { len: 56, available: 8 })
        ));
        assert!(matches!(
            place(&mut rdp, Placement::Dmem, &[0; 0x401]),
            Err(ReplayError::TooLarge { .. })
        ));
    }
}
