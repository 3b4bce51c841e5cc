use crate::{HexWord, Signal, SignalBus, WORD_BITS};

/// Shift register assembling the peer's response from miso.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSampler {
    shift: u32,
    count: u32,
}

impl ResponseSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.shift = 0;
        self.count = 0;
    }

    /// Shifts the current miso level in as the new LSB.
    ///
    /// Does nothing while chip-select is deasserted. Returns `true` once a
    /// full word has been collected.
    pub fn sample(&mut self, bus: &SignalBus) -> bool {
        if bus.get(Signal::CsN) || self.is_complete() {
            return self.is_complete();
        }
        let bit = bus.get(Signal::Miso);
        self.shift = (self.shift << 1) | u32::from(bit);
        log::debug!(
            "[RECEIVE] Bit {}: {}, Shift Reg: {}",
            self.count,
            u8::from(bit),
            HexWord(self.shift)
        );
        self.count += 1;
        self.is_complete()
    }

    pub fn value(&self) -> u32 {
        self.shift
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_complete(&self) -> bool {
        self.count == WORD_BITS
    }
}
