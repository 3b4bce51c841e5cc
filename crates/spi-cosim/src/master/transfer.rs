use serde::Serialize;
use std::fmt;

use crate::{BusError, HexWord, Owner, Signal, SignalBus, WORD_BITS};

/// Index of the next bit to put on the wire, counting down from the MSB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitCursor(u8);

impl BitCursor {
    pub const MSB: BitCursor = BitCursor((WORD_BITS - 1) as u8);

    pub fn new(index: u8) -> Option<Self> {
        (u32::from(index) < WORD_BITS).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn bit_of(self, word: u32) -> bool {
        (word >> self.0) & 1 == 1
    }

    /// Moves towards the LSB; `None` once bit 0 has been sent.
    pub fn advance(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferState {
    Idle,
    Assert,
    Transfer,
    Done,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferState::Idle => "SPI_IDLE",
            TransferState::Assert => "SPI_ASSERT",
            TransferState::Transfer => "SPI_TRANSFER",
            TransferState::Done => "SPI_DONE",
        })
    }
}

/// Bit-level SPI transmitter.
///
/// Shifts one word out on mosi MSB-first while generating sclk itself, one
/// sclk toggle per system clock cycle. mosi changes on the falling half and
/// the cursor advances on the rising half, so the peer samples on rising
/// edges. The engine does not know why it was started.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    state: TransferState,
    pending: Option<u32>,
    word: u32,
    cursor: BitCursor,
    hold_cs: bool,
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferEngine {
    pub fn new() -> Self {
        Self {
            state: TransferState::Idle,
            pending: None,
            word: 0,
            cursor: BitCursor::MSB,
            hold_cs: false,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn cursor(&self) -> BitCursor {
        self.cursor
    }

    /// A start request that has not been picked up yet counts as busy.
    pub fn is_busy(&self) -> bool {
        self.state != TransferState::Idle || self.pending.is_some()
    }

    /// Keeps chip-select asserted when a transfer completes.
    pub fn set_hold(&mut self, hold: bool) {
        self.hold_cs = hold;
    }

    /// Requests a transfer of `word`; the engine picks it up on its next step.
    ///
    /// Returns `false` and ignores the request while busy.
    pub fn start(&mut self, word: u32) -> bool {
        if self.is_busy() {
            return false;
        }
        self.pending = Some(word);
        true
    }

    /// Advances one system clock cycle. Returns `true` in the cycle the
    /// transfer completes.
    pub fn step(&mut self, bus: &mut SignalBus) -> Result<bool, BusError> {
        match self.state {
            TransferState::Idle => {
                if let Some(word) = self.pending.take() {
                    self.word = word;
                    self.cursor = BitCursor::MSB;
                    bus.drive(Owner::Master, Signal::Sclk, false)?;
                    log::trace!("[SPI] start {}", HexWord(word));
                    self.state = TransferState::Assert;
                }
            }
            TransferState::Assert => {
                bus.drive(Owner::Master, Signal::CsN, false)?;
                // Set up the MSB ahead of the first rising edge.
                bus.drive(Owner::Master, Signal::Mosi, self.cursor.bit_of(self.word))?;
                self.state = TransferState::Transfer;
            }
            TransferState::Transfer => {
                let sclk = !bus.get(Signal::Sclk);
                bus.drive(Owner::Master, Signal::Sclk, sclk)?;
                if !sclk {
                    bus.drive(Owner::Master, Signal::Mosi, self.cursor.bit_of(self.word))?;
                } else {
                    log::trace!(
                        "[SPI] bit {} = {}",
                        self.cursor.index(),
                        u8::from(self.cursor.bit_of(self.word))
                    );
                    match self.cursor.advance() {
                        Some(next) => self.cursor = next,
                        None => self.state = TransferState::Done,
                    }
                }
            }
            TransferState::Done => {
                bus.drive(Owner::Master, Signal::Sclk, false)?;
                bus.drive(Owner::Master, Signal::Mosi, false)?;
                if !self.hold_cs {
                    bus.drive(Owner::Master, Signal::CsN, true)?;
                }
                self.state = TransferState::Idle;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
