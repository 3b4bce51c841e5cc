use std::fmt;

use crate::{BusError, Edge, EdgeDetector, HexWord, Owner, Signal, SignalBus, WORD_BITS};

/// The simulated device on the other end of the bus.
///
/// `tick` runs once per rising edge of the system clock, before the master
/// model is stepped, and sees the levels the master left on the bus in the
/// previous cycle.
pub trait Peer {
    fn tick(&mut self, bus: &mut SignalBus) -> Result<(), BusError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Receive,
    Respond,
}

/// Behavioral SPI slave that answers each 32-bit command with `transform(command)`.
///
/// Samples mosi on sclk rising edges while selected. Once 32 bits are in, it
/// raises `response_ready` and presents the response MSB-first on miso, moving
/// to the next bit on the falling edge after each rising edge the master
/// sampled. Deselecting or resetting returns it to [`Phase::Receive`].
pub struct TransformPeer {
    transform: Box<dyn Fn(u32) -> u32>,
    sclk: EdgeDetector,
    phase: Phase,
    rx_shift: u32,
    rx_count: u32,
    tx_shift: u32,
    tx_consumed: bool,
}

impl fmt::Debug for TransformPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformPeer")
            .field("phase", &self.phase)
            .field("rx_count", &self.rx_count)
            .field("tx_shift", &HexWord(self.tx_shift))
            .finish()
    }
}

impl TransformPeer {
    pub fn new(transform: impl Fn(u32) -> u32 + 'static) -> Self {
        Self {
            transform: Box::new(transform),
            sclk: EdgeDetector::default(),
            phase: Phase::Receive,
            rx_shift: 0,
            rx_count: 0,
            tx_shift: 0,
            tx_consumed: false,
        }
    }

    /// The device the harness is built to check.
    pub fn add_one() -> Self {
        Self::new(|word| word.wrapping_add(1))
    }

    fn idle(&mut self, bus: &mut SignalBus) -> Result<(), BusError> {
        self.phase = Phase::Receive;
        self.rx_shift = 0;
        self.rx_count = 0;
        self.tx_consumed = false;
        bus.drive(Owner::Peer, Signal::ResponseReady, false)?;
        bus.drive(Owner::Peer, Signal::Miso, false)
    }

    fn present_msb(&self, bus: &mut SignalBus) -> Result<(), BusError> {
        bus.drive(Owner::Peer, Signal::Miso, self.tx_shift >> (WORD_BITS - 1) == 1)
    }
}

impl Peer for TransformPeer {
    fn tick(&mut self, bus: &mut SignalBus) -> Result<(), BusError> {
        let edge = self.sclk.update(bus.get(Signal::Sclk));

        if !bus.get(Signal::RstN) {
            bus.drive(Owner::Peer, Signal::PeerSclkRising, false)?;
            return self.idle(bus);
        }

        let selected = !bus.get(Signal::CsN);
        bus.drive(
            Owner::Peer,
            Signal::PeerSclkRising,
            selected && edge == Some(Edge::Rising),
        )?;
        if !selected {
            if self.phase != Phase::Receive || self.rx_count != 0 {
                self.idle(bus)?;
            }
            return Ok(());
        }

        match (self.phase, edge) {
            (Phase::Receive, Some(Edge::Rising)) => {
                self.rx_shift = (self.rx_shift << 1) | u32::from(bus.get(Signal::Mosi));
                self.rx_count += 1;
                if self.rx_count == WORD_BITS {
                    self.tx_shift = (self.transform)(self.rx_shift);
                    log::debug!(
                        "[PEER] command {} -> response {}",
                        HexWord(self.rx_shift),
                        HexWord(self.tx_shift)
                    );
                    self.phase = Phase::Respond;
                    self.tx_consumed = false;
                    self.present_msb(bus)?;
                    bus.drive(Owner::Peer, Signal::ResponseReady, true)?;
                }
            }
            (Phase::Respond, Some(Edge::Rising)) => self.tx_consumed = true,
            (Phase::Respond, Some(Edge::Falling)) if self.tx_consumed => {
                self.tx_shift <<= 1;
                self.tx_consumed = false;
                self.present_msb(bus)?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// A peer that listens but never answers, so `response_ready` stays low.
#[derive(Debug, Default)]
pub struct SilentPeer;

impl Peer for SilentPeer {
    fn tick(&mut self, bus: &mut SignalBus) -> Result<(), BusError> {
        bus.drive(Owner::Peer, Signal::ResponseReady, false)?;
        bus.drive(Owner::Peer, Signal::Miso, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_in(peer: &mut TransformPeer, bus: &mut SignalBus, word: u32) {
        for bit in (0..WORD_BITS).rev() {
            bus.drive(Owner::Master, Signal::Mosi, (word >> bit) & 1 == 1)
                .unwrap();
            bus.drive(Owner::Master, Signal::Sclk, true).unwrap();
            peer.tick(bus).unwrap();
            bus.drive(Owner::Master, Signal::Sclk, false).unwrap();
            peer.tick(bus).unwrap();
        }
    }

    fn selected_bus() -> SignalBus {
        let mut bus = SignalBus::new();
        bus.drive(Owner::Testbench, Signal::RstN, true).unwrap();
        bus.drive(Owner::Master, Signal::CsN, false).unwrap();
        bus
    }

    #[test]
    fn raises_ready_after_a_full_word() {
        let mut bus = selected_bus();
        let mut peer = TransformPeer::add_one();
        clock_in(&mut peer, &mut bus, 0x8000_0000);
        assert!(bus.get(Signal::ResponseReady));
        // 0x80000001 has its MSB set.
        assert!(bus.get(Signal::Miso));
    }

    #[test]
    fn deselect_drops_ready() {
        let mut bus = selected_bus();
        let mut peer = TransformPeer::add_one();
        clock_in(&mut peer, &mut bus, 7);
        assert!(bus.get(Signal::ResponseReady));

        bus.drive(Owner::Master, Signal::CsN, true).unwrap();
        peer.tick(&mut bus).unwrap();
        assert!(!bus.get(Signal::ResponseReady));
    }

    #[test]
    fn held_in_reset_ignores_the_bus() {
        let mut bus = SignalBus::new();
        bus.drive(Owner::Master, Signal::CsN, false).unwrap();
        let mut peer = TransformPeer::add_one();
        clock_in(&mut peer, &mut bus, 0xFFFF_FFFF);
        assert!(!bus.get(Signal::ResponseReady));
    }
}
