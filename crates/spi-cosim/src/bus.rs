use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BusError;

/// Named single-bit signals shared by the testbench, the SPI master model and
/// the peer device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Clk,
    RstN,
    CsN,
    Sclk,
    Mosi,
    Miso,
    ResponseReady,
    /// Peer-internal sclk edge indicator, exposed as a probe.
    PeerSclkRising,
}

impl Signal {
    pub const COUNT: usize = 8;

    pub const ALL: [Signal; Signal::COUNT] = [
        Signal::Clk,
        Signal::RstN,
        Signal::CsN,
        Signal::Sclk,
        Signal::Mosi,
        Signal::Miso,
        Signal::ResponseReady,
        Signal::PeerSclkRising,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Signal::Clk => "clk",
            Signal::RstN => "rst_n",
            Signal::CsN => "cs_n",
            Signal::Sclk => "sclk",
            Signal::Mosi => "mosi",
            Signal::Miso => "miso",
            Signal::ResponseReady => "response_ready",
            Signal::PeerSclkRising => "sclk_rising",
        }
    }

    /// The only side allowed to write this signal.
    pub fn owner(self) -> Owner {
        match self {
            Signal::Clk | Signal::RstN => Owner::Testbench,
            Signal::CsN | Signal::Sclk | Signal::Mosi => Owner::Master,
            Signal::Miso | Signal::ResponseReady | Signal::PeerSclkRising => Owner::Peer,
        }
    }

    /// Level before anything drives the signal. Chip-select idles deasserted.
    pub fn idle_level(self) -> bool {
        matches!(self, Signal::CsN)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Testbench,
    Master,
    Peer,
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Owner::Testbench => "testbench",
            Owner::Master => "master",
            Owner::Peer => "peer",
        })
    }
}

/// Current level of every bus signal.
///
/// Writes are checked against [`Signal::owner`] so that each signal keeps a
/// single writer even if the models are later evaluated from different threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalBus {
    levels: [bool; Signal::COUNT],
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        Self {
            levels: Signal::ALL.map(Signal::idle_level),
        }
    }

    pub fn get(&self, signal: Signal) -> bool {
        self.levels[signal.index()]
    }

    /// Drives `signal` to `level` on behalf of `driver`.
    pub fn drive(&mut self, driver: Owner, signal: Signal, level: bool) -> Result<(), BusError> {
        let owner = signal.owner();
        if owner != driver {
            return Err(BusError::NotOwner {
                signal,
                owner,
                driver,
            });
        }
        if self.levels[signal.index()] != level {
            log::trace!("{driver} drives {signal} = {}", u8::from(level));
        }
        self.levels[signal.index()] = level;
        Ok(())
    }

    /// Snapshot of all signals in [`Signal::ALL`] order.
    pub fn levels(&self) -> impl Iterator<Item = (Signal, bool)> + '_ {
        Signal::ALL.into_iter().map(|signal| (signal, self.get(signal)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Derives edge events from successive samples of one signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    prev: bool,
}

impl EdgeDetector {
    pub fn new(initial: bool) -> Self {
        Self { prev: initial }
    }

    /// Records `level` and reports the edge relative to the previous sample.
    pub fn update(&mut self, level: bool) -> Option<Edge> {
        let edge = match (self.prev, level) {
            (false, true) => Some(Edge::Rising),
            (true, false) => Some(Edge::Falling),
            _ => None,
        };
        self.prev = level;
        edge
    }

    pub fn level(&self) -> bool {
        self.prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_levels() {
        let bus = SignalBus::new();
        assert!(bus.get(Signal::CsN));
        assert!(!bus.get(Signal::Sclk));
        assert!(!bus.get(Signal::ResponseReady));
    }

    #[test]
    fn owner_can_drive() {
        let mut bus = SignalBus::new();
        bus.drive(Owner::Master, Signal::CsN, false).unwrap();
        bus.drive(Owner::Peer, Signal::Miso, true).unwrap();
        assert!(!bus.get(Signal::CsN));
        assert!(bus.get(Signal::Miso));
    }

    #[test]
    fn foreign_write_is_rejected() {
        let mut bus = SignalBus::new();
        let err = bus.drive(Owner::Peer, Signal::Sclk, true).unwrap_err();
        assert_eq!(
            err,
            BusError::NotOwner {
                signal: Signal::Sclk,
                owner: Owner::Master,
                driver: Owner::Peer,
            }
        );
        assert!(!bus.get(Signal::Sclk), "rejected write must not land");
    }

    #[test]
    fn edge_detector_reports_transitions_once() {
        let mut edge = EdgeDetector::default();
        assert_eq!(edge.update(false), None);
        assert_eq!(edge.update(true), Some(Edge::Rising));
        assert_eq!(edge.update(true), None);
        assert_eq!(edge.update(false), Some(Edge::Falling));
        assert!(!edge.level());
    }
}
