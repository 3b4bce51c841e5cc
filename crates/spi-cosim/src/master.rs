//! Software model of the SPI master: a bit-level transfer engine driven by a
//! multi-phase transaction sequencer.

use serde::{Deserialize, Serialize};

use crate::{BusError, Edge, EdgeDetector, Owner, Signal, SignalBus};

mod sampler;
mod sequencer;
mod transfer;

pub use sampler::ResponseSampler;
pub use sequencer::{TransactionSequencer, TransactionState, Transition};
pub use transfer::{BitCursor, TransferEngine, TransferState};

use sequencer::Tick;

/// Width of every word exchanged on the bus.
pub const WORD_BITS: u32 = 32;

/// Where the master takes its receive sampling edge from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleEdge {
    /// Rising edges of the sclk the master generates itself.
    #[default]
    SharedClock,
    /// The peer's internal `sclk_rising` probe. Couples the master to the
    /// peer's implementation; kept for comparison with older benches.
    PeerIndicator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterStatus {
    Running,
    Done { response: u32 },
}

#[derive(Debug, Clone)]
pub struct SpiMaster {
    engine: TransferEngine,
    sequencer: TransactionSequencer,
    sclk: EdgeDetector,
    sample_edge: SampleEdge,
    cycle: u64,
}

impl SpiMaster {
    pub fn new(command: u32, sample_edge: SampleEdge) -> Self {
        Self {
            engine: TransferEngine::new(),
            sequencer: TransactionSequencer::new(command),
            sclk: EdgeDetector::default(),
            sample_edge,
            cycle: 0,
        }
    }

    /// Parks the master-owned signals at their idle levels.
    pub fn reset(&mut self, bus: &mut SignalBus) -> Result<(), BusError> {
        bus.drive(Owner::Master, Signal::CsN, true)?;
        bus.drive(Owner::Master, Signal::Sclk, false)?;
        bus.drive(Owner::Master, Signal::Mosi, false)?;
        self.sclk = EdgeDetector::new(false);
        Ok(())
    }

    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    pub fn sequencer(&self) -> &TransactionSequencer {
        &self.sequencer
    }

    pub fn state(&self) -> TransactionState {
        self.sequencer.state()
    }

    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Evaluates one system clock cycle. The engine is stepped before the
    /// sequencer so the sequencer sees its just-updated status.
    pub fn step(&mut self, bus: &mut SignalBus) -> Result<MasterStatus, BusError> {
        if self.sequencer.is_finished() {
            return Ok(self.status());
        }
        self.cycle += 1;
        let sclk_rising = self.sclk.update(bus.get(Signal::Sclk)) == Some(Edge::Rising);
        let sample_edge = match self.sample_edge {
            SampleEdge::SharedClock => sclk_rising,
            SampleEdge::PeerIndicator => bus.get(Signal::PeerSclkRising),
        };
        let transfer_done = self.engine.step(bus)?;
        let tick = Tick {
            cycle: self.cycle,
            transfer_done,
            sample_edge,
        };
        self.sequencer.step(tick, &mut self.engine, bus)?;
        Ok(self.status())
    }

    fn status(&self) -> MasterStatus {
        if self.sequencer.is_finished() {
            MasterStatus::Done {
                response: self.sequencer.sampler().value(),
            }
        } else {
            MasterStatus::Running
        }
    }
}
