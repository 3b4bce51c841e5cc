use crate::{
    Edge, EdgeDetector, Owner, Peer, Signal, SignalBus, SimulationError,
    scheduler::{ClockDef, Scheduler},
    waveform::VcdWriter,
};

mod builder;

pub use builder::SimulationBuilder;

/// A timed simulation of the bus and the peer device.
///
/// Owns simulation time, the periodic clocks and the event queue. The peer is
/// evaluated on every rising edge of [`Signal::Clk`]; the master model is
/// stepped by the caller after [`Simulation::wait_rising_edge`] returns.
pub struct Simulation {
    pub(crate) bus: SignalBus,
    pub(crate) scheduler: Scheduler,
    pub(crate) peer: Box<dyn Peer>,
    pub(crate) vcd_writer: Option<VcdWriter>,
    clk: EdgeDetector,
    rose: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.scheduler.time)
            .field("bus", &self.bus)
            .finish()
    }
}

impl Simulation {
    pub fn builder(peer: impl Peer + 'static) -> SimulationBuilder {
        SimulationBuilder::new(Box::new(peer))
    }

    pub(crate) fn new(peer: Box<dyn Peer>, vcd_writer: Option<VcdWriter>) -> Self {
        let bus = SignalBus::new();
        Self {
            clk: EdgeDetector::new(bus.get(Signal::Clk)),
            bus,
            scheduler: Scheduler::new(),
            peer,
            vcd_writer,
            rose: false,
        }
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SignalBus {
        &mut self.bus
    }

    /// Writes the current bus levels to the VCD file, if one is attached.
    pub fn dump(&mut self) -> Result<(), SimulationError> {
        if let Some(ref mut writer) = self.vcd_writer {
            writer.dump(self.scheduler.time, &self.bus)?;
        }
        Ok(())
    }

    /// Register a clock signal and its period, enqueuing the first edge.
    /// `initial_delay` specifies when the first rising edge occurs.
    pub fn add_clock(
        &mut self,
        signal: Signal,
        period: u64,
        initial_delay: u64,
    ) -> Result<(), SimulationError> {
        if signal.owner() != Owner::Testbench {
            return Err(SimulationError::NotSchedulable(signal));
        }
        self.scheduler.clocks[signal as usize] = Some(ClockDef { period });
        self.scheduler.push(initial_delay, signal, true, true);
        Ok(())
    }

    /// Schedule a one-shot level change at a specific time.
    pub fn schedule(
        &mut self,
        signal: Signal,
        time: u64,
        level: bool,
    ) -> Result<(), SimulationError> {
        if signal.owner() != Owner::Testbench {
            return Err(SimulationError::NotSchedulable(signal));
        }
        self.scheduler.push(time, signal, level, false);
        Ok(())
    }

    /// Advance time to the next scheduled event and process all events at that time.
    /// Returns the new simulation time, or None if no events are scheduled.
    pub fn step(&mut self) -> Result<Option<u64>, SimulationError> {
        let (current_time, events) = match self.scheduler.pop_all_at_next_time() {
            Some(res) => res,
            None => return Ok(None),
        };
        self.scheduler.time = current_time;

        for ev in &events {
            self.bus.drive(Owner::Testbench, ev.signal, ev.level)?;
        }

        self.rose = self.clk.update(self.bus.get(Signal::Clk)) == Some(Edge::Rising);
        if self.rose {
            self.peer.tick(&mut self.bus)?;
        }

        // Reschedule clocks
        for ev in events.iter().filter(|ev| ev.periodic) {
            if let Some(def) = self.scheduler.clock(ev.signal) {
                let half_period = def.period / 2;
                self.scheduler
                    .push(current_time + half_period, ev.signal, !ev.level, true);
            }
        }

        self.dump()?;
        Ok(Some(current_time))
    }

    /// Advance time and run until `end_time` (inclusive).
    pub fn run_until(&mut self, end_time: u64) -> Result<(), SimulationError> {
        while let Some(next_time) = self.scheduler.next_event_time() {
            if next_time > end_time {
                break;
            }
            self.step()?;
        }
        self.scheduler.time = end_time;
        self.dump()
    }

    /// Steps until the system clock rises; the peer has already been
    /// evaluated for that edge when this returns.
    pub fn wait_rising_edge(&mut self) -> Result<u64, SimulationError> {
        loop {
            match self.step()? {
                Some(time) if self.rose => return Ok(time),
                Some(_) => {}
                None => return Err(SimulationError::NoPendingEvents),
            }
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> u64 {
        self.scheduler.time
    }

    /// Returns the time of the next scheduled event, if any.
    pub fn next_event_time(&self) -> Option<u64> {
        self.scheduler.next_event_time()
    }
}
