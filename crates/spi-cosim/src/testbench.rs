use serde::Serialize;

use crate::{
    BenchConfig, CosimError, HexWord, MasterStatus, Peer, Signal, SignalBus, Simulation,
    SpiMaster, Transition, check_response, expected_response,
};

/// Result of one command/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub sent: HexWord,
    pub received: HexWord,
    pub expected: HexWord,
    /// Master cycles from the first step to `Done`.
    pub cycles: u64,
    pub bits_received: u32,
    /// Simulation time at which the exchange finished.
    pub finished_at_ns: u64,
    pub transitions: Vec<Transition>,
}

impl Exchange {
    /// Runs the completion check.
    pub fn verify(&self) -> Result<(), CosimError> {
        check_response(self.sent.0, self.received.0)
    }
}

/// Drives the SPI master against a peer: clock, reset sequence and the
/// bounded cycle loop.
#[derive(Debug, Clone, Default)]
pub struct Testbench {
    config: BenchConfig,
}

impl Testbench {
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Runs one exchange of `command`. The response is not checked; see
    /// [`Exchange::verify`].
    pub fn run(&self, command: u32, peer: impl Peer + 'static) -> Result<Exchange, CosimError> {
        self.run_observed(command, peer, |_, _, _| {})
    }

    /// Like [`Testbench::run`], calling `observer` after every master cycle.
    pub fn run_observed<F>(
        &self,
        command: u32,
        peer: impl Peer + 'static,
        mut observer: F,
    ) -> Result<Exchange, CosimError>
    where
        F: FnMut(u64, &SignalBus, &SpiMaster),
    {
        let config = &self.config;
        let mut sim = Simulation::builder(peer)
            .vcd_opt(config.vcd.clone())
            .build()?;

        sim.add_clock(Signal::Clk, config.clock_period_ns, 0)?;
        let reset_release = config.reset_delay_ns + config.reset_hold_ns;
        sim.schedule(Signal::RstN, config.reset_delay_ns, false)?;
        sim.schedule(Signal::RstN, reset_release, true)?;

        let mut master = SpiMaster::new(command, config.sample_edge);
        master.reset(sim.bus_mut())?;
        sim.run_until(reset_release)?;
        sim.wait_rising_edge()?;

        log::info!(
            "[TB] Starting SPI roundtrip with tx_data = {}",
            HexWord(command)
        );

        for _ in 0..config.max_cycles {
            sim.wait_rising_edge()?;
            let status = master.step(sim.bus_mut())?;
            sim.dump()?;
            observer(master.cycles(), sim.bus(), &master);

            if let MasterStatus::Done { response } = status {
                let sequencer = master.sequencer();
                return Ok(Exchange {
                    sent: HexWord(command),
                    received: HexWord(response),
                    expected: HexWord(expected_response(command)),
                    cycles: master.cycles(),
                    bits_received: sequencer.sampler().count(),
                    finished_at_ns: sim.time(),
                    transitions: sequencer.transitions().to_vec(),
                });
            }
        }

        log::error!(
            "[TB] no response after {} cycles, master stuck in {}",
            config.max_cycles,
            master.state()
        );
        Err(CosimError::Deadlock {
            cycles: config.max_cycles,
            state: master.state(),
        })
    }
}
