use serde::Serialize;
use std::fmt;

use super::{ResponseSampler, TransferEngine};
use crate::{BusError, HexWord, Owner, Signal, SignalBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionState {
    Idle,
    SendPhase1,
    Wait1,
    WaitResponse,
    LoadDummy,
    Receive,
    Done,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionState::Idle => "IDLE",
            TransactionState::SendPhase1 => "SEND_PHASE1",
            TransactionState::Wait1 => "WAIT1",
            TransactionState::WaitResponse => "WAIT_RESP",
            TransactionState::LoadDummy => "LOAD_DUMMY",
            TransactionState::Receive => "RECEIVE",
            TransactionState::Done => "DONE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub cycle: u64,
    pub from: TransactionState,
    pub to: TransactionState,
}

/// What the sequencer observes in one cycle besides the bus itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tick {
    pub cycle: u64,
    /// The engine finished a transfer earlier in this same cycle.
    pub transfer_done: bool,
    /// A sampling edge fired this cycle.
    pub sample_edge: bool,
}

/// Drives one command/response exchange through the transfer engine.
#[derive(Debug, Clone)]
pub struct TransactionSequencer {
    state: TransactionState,
    command: u32,
    tx_word: u32,
    second_phase: bool,
    finished: bool,
    sampler: ResponseSampler,
    transitions: Vec<Transition>,
}

impl TransactionSequencer {
    pub fn new(command: u32) -> Self {
        Self {
            state: TransactionState::Idle,
            command,
            tx_word: 0,
            second_phase: false,
            finished: false,
            sampler: ResponseSampler::new(),
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn command(&self) -> u32 {
        self.command
    }

    pub fn sampler(&self) -> &ResponseSampler {
        &self.sampler
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Set once `Done` has released the bus; the driving loop stops here.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn goto(&mut self, cycle: u64, to: TransactionState) {
        log::info!("[FSM] -> {to}");
        self.transitions.push(Transition {
            cycle,
            from: self.state,
            to,
        });
        self.state = to;
    }

    pub(crate) fn step(
        &mut self,
        tick: Tick,
        engine: &mut TransferEngine,
        bus: &mut SignalBus,
    ) -> Result<(), BusError> {
        match self.state {
            TransactionState::Idle => {
                self.tx_word = self.command;
                engine.set_hold(true);
                self.goto(tick.cycle, TransactionState::SendPhase1);
            }
            TransactionState::SendPhase1 => {
                if tick.transfer_done {
                    self.goto(tick.cycle, TransactionState::Wait1);
                } else if !engine.is_busy() {
                    engine.start(self.tx_word);
                }
            }
            TransactionState::Wait1 => {
                if !engine.is_busy() {
                    self.goto(tick.cycle, TransactionState::WaitResponse);
                }
            }
            TransactionState::WaitResponse => {
                if bus.get(Signal::ResponseReady) {
                    self.goto(tick.cycle, TransactionState::LoadDummy);
                }
            }
            TransactionState::LoadDummy => {
                // No dedicated second send: the dummy word is clocked out
                // from Receive while the response is sampled.
                self.tx_word = 0;
                self.second_phase = true;
                self.goto(tick.cycle, TransactionState::Receive);
            }
            TransactionState::Receive => {
                if self.second_phase {
                    self.sampler.reset();
                    self.second_phase = false;
                } else if tick.sample_edge && self.sampler.sample(bus) {
                    self.goto(tick.cycle, TransactionState::Done);
                    return Ok(());
                }
                if !engine.is_busy() {
                    engine.start(self.tx_word);
                }
            }
            TransactionState::Done => {
                bus.drive(Owner::Master, Signal::CsN, true)?;
                engine.set_hold(false);
                if !self.finished {
                    log::info!(
                        "[FSM] exchange complete: sent {}, received {}",
                        HexWord(self.command),
                        HexWord(self.sampler.value())
                    );
                }
                self.finished = true;
            }
        }
        Ok(())
    }
}
