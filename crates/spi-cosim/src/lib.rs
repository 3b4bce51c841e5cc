mod bus;
mod check;
mod config;
mod error;
pub mod host;
mod master;
pub mod matrix;
mod peer;
mod scheduler;
mod simulation;
mod testbench;
mod waveform;
mod word;

pub use bus::{Edge, EdgeDetector, Owner, Signal, SignalBus};
pub use check::{check_response, expected_response};
pub use config::{BenchConfig, CosimConfig, HostConfig};
pub use error::{
    BusError, ConfigError, CosimError, HostError, MatrixError, ParseWordError, SimulationError,
};
pub use host::HostCommand;
pub use master::{
    BitCursor, MasterStatus, ResponseSampler, SampleEdge, SpiMaster, TransactionSequencer,
    TransactionState, TransferEngine, TransferState, Transition, WORD_BITS,
};
pub use peer::{Peer, SilentPeer, TransformPeer};
pub use simulation::{Simulation, SimulationBuilder};
pub use testbench::{Exchange, Testbench};
pub use word::{HexWord, f32_to_word, word_to_f32};
