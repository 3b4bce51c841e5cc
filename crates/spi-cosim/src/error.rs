use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::{HexWord, Owner, Signal, TransactionState};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("signal `{signal}` is driven by the {owner} side, {driver} may not write it")]
    NotOwner {
        signal: Signal,
        owner: Owner,
        driver: Owner,
    },
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(
        "Signal '{0}' is not driven by the testbench (only clk and rst_n can be scheduled). Drive master and peer signals from their models."
    )]
    NotSchedulable(Signal),
    #[error("event queue is empty, no clock has been registered")]
    NoPendingEvents,
    #[error("waveform output failed: {0}")]
    Waveform(#[from] std::io::Error),
}

/// Terminal outcomes of a single command/response exchange.
#[derive(Error, Debug)]
pub enum CosimError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("deadlock: transaction did not reach DONE within {cycles} cycles (stuck in {state})")]
    Deadlock {
        cycles: u64,
        state: TransactionState,
    },
    #[error("[FAIL] SPI response does not match expected value: received {received}, expected {expected}")]
    Mismatch {
        received: HexWord,
        expected: HexWord,
    },
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("simulation timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("could not extract received value from simulation output")]
    ProtocolViolation { stdout: String },
    #[error("failed to launch `{}`: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid TX_DATA: {0}")]
    InvalidTxData(#[from] ParseWordError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{input}` is not a 32-bit hex word: {reason}")]
pub struct ParseWordError {
    pub input: String,
    pub reason: &'static str,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("dump ended early: expected {expected} at line {line}")]
    Truncated { expected: &'static str, line: usize },
    #[error("line {line}: malformed dimension header `{text}`")]
    BadHeader { line: usize, text: String },
    #[error("line {line}: `{text}` is not a 32-bit hex float")]
    BadValue { line: usize, text: String },
    #[error("{rows}x{cols} matrix cannot hold {len} elements")]
    ShapeMismatch { rows: usize, cols: usize, len: usize },
    #[error("cannot multiply {lhs_rows}x{lhs_cols} by {rhs_rows}x{rhs_cols}")]
    DimensionMismatch {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },
}
