//! The text boundary between a host script and a simulation process.
//!
//! The command word travels to the child as `TX_DATA=0xXXXXXXXX` in its
//! environment; the response is scraped from a `[TB] Received : 0x…` line on
//! its stdout. Everything inside the simulation uses the structured
//! [`Testbench`](crate::Testbench) API instead.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::{HexWord, HostError};

/// Environment key carrying the command word.
pub const TX_DATA_KEY: &str = "TX_DATA";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

static RECEIVED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[TB\] Received\s+: 0x([0-9A-Fa-f]{1,8})\b").expect("static regex is valid")
});

pub fn received_line(word: u32) -> String {
    format!("[TB] Received : {}", HexWord(word))
}

pub fn expected_line(word: u32) -> String {
    format!("[TB] Expected : {}", HexWord(word))
}

/// Extracts the response word from captured simulation output.
pub fn scan_received(stdout: &str) -> Result<u32, HostError> {
    RECEIVED_RE
        .captures(stdout)
        .and_then(|caps| u32::from_str_radix(&caps[1], 16).ok())
        .ok_or_else(|| HostError::ProtocolViolation {
            stdout: stdout.to_string(),
        })
}

/// Parses a `TX_DATA` value.
pub fn parse_tx_data(value: &str) -> Result<u32, HostError> {
    Ok(value.parse::<HexWord>()?.0)
}

/// Reads `TX_DATA` from this process's environment, if set.
pub fn tx_data_from_env() -> Result<Option<u32>, HostError> {
    match std::env::var(TX_DATA_KEY) {
        Ok(value) => parse_tx_data(&value).map(Some),
        Err(_) => Ok(None),
    }
}

/// A simulation launched as a child process, one exchange per launch.
#[derive(Debug, Clone)]
pub struct HostCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl HostCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `word` through one simulation run and returns the response.
    pub fn call(&self, word: u32) -> Result<u32, HostError> {
        let tx_data = HexWord(word).to_string();
        log::info!("[INFO] Sending: {tx_data}");
        let stdout = self.run_captured(&tx_data)?;
        let received = scan_received(&stdout)?;
        log::info!("[INFO] Received: {}", HexWord(received));
        Ok(received)
    }

    /// Runs the program with `TX_DATA` set and returns its stdout. The child
    /// is killed once the timeout expires.
    pub fn run_captured(&self, tx_data: &str) -> Result<String, HostError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(TX_DATA_KEY, tx_data)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HostError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(err) => {
                    reap(&mut child);
                    return Err(err.into());
                }
            }
            if Instant::now() >= deadline {
                reap(&mut child);
                return Err(HostError::Timeout {
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        if !status.success() {
            log::warn!("simulation exited with {status}");
        }
        if !stderr.is_empty() {
            log::debug!("simulation stderr:\n{stderr}");
        }
        Ok(stdout)
    }
}

/// Kills and waits for the child. Both may fail if it already exited.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Collects a pipe on its own thread. Output that is not UTF-8 is decoded
/// lossily so a valid marker line still survives.
fn drain(pipe: Option<impl Read + Send + 'static>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(err) = pipe.read_to_end(&mut buf) {
                log::warn!("reading simulation output failed: {err}");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_line_matches_scanner() {
        let line = received_line(0xABCDEF01);
        assert_eq!(line, "[TB] Received : 0xABCDEF01");
        assert_eq!(scan_received(&line).unwrap(), 0xABCDEF01);
    }

    #[test]
    fn scanner_accepts_padded_label() {
        let out = "INFO cocotb\n     0.00ns INFO [TB] Received  : 0x12345679\n[TB] Expected  : 0x12345679\n";
        assert_eq!(scan_received(out).unwrap(), 0x12345679);
    }

    #[test]
    fn missing_marker_is_a_protocol_violation() {
        let err = scan_received("[TB] Expected : 0x00000001").unwrap_err();
        assert!(matches!(err, HostError::ProtocolViolation { .. }));
    }
}
