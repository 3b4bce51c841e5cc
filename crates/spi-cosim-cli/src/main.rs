use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spi_cosim::host::{self, HostCommand};
use spi_cosim::matrix::{self, DEFAULT_TOLERANCE};
use spi_cosim::{
    CosimConfig, HexWord, SampleEdge, Testbench, TransformPeer, check_response, f32_to_word,
    word_to_f32,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "spi-cosim",
    version,
    about = "SPI add-one co-simulation harness"
)]
struct Cli {
    /// TOML configuration file ([bench] and [host] tables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one exchange in-process against the add-one peer
    Tb {
        /// Command word; defaults to $TX_DATA, then the configured command
        #[arg(long)]
        tx_data: Option<HexWord>,

        /// Write a VCD waveform of the bus
        #[arg(long)]
        vcd: Option<PathBuf>,

        /// Override the deadlock bound
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Sample miso on the peer's sclk_rising probe instead of the master's own edge
        #[arg(long)]
        peer_indicator: bool,

        /// Print the exchange as JSON instead of the text protocol
        #[arg(long)]
        json: bool,
    },

    /// Send one word through a simulation subprocess
    Call {
        word: HexWord,

        /// Seconds before the simulation is killed
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Round-trip random floats through simulation subprocesses
    Sweep {
        #[arg(long, default_value_t = 10)]
        count: usize,

        #[arg(long)]
        seed: Option<u64>,

        /// Seconds before each simulation is killed
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Check a device matrix-multiplication dump against a software product
    VerifyMatmul {
        dump: PathBuf,

        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CosimConfig::load(path).into_diagnostic()?,
        None => CosimConfig::default(),
    };

    match cli.command {
        Command::Tb {
            tx_data,
            vcd,
            max_cycles,
            peer_indicator,
            json,
        } => {
            let mut bench = config.bench;
            if vcd.is_some() {
                bench.vcd = vcd;
            }
            if let Some(max_cycles) = max_cycles {
                bench.max_cycles = max_cycles;
            }
            if peer_indicator {
                bench.sample_edge = SampleEdge::PeerIndicator;
            }
            let command = match tx_data {
                Some(word) => word.0,
                None => host::tx_data_from_env()
                    .into_diagnostic()?
                    .unwrap_or(bench.command),
            };
            run_tb(Testbench::new(bench), command, json)
        }
        Command::Call { word, timeout } => {
            let host = host_command(cli.config.as_deref(), &config, timeout)?;
            println!("[INFO] Sending: {word}");
            let received = host.call(word.0).into_diagnostic()?;
            println!("[INFO] Received: {}", HexWord(received));
            check_response(word.0, received).into_diagnostic()?;
            println!("[PASS] {word} -> {}", HexWord(received));
            Ok(())
        }
        Command::Sweep {
            count,
            seed,
            timeout,
        } => {
            let host = host_command(cli.config.as_deref(), &config, timeout)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            sweep(&host, &mut rng, count)
        }
        Command::VerifyMatmul { dump, tolerance } => verify_matmul(&dump, tolerance),
    }
}

fn run_tb(bench: Testbench, command: u32, json: bool) -> Result<()> {
    let exchange = bench
        .run(command, TransformPeer::add_one())
        .into_diagnostic()?;

    if json {
        let text = serde_json::to_string_pretty(&exchange).into_diagnostic()?;
        println!("{text}");
    } else {
        println!("{}", host::received_line(exchange.received.0));
        println!("{}", host::expected_line(exchange.expected.0));
    }
    exchange.verify().into_diagnostic()?;
    if !json {
        println!("[PASS] SPI roundtrip test passed.");
    }
    Ok(())
}

/// The simulation subprocess: the configured program, or this binary's own
/// `tb` subcommand with the same configuration file.
fn host_command(
    config_path: Option<&Path>,
    config: &CosimConfig,
    timeout: Option<u64>,
) -> Result<HostCommand> {
    let timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.host.timeout());
    if timeout.is_zero() {
        bail!("--timeout must be positive");
    }

    let host = match &config.host.program {
        Some(program) => HostCommand::new(program),
        None => {
            let mut host = HostCommand::new(std::env::current_exe().into_diagnostic()?);
            if let Some(path) = config_path {
                host = host.arg("--config").arg(path.to_string_lossy());
            }
            host.arg("tb")
        }
    };
    log::debug!("simulation command: {host:?}");
    Ok(host.timeout(timeout))
}

fn sweep(host: &HostCommand, rng: &mut StdRng, count: usize) -> Result<()> {
    let mut failures = 0;
    for i in 0..count {
        let sent: f32 = rng.gen_range(-1000.0..1000.0);
        let word = f32_to_word(sent);
        let received = host.call(word).into_diagnostic()?;

        println!();
        println!("[{i}] Sent Float     : {sent:.6}");
        println!("[{i}] Sent Hex       : {}", HexWord(word));
        println!("[{i}] Received Hex   : {}", HexWord(received));
        println!("[{i}] Received Float : {:.6}", word_to_f32(received));
        if let Err(e) = check_response(word, received) {
            println!("{e}");
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} of {count} round trips failed");
    }
    Ok(())
}

fn verify_matmul(path: &Path, tolerance: f32) -> Result<()> {
    let text = std::fs::read_to_string(path).into_diagnostic()?;
    let dump = matrix::parse_dump(&text).into_diagnostic()?;
    let software = matrix::matmul(&dump.a, &dump.b).into_diagnostic()?;

    println!("A ({}x{}):\n{}", dump.a.rows, dump.a.cols, dump.a);
    println!("B ({}x{}):\n{}", dump.b.rows, dump.b.cols, dump.b);
    println!("C from DUT:\n{}", dump.c);
    println!("C from software:\n{software}");

    let comparison = matrix::compare(&software, &dump.c, tolerance).into_diagnostic()?;
    println!("{comparison}");
    if !comparison.passed() {
        bail!(
            "matrix cross-check failed, max difference {}",
            comparison.max_difference()
        );
    }
    Ok(())
}
