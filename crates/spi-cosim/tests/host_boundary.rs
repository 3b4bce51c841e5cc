use std::time::{Duration, Instant};

use spi_cosim::host::{self, HostCommand, TX_DATA_KEY};
use spi_cosim::{HexWord, HostError};

#[test]
fn test_tx_data_format_is_fixed_width() {
    assert_eq!(HexWord(1).to_string(), "0x00000001");
    assert_eq!(host::parse_tx_data("0x00000001").unwrap(), 1);
    assert_eq!(host::parse_tx_data("0xffffffff").unwrap(), u32::MAX);
    assert!(matches!(
        host::parse_tx_data("0xnope"),
        Err(HostError::InvalidTxData(_))
    ));
    assert!(matches!(
        host::parse_tx_data("0x+1"),
        Err(HostError::InvalidTxData(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_child_sees_tx_data() {
    let cmd = HostCommand::new("sh")
        .arg("-c")
        .arg(format!("echo \"[TB] Received : ${TX_DATA_KEY}\""));
    let stdout = cmd.run_captured("0x0000BEEF").unwrap();
    assert_eq!(stdout.trim(), "[TB] Received : 0x0000BEEF");
    assert_eq!(cmd.call(0xBEEF).unwrap(), 0xBEEF);
}

#[cfg(unix)]
#[test]
fn test_missing_marker_is_protocol_violation() {
    let cmd = HostCommand::new("sh").arg("-c").arg("echo simulation finished");
    let err = cmd.call(1).unwrap_err();
    match err {
        HostError::ProtocolViolation { stdout } => assert_eq!(stdout, "simulation finished\n"),
        other => panic!("expected protocol violation, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_overrun_is_timeout_and_child_is_killed() {
    let cmd = HostCommand::new("sleep")
        .arg("30")
        .timeout(Duration::from_millis(200));
    let start = Instant::now();
    let err = cmd.call(1).unwrap_err();
    assert!(matches!(err, HostError::Timeout { .. }), "got {err:?}");
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_output_keeps_marker() {
    let cmd = HostCommand::new("sh")
        .arg("-c")
        .arg(r"printf '\377\n[TB] Received : 0x00000002\n'");
    assert_eq!(cmd.call(1).unwrap(), 2);

    let noisy = HostCommand::new("sh").arg("-c").arg(r"printf '\377 no marker\n'");
    match noisy.call(1).unwrap_err() {
        HostError::ProtocolViolation { stdout } => {
            assert_eq!(stdout, "\u{FFFD} no marker\n");
        }
        other => panic!("expected protocol violation, got {other:?}"),
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_timed_out_child_is_reaped() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("child.pid");
    let cmd = HostCommand::new("sh")
        .arg("-c")
        .arg(format!("echo $$ > '{}'; exec sleep 30", pid_file.display()))
        .timeout(Duration::from_millis(500));
    assert!(matches!(cmd.call(1), Err(HostError::Timeout { .. })));

    let pid = std::fs::read_to_string(&pid_file).unwrap();
    let proc_dir = std::path::Path::new("/proc").join(pid.trim());
    assert!(!proc_dir.exists(), "child {} still present", pid.trim());
}

#[test]
fn test_unknown_program_fails_to_spawn() {
    let err = HostCommand::new("/nonexistent/spi-cosim-simulator")
        .call(1)
        .unwrap_err();
    assert!(matches!(err, HostError::Spawn { .. }));
}
