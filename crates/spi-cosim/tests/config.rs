use spi_cosim::{BenchConfig, ConfigError, CosimConfig, SampleEdge, Testbench, TransformPeer};

#[test]
fn test_empty_file_is_default() {
    let config = CosimConfig::from_toml_str("").unwrap();
    assert_eq!(config, CosimConfig::default());
    assert_eq!(config.bench.command, 0x1234_5678);
    assert_eq!(config.host.timeout().as_secs(), 10);
}

#[test]
fn test_overrides() {
    let config = CosimConfig::from_toml_str(
        r#"
        [bench]
        command = 0x00000001
        clock_period_ns = 20
        max_cycles = 2000
        sample_edge = "peer-indicator"

        [host]
        timeout_secs = 3
        "#,
    )
    .unwrap();
    assert_eq!(config.bench.command, 1);
    assert_eq!(config.bench.clock_period_ns, 20);
    assert_eq!(config.bench.reset_delay_ns, 100);
    assert_eq!(config.bench.sample_edge, SampleEdge::PeerIndicator);
    assert_eq!(config.host.timeout_secs, 3);

    let result = Testbench::new(config.bench)
        .run(1, TransformPeer::add_one())
        .unwrap();
    assert_eq!(result.received.0, 2);
}

#[test]
fn test_unknown_key_is_rejected() {
    let err = CosimConfig::from_toml_str("[bench]\nclock = 10\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_odd_clock_period_is_rejected() {
    let err = CosimConfig::from_toml_str("[bench]\nclock_period_ns = 7\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("clock_period_ns"));
}

#[test]
fn test_zero_cycle_bound_is_rejected() {
    let config = CosimConfig {
        bench: BenchConfig {
            max_cycles: 0,
            ..BenchConfig::default()
        },
        ..CosimConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cosim.toml");
    std::fs::write(&path, "[bench]\nreset_hold_ns = 40\n").unwrap();
    let config = CosimConfig::load(&path).unwrap();
    assert_eq!(config.bench.reset_hold_ns, 40);

    let missing = CosimConfig::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(missing, ConfigError::Io { .. }));
}
