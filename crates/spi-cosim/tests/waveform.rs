use spi_cosim::{BenchConfig, Testbench, TransformPeer};

#[test]
fn test_exchange_writes_vcd() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spi.vcd");
    let config = BenchConfig {
        vcd: Some(path.clone()),
        ..BenchConfig::default()
    };
    let result = Testbench::new(config)
        .run(0x1234_5678, TransformPeer::add_one())
        .unwrap();
    assert_eq!(result.received.0, 0x1234_5679);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("$timescale"));
    assert!(text.contains("$scope module spi_cosim $end"));
    for name in ["clk", "rst_n", "cs_n", "sclk", "mosi", "miso", "response_ready"] {
        assert!(
            text.lines()
                .any(|line| line.starts_with("$var wire 1 ") && line.contains(&format!(" {name} $end"))),
            "missing wire {name}"
        );
    }
    assert!(text.contains("$enddefinitions"));
    assert!(text.contains(&format!("#{}", result.finished_at_ns)));
}
