use crate::{Signal, SignalBus};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use vcd::{IdCode, TimescaleUnit, Value};

pub struct VcdWriter {
    writer: vcd::Writer<BufWriter<File>>,
    ids: Vec<(Signal, IdCode)>,
    last_values: Vec<Option<bool>>,
    timestamp: Option<u64>,
}

impl VcdWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = vcd::Writer::new(BufWriter::new(file));

        writer.timescale(1, TimescaleUnit::NS)?;
        writer.add_module("spi_cosim")?;
        let mut ids = Vec::with_capacity(Signal::COUNT);
        for signal in Signal::ALL {
            ids.push((signal, writer.add_wire(1, signal.name())?));
        }
        writer.upscope()?;
        writer.enddefinitions()?;

        Ok(Self {
            writer,
            ids,
            last_values: vec![None; Signal::COUNT],
            timestamp: None,
        })
    }

    /// Writes the signals that changed since the last dump.
    pub fn dump(&mut self, timestamp: u64, bus: &SignalBus) -> io::Result<()> {
        for (slot, (signal, id)) in self.ids.iter().enumerate() {
            let level = bus.get(*signal);
            if self.last_values[slot] == Some(level) {
                continue;
            }
            if self.timestamp.is_none_or(|last| timestamp > last) {
                self.writer.timestamp(timestamp)?;
                self.timestamp = Some(timestamp);
            }
            let value = if level { Value::V1 } else { Value::V0 };
            self.writer.change_scalar(*id, value)?;
            self.last_values[slot] = Some(level);
        }
        Ok(())
    }
}
