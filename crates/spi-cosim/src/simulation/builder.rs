use std::path::PathBuf;

use super::Simulation;
use crate::{Peer, SimulationError, waveform::VcdWriter};

/// A fluent builder for configuring and initializing a [`Simulation`].
pub struct SimulationBuilder {
    peer: Box<dyn Peer>,
    vcd_path: Option<PathBuf>,
}

impl SimulationBuilder {
    pub(crate) fn new(peer: Box<dyn Peer>) -> Self {
        Self {
            peer,
            vcd_path: None,
        }
    }

    /// Enable VCD dumping to the specified file.
    pub fn vcd<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.vcd_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub(crate) fn vcd_opt(mut self, path: Option<PathBuf>) -> Self {
        self.vcd_path = path;
        self
    }

    pub fn build(self) -> Result<Simulation, SimulationError> {
        let vcd_writer = self.vcd_path.map(VcdWriter::create).transpose()?;
        if vcd_writer.is_some() {
            log::debug!("dumping waveforms");
        }
        Ok(Simulation::new(self.peer, vcd_writer))
    }
}
