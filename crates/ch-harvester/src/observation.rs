//! Observed data in one bin.

use std::fmt;

use ch_core::{Histogram, ModelObject};

use crate::object::{DATA_PROCESS, Identity, Record};

/// An observation. `Clone` deep-copies the histogram and data object.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Category coordinates; `process` is always `data_obs`.
    pub id: Identity,
    /// Observed event count.
    pub rate: f64,
    /// Observed distribution, once extracted.
    pub shape: Option<Histogram>,
    /// Unbinned or workspace dataset, once extracted.
    pub data: Option<Box<dyn ModelObject>>,
}

impl Default for Observation {
    fn default() -> Self {
        Self {
            id: Identity { process: DATA_PROCESS.to_string(), ..Identity::default() },
            rate: 0.0,
            shape: None,
            data: None,
        }
    }
}

impl Observation {
    /// Attach the observed histogram; the rate becomes its integral.
    pub fn set_shape(&mut self, shape: Histogram) {
        self.rate = shape.integral();
        self.shape = Some(shape);
    }
}

impl Record for Observation {
    fn identity(&self) -> &Identity {
        &self.id
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.id
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.id;
        write!(
            f,
            "{:<6} {:<8} {:<6} {:<6} {:<4} {:<28} {:<10} {:.4}",
            id.mass, id.analysis, id.era, id.channel, id.bin_id, id.bin, id.process, self.rate
        )
    }
}
