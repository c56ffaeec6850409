//! Signal and background processes.

use std::fmt;

use ch_core::{Histogram, ModelObject};

use crate::object::{Identity, Record};

/// A process expected in one bin. `Clone` deep-copies the histogram and pdf.
#[derive(Debug, Clone, Default)]
pub struct Process {
    /// Category coordinates.
    pub id: Identity,
    /// Whether this is a signal process.
    pub signal: bool,
    /// Expected yield.
    pub rate: f64,
    /// Binned template, once extracted.
    pub shape: Option<Histogram>,
    /// Parametric model, once extracted.
    pub pdf: Option<Box<dyn ModelObject>>,
}

impl Process {
    /// Attach a template. With `set_rate`, the rate becomes the template integral.
    pub fn set_shape(&mut self, shape: Histogram, set_rate: bool) {
        if set_rate {
            self.rate = shape.integral();
        }
        self.shape = Some(shape);
    }
}

impl Record for Process {
    fn identity(&self) -> &Identity {
        &self.id
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.id
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.id;
        write!(
            f,
            "{:<6} {:<8} {:<6} {:<6} {:<4} {:<28} {:<10} {:<5} {:.4}",
            id.mass,
            id.analysis,
            id.era,
            id.channel,
            id.bin_id,
            id.bin,
            id.process,
            self.signal,
            self.rate
        )
    }
}
