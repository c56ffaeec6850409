//! Systematic uncertainties ("nuisances") attached to a process in a bin.

use std::fmt;
use std::str::FromStr;

use ch_core::{Error, Histogram, Result};
use serde::{Deserialize, Serialize};

use crate::object::{Identity, Record};
use crate::process::Process;

/// How a nuisance acts on its process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystType {
    /// Template morphing with up/down histograms.
    #[serde(rename = "shape")]
    Shape,
    /// Template morphing, quadratic interpolation.
    #[serde(rename = "shapeN2")]
    ShapeN2,
    /// Log-normal normalisation uncertainty.
    #[serde(rename = "lnN")]
    LnN,
    /// Log-uniform normalisation uncertainty.
    #[serde(rename = "lnU")]
    LnU,
}

impl SystType {
    /// Whether nuisances of this type carry up/down templates.
    pub fn is_shape(self) -> bool {
        matches!(self, SystType::Shape | SystType::ShapeN2)
    }

    /// Datacard spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SystType::Shape => "shape",
            SystType::ShapeN2 => "shapeN2",
            SystType::LnN => "lnN",
            SystType::LnU => "lnU",
        }
    }
}

impl fmt::Display for SystType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SystType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "shape" => Ok(SystType::Shape),
            "shapeN2" => Ok(SystType::ShapeN2),
            "lnN" => Ok(SystType::LnN),
            "lnU" => Ok(SystType::LnU),
            other => Err(Error::Parse(format!("unknown systematic type '{}'", other))),
        }
    }
}

/// A systematic uncertainty on one process in one bin.
///
/// Up/down templates are either both present or both absent.
#[derive(Debug, Clone)]
pub struct Nuisance {
    /// Identity of the affected process.
    pub id: Identity,
    /// Signal flag of the affected process.
    pub signal: bool,
    /// Nuisance (and parameter) name.
    pub name: String,
    /// Type.
    pub kind: SystType,
    /// Whether `value_d` is independent of `value_u`.
    pub asymm: bool,
    /// Up variation: yield ratio (shape) or log-normal kappa (lnN).
    pub value_u: f64,
    /// Down variation.
    pub value_d: f64,
    shape_u: Option<Histogram>,
    shape_d: Option<Histogram>,
}

impl Nuisance {
    /// A nuisance on `process`, inheriting its identity and signal flag.
    pub fn from_process(process: &Process, name: impl Into<String>, kind: SystType) -> Self {
        Self {
            id: process.id.clone(),
            signal: process.signal,
            name: name.into(),
            kind,
            asymm: false,
            value_u: 1.0,
            value_d: 1.0,
            shape_u: None,
            shape_d: None,
        }
    }

    /// Up template.
    pub fn shape_u(&self) -> Option<&Histogram> {
        self.shape_u.as_ref()
    }

    /// Down template.
    pub fn shape_d(&self) -> Option<&Histogram> {
        self.shape_d.as_ref()
    }

    /// Whether templates are attached.
    pub fn has_shapes(&self) -> bool {
        self.shape_u.is_some()
    }

    /// Attach both templates.
    pub fn set_shapes(&mut self, up: Histogram, down: Histogram) {
        self.shape_u = Some(up);
        self.shape_d = Some(down);
    }

    /// Attach templates taken from a nominal/up/down triplet: the values become the
    /// yield ratios to the nominal and the templates are normalised to unit integral.
    pub fn set_shapes_from_nominal(
        &mut self,
        mut up: Histogram,
        mut down: Histogram,
        nominal: &Histogram,
    ) {
        let total = nominal.integral();
        if total != 0.0 {
            self.value_u = up.integral() / total;
            self.value_d = down.integral() / total;
        } else {
            log::warn!("nominal template for nuisance {} has zero integral", self.name);
            self.value_u = 1.0;
            self.value_d = 1.0;
        }
        self.asymm = true;
        normalize(&mut up);
        normalize(&mut down);
        self.set_shapes(up, down);
    }

    /// Drop both templates.
    pub fn clear_shapes(&mut self) {
        self.shape_u = None;
        self.shape_d = None;
    }
}

/// Scale to unit integral when the integral is positive.
pub(crate) fn normalize(h: &mut Histogram) {
    let integral = h.integral();
    if integral > 0.0 {
        h.scale(1.0 / integral);
    }
}

impl Record for Nuisance {
    fn identity(&self) -> &Identity {
        &self.id
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.id
    }
}

impl fmt::Display for Nuisance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.id;
        let value = if self.asymm {
            format!("{:.4}/{:.4}", self.value_d, self.value_u)
        } else {
            format!("{:.4}", self.value_u)
        };
        write!(
            f,
            "{:<6} {:<8} {:<6} {:<6} {:<4} {:<28} {:<10} {:<40} {:<7} {}",
            id.mass,
            id.analysis,
            id.era,
            id.channel,
            id.bin_id,
            id.bin,
            id.process,
            self.name,
            self.kind,
            value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_syst_type_round_trip() {
        for t in [SystType::Shape, SystType::ShapeN2, SystType::LnN, SystType::LnU] {
            assert_eq!(t.as_str().parse::<SystType>().unwrap(), t);
        }
        assert!("gmN".parse::<SystType>().is_err());
        assert!(SystType::ShapeN2.is_shape());
        assert!(!SystType::LnN.is_shape());
    }

    #[test]
    fn test_shapes_from_nominal() {
        let p = Process { signal: true, ..Process::default() };
        let mut n = Nuisance::from_process(&p, "CMS_scale_t", SystType::Shape);
        assert!(n.signal);
        assert!(!n.has_shapes());

        let nominal = Histogram::from_contents("n", vec![5.0, 5.0], vec![1.0, 1.0]).unwrap();
        let up = Histogram::from_contents("u", vec![6.0, 6.0], vec![1.0, 1.0]).unwrap();
        let down = Histogram::from_contents("d", vec![4.0, 5.0], vec![1.0, 1.0]).unwrap();
        n.set_shapes_from_nominal(up, down, &nominal);

        assert!(n.asymm);
        assert_relative_eq!(n.value_u, 1.2);
        assert_relative_eq!(n.value_d, 0.9);
        assert_relative_eq!(n.shape_u().unwrap().integral(), 1.0);
        assert_relative_eq!(n.shape_d().unwrap().integral(), 1.0);

        n.clear_shapes();
        assert!(n.shape_d().is_none());
    }
}
