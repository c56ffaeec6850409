//! Fit parameters, one per distinct nuisance name.

use serde::{Deserialize, Serialize};

/// A fit parameter. Names are unique within a [`crate::Harvester`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Central value.
    pub val: f64,
    /// Upper uncertainty.
    pub err_u: f64,
    /// Lower uncertainty (negative).
    pub err_d: f64,
    /// Allowed range, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
    /// Whether the parameter is held constant in the fit.
    #[serde(default)]
    pub frozen: bool,
}

impl Parameter {
    /// A unit-Gaussian nuisance parameter centred at zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), val: 0.0, err_u: 1.0, err_d: -1.0, range: None, frozen: false }
    }
}
