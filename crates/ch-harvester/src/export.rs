//! Serializable snapshot of a store.

use serde::{Deserialize, Serialize};

use ch_core::Histogram;

use crate::harvester::Harvester;
use crate::nuisance::SystType;
use crate::object::Identity;
use crate::parameter::Parameter;

/// Flat document form of a [`Harvester`], suitable for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Observations
    pub observations: Vec<ObservationEntry>,
    /// Processes
    pub processes: Vec<ProcessEntry>,
    /// Nuisances
    pub systematics: Vec<NuisanceEntry>,
    /// Parameters, sorted by name
    pub parameters: Vec<Parameter>,
}

/// Observation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationEntry {
    /// Bin coordinates, flattened into the entry.
    #[serde(flatten)]
    pub id: Identity,
    /// Observed yield.
    pub rate: f64,
    /// Data histogram, if extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Histogram>,
}

/// Process record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEntry {
    /// Bin and process coordinates, flattened into the entry.
    #[serde(flatten)]
    pub id: Identity,
    /// Signal or background.
    pub signal: bool,
    /// Expected yield.
    pub rate: f64,
    /// Normalised template, if extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Histogram>,
    /// Class name of the attached pdf, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
}

/// Nuisance record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuisanceEntry {
    /// Coordinates of the affected process.
    #[serde(flatten)]
    pub id: Identity,
    /// Nuisance (and parameter) name.
    pub name: String,
    /// Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: SystType,
    /// Whether `value_d` is independent of `value_u`.
    pub asymm: bool,
    /// Up variation.
    pub value_u: f64,
    /// Down variation.
    pub value_d: f64,
    /// Up template, for shape types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_u: Option<Histogram>,
    /// Down template, for shape types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_d: Option<Histogram>,
}

impl Harvester {
    /// Snapshot every record. Pdf and dataset payloads are not carried.
    pub fn to_document(&self) -> ModelDocument {
        ModelDocument {
            observations: self
                .obs
                .iter()
                .map(|o| ObservationEntry { id: o.id.clone(), rate: o.rate, shape: o.shape.clone() })
                .collect(),
            processes: self
                .procs
                .iter()
                .map(|p| ProcessEntry {
                    id: p.id.clone(),
                    signal: p.signal,
                    rate: p.rate,
                    shape: p.shape.clone(),
                    pdf: p.pdf.as_ref().map(|o| o.class_name().to_string()),
                })
                .collect(),
            systematics: self
                .nus
                .iter()
                .map(|n| NuisanceEntry {
                    id: n.id.clone(),
                    name: n.name.clone(),
                    kind: n.kind,
                    asymm: n.asymm,
                    value_u: n.value_u,
                    value_d: n.value_d,
                    shape_u: n.shape_u().cloned(),
                    shape_d: n.shape_d().cloned(),
                })
                .collect(),
            parameters: self.params.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nuisance::Nuisance;

    #[test]
    fn test_document_json_shape() {
        let mut cb = Harvester::new();
        cb.add_processes(&["*"], &["htt"], &["8TeV"], &["mt"], &["ZTT"], &[(1, "mt_0jet")], false);
        let p = cb.processes()[0].clone();
        cb.add_systematic(Nuisance::from_process(&p, "lumi", SystType::LnN));

        let v = serde_json::to_value(cb.to_document()).unwrap();
        assert_eq!(v["processes"][0]["process"], "ZTT");
        assert_eq!(v["processes"][0]["bin_id"], 1);
        assert!(v["processes"][0].get("shape").is_none());
        assert_eq!(v["systematics"][0]["type"], "lnN");
        assert_eq!(v["parameters"][0]["name"], "lumi");
    }
}
