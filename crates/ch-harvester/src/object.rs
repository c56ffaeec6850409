//! Identity fields shared by observations, processes and nuisances.

use serde::{Deserialize, Serialize};

/// Name given to observations' `process` field.
pub const DATA_PROCESS: &str = "data_obs";

/// The category coordinates of a record.
///
/// Not unique: many processes share one bin, and a nuisance carries the identity
/// of the process it acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    /// Analysis tag (e.g. `htt`).
    pub analysis: String,
    /// Data-taking era (e.g. `8TeV`).
    pub era: String,
    /// Final-state channel (e.g. `mt`).
    pub channel: String,
    /// Numeric category id.
    pub bin_id: i32,
    /// Category label (e.g. `muTau_vbf`).
    pub bin: String,
    /// Process name.
    pub process: String,
    /// Mass hypothesis; `*` for mass-independent records.
    pub mass: String,
}

impl Identity {
    /// Substitute `$ANALYSIS`, `$ERA`, `$CHANNEL`, `$BINID`, `$BIN`, `$PROCESS` and
    /// `$MASS` in `pattern`.
    pub fn resolve(&self, pattern: &str) -> String {
        // $BINID must go before $BIN.
        pattern
            .replace("$ANALYSIS", &self.analysis)
            .replace("$ERA", &self.era)
            .replace("$CHANNEL", &self.channel)
            .replace("$BINID", &self.bin_id.to_string())
            .replace("$BIN", &self.bin)
            .replace("$PROCESS", &self.process)
            .replace("$MASS", &self.mass)
    }

    /// Like [`Identity::resolve`], additionally substituting `$SYSTEMATIC`.
    pub fn resolve_syst(&self, pattern: &str, systematic: &str) -> String {
        self.resolve(&pattern.replace("$SYSTEMATIC", systematic))
    }
}

/// Common access to a record's identity.
pub trait Record {
    /// Borrow the identity.
    fn identity(&self) -> &Identity;

    /// Mutably borrow the identity.
    fn identity_mut(&mut self) -> &mut Identity;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> Identity {
        Identity {
            analysis: "htt".into(),
            era: "8TeV".into(),
            channel: "mt".into(),
            bin_id: 6,
            bin: "muTau_vbf".into(),
            process: "ggH".into(),
            mass: "125".into(),
        }
    }

    #[test]
    fn test_resolve_binid_before_bin() {
        assert_eq!(id().resolve("$BIN/$PROCESS$MASS"), "muTau_vbf/ggH125");
        assert_eq!(id().resolve("$ANALYSIS_$CHANNEL_$BINID_$ERA"), "htt_mt_6_8TeV");
    }

    #[test]
    fn test_resolve_systematic() {
        let s = id().resolve_syst("$BIN/$PROCESS$MASS_$SYSTEMATIC", "CMS_scale_tUp");
        assert_eq!(s, "muTau_vbf/ggH125_CMS_scale_tUp");
    }
}
