//! The entity store: observations, processes, nuisances and parameters.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ch_io::Workspace;

use crate::combinations::generate_combinations;
use crate::nuisance::{Nuisance, SystType};
use crate::object::{Identity, Record};
use crate::observation::Observation;
use crate::parameter::Parameter;
use crate::process::Process;
use crate::selection::Selection;

/// Bin naming pattern used by [`Harvester::set_standard_bin_names`] callers.
pub const STANDARD_BIN_PATTERN: &str = "$ANALYSIS_$CHANNEL_$BINID_$ERA";

/// Owns every record of a statistical model under construction.
///
/// `Clone` is a deep copy of all records; workspaces are shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Harvester {
    pub(crate) obs: Vec<Observation>,
    pub(crate) procs: Vec<Process>,
    pub(crate) nus: Vec<Nuisance>,
    pub(crate) params: BTreeMap<String, Parameter>,
    pub(crate) wspaces: BTreeMap<String, Arc<Workspace>>,
}

impl Harvester {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All observations, in insertion order.
    pub fn observations(&self) -> &[Observation] {
        &self.obs
    }

    /// All processes, in insertion order.
    pub fn processes(&self) -> &[Process] {
        &self.procs
    }

    /// All nuisances, in insertion order.
    pub fn systematics(&self) -> &[Nuisance] {
        &self.nus
    }

    /// All parameters, sorted by name.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    /// Look up a parameter.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    /// Look up a parameter for editing.
    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.get_mut(name)
    }

    /// Add one observation per `(mass, analysis, era, channel, bin)` combination.
    pub fn add_observations<S: AsRef<str>>(
        &mut self,
        mass: &[S],
        analysis: &[S],
        era: &[S],
        channel: &[S],
        bins: &[(i32, S)],
    ) {
        let lengths = [mass.len(), analysis.len(), era.len(), channel.len(), bins.len()];
        for c in generate_combinations(&lengths) {
            let mut obs = Observation::default();
            fill_identity(&mut obs.id, &c, mass, analysis, era, channel, bins);
            self.obs.push(obs);
        }
    }

    /// Add one process per `(mass, analysis, era, channel, bin)` combination and
    /// process name. The processes of one combination are contiguous, in `procs` order.
    pub fn add_processes<S: AsRef<str>>(
        &mut self,
        mass: &[S],
        analysis: &[S],
        era: &[S],
        channel: &[S],
        procs: &[S],
        bins: &[(i32, S)],
        signal: bool,
    ) {
        let lengths = [mass.len(), analysis.len(), era.len(), channel.len(), bins.len()];
        for c in generate_combinations(&lengths) {
            for name in procs {
                let mut proc = Process { signal, ..Process::default() };
                fill_identity(&mut proc.id, &c, mass, analysis, era, channel, bins);
                proc.id.process = name.as_ref().to_string();
                self.procs.push(proc);
            }
        }
    }

    /// Append a nuisance, creating its parameter if needed.
    pub fn add_systematic(&mut self, nuisance: Nuisance) {
        self.create_parameter_if_empty(&nuisance.name);
        self.nus.push(nuisance);
    }

    /// Register a parameter called `name` unless one already exists.
    pub fn create_parameter_if_empty(&mut self, name: &str) {
        if !self.params.contains_key(name) {
            self.params.insert(name.to_string(), Parameter::new(name));
        }
    }

    /// Remove every process for which `pred` holds; survivors keep their order.
    pub fn filter_procs<F: FnMut(&Process) -> bool>(&mut self, mut pred: F) {
        self.procs.retain(|p| !pred(p));
    }

    /// Remove every observation for which `pred` holds.
    pub fn filter_obs<F: FnMut(&Observation) -> bool>(&mut self, mut pred: F) {
        self.obs.retain(|o| !pred(o));
    }

    /// Remove every nuisance for which `pred` holds. Parameters are kept.
    pub fn filter_systs<F: FnMut(&Nuisance) -> bool>(&mut self, mut pred: F) {
        self.nus.retain(|n| !pred(n));
    }

    /// Start a read-only selection over every record.
    pub fn cp(&self) -> Selection<&Harvester> {
        Selection::new(self)
    }

    /// Start a selection whose terminal operations edit this store in place.
    pub fn cp_mut(&mut self) -> Selection<&mut Harvester> {
        Selection::new(self)
    }

    /// Distinct values of `f` over all processes.
    pub fn set_from_procs<T: Ord, F: Fn(&Process) -> T>(&self, f: F) -> BTreeSet<T> {
        self.procs.iter().map(f).collect()
    }

    /// Distinct bin labels.
    pub fn bin_set(&self) -> BTreeSet<String> {
        self.set_from_procs(|p| p.id.bin.clone())
    }

    /// Distinct bin ids.
    pub fn bin_id_set(&self) -> BTreeSet<i32> {
        self.set_from_procs(|p| p.id.bin_id)
    }

    /// Distinct channels.
    pub fn channel_set(&self) -> BTreeSet<String> {
        self.set_from_procs(|p| p.id.channel.clone())
    }

    /// Distinct eras.
    pub fn era_set(&self) -> BTreeSet<String> {
        self.set_from_procs(|p| p.id.era.clone())
    }

    /// Distinct analyses.
    pub fn analysis_set(&self) -> BTreeSet<String> {
        self.set_from_procs(|p| p.id.analysis.clone())
    }

    /// Distinct masses.
    pub fn mass_set(&self) -> BTreeSet<String> {
        self.set_from_procs(|p| p.id.mass.clone())
    }

    /// Distinct process names.
    pub fn process_set(&self) -> BTreeSet<String> {
        self.set_from_procs(|p| p.id.process.clone())
    }

    /// Distinct nuisance names.
    pub fn syst_name_set(&self) -> BTreeSet<String> {
        self.nus.iter().map(|n| n.name.clone()).collect()
    }

    /// Distinct nuisance types.
    pub fn syst_type_set(&self) -> BTreeSet<SystType> {
        self.nus.iter().map(|n| n.kind).collect()
    }

    /// Total expected yield.
    pub fn rate(&self) -> f64 {
        self.procs.iter().map(|p| p.rate).sum()
    }

    /// Total observed yield.
    pub fn observed_rate(&self) -> f64 {
        self.obs.iter().map(|o| o.rate).sum()
    }

    /// Rename every record's bin by resolving `pattern` against its identity,
    /// e.g. [`STANDARD_BIN_PATTERN`].
    pub fn set_standard_bin_names(&mut self, pattern: &str) {
        fn rename<R: Record>(records: &mut [R], pattern: &str) {
            for r in records {
                let id = r.identity_mut();
                id.bin = id.resolve(pattern);
            }
        }
        rename(&mut self.obs, pattern);
        rename(&mut self.procs, pattern);
        rename(&mut self.nus, pattern);
    }
}

fn fill_identity<S: AsRef<str>>(
    id: &mut Identity,
    c: &[usize],
    mass: &[S],
    analysis: &[S],
    era: &[S],
    channel: &[S],
    bins: &[(i32, S)],
) {
    id.mass = mass[c[0]].as_ref().to_string();
    id.analysis = analysis[c[1]].as_ref().to_string();
    id.era = era[c[2]].as_ref().to_string();
    id.channel = channel[c[3]].as_ref().to_string();
    id.bin_id = bins[c[4]].0;
    id.bin = bins[c[4]].1.as_ref().to_string();
}
