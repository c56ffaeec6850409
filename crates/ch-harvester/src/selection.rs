//! Chained selections over a [`Harvester`].
//!
//! A [`Selection`] holds indices into its source store. Restriction calls narrow
//! the index lists; nothing is copied until [`Selection::materialize`], and the
//! `for_each_*` terminals edit the source records in place.
//!
//! ```
//! use ch_harvester::Harvester;
//!
//! let mut cb = Harvester::new();
//! cb.add_processes(&["*"], &["htt"], &["8TeV"], &["mt"], &["ZTT", "W"], &[(1, "mt_0jet")], false);
//!
//! let view = cb.cp().process(&["W"]).materialize();
//! assert_eq!(view.processes().len(), 1);
//!
//! cb.cp_mut().process(&["W"]).for_each_proc(|p| p.rate = 3.0);
//! assert_eq!(cb.processes()[1].rate, 3.0);
//! ```

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use crate::harvester::Harvester;
use crate::nuisance::{Nuisance, SystType};
use crate::object::Identity;
use crate::observation::Observation;
use crate::process::Process;

/// Index-based view of a store. `H` is `&Harvester` or `&mut Harvester`.
#[derive(Debug)]
pub struct Selection<H> {
    src: H,
    obs: Vec<usize>,
    procs: Vec<usize>,
    nus: Vec<usize>,
}

fn contains<S: AsRef<str>>(allowed: &[S], value: &str) -> bool {
    allowed.iter().any(|a| a.as_ref() == value)
}

impl<H: Deref<Target = Harvester>> Selection<H> {
    pub(crate) fn new(src: H) -> Self {
        let (n_obs, n_procs, n_nus) = (src.obs.len(), src.procs.len(), src.nus.len());
        Self {
            src,
            obs: (0..n_obs).collect(),
            procs: (0..n_procs).collect(),
            nus: (0..n_nus).collect(),
        }
    }

    fn retain_ids<F: Fn(&Identity) -> bool>(
        mut self,
        obs: bool,
        procs: bool,
        nus: bool,
        keep: F,
    ) -> Self {
        let src: &Harvester = &self.src;
        if obs {
            self.obs.retain(|&i| keep(&src.obs[i].id));
        }
        if procs {
            self.procs.retain(|&i| keep(&src.procs[i].id));
        }
        if nus {
            self.nus.retain(|&i| keep(&src.nus[i].id));
        }
        self
    }

    /// Keep records whose bin label is in `bins`.
    pub fn bin<S: AsRef<str>>(self, bins: &[S]) -> Self {
        if bins.is_empty() {
            return self;
        }
        self.retain_ids(true, true, true, |id| contains(bins, &id.bin))
    }

    /// Keep records whose bin id is in `ids`.
    pub fn bin_id(self, ids: &[i32]) -> Self {
        if ids.is_empty() {
            return self;
        }
        self.retain_ids(true, true, true, |id| ids.contains(&id.bin_id))
    }

    /// Keep records whose channel is in `channels`.
    pub fn channel<S: AsRef<str>>(self, channels: &[S]) -> Self {
        if channels.is_empty() {
            return self;
        }
        self.retain_ids(true, true, true, |id| contains(channels, &id.channel))
    }

    /// Keep records whose era is in `eras`.
    pub fn era<S: AsRef<str>>(self, eras: &[S]) -> Self {
        if eras.is_empty() {
            return self;
        }
        self.retain_ids(true, true, true, |id| contains(eras, &id.era))
    }

    /// Keep records whose analysis is in `analyses`.
    pub fn analysis<S: AsRef<str>>(self, analyses: &[S]) -> Self {
        if analyses.is_empty() {
            return self;
        }
        self.retain_ids(true, true, true, |id| contains(analyses, &id.analysis))
    }

    /// Keep records whose mass is in `masses`. `*` only matches itself.
    pub fn mass<S: AsRef<str>>(self, masses: &[S]) -> Self {
        if masses.is_empty() {
            return self;
        }
        self.retain_ids(true, true, true, |id| contains(masses, &id.mass))
    }

    /// Keep processes and nuisances whose process name is in `procs`.
    /// Observations are unaffected.
    pub fn process<S: AsRef<str>>(self, procs: &[S]) -> Self {
        if procs.is_empty() {
            return self;
        }
        self.retain_ids(false, true, true, |id| contains(procs, &id.process))
    }

    /// Keep nuisances whose name is in `names`.
    pub fn syst_name<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        if names.is_empty() {
            return self;
        }
        let src: &Harvester = &self.src;
        self.nus.retain(|&i| contains(names, &src.nus[i].name));
        self
    }

    /// Drop nuisances whose name is in `names`.
    pub fn without_syst_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        let src: &Harvester = &self.src;
        self.nus.retain(|&i| !contains(names, &src.nus[i].name));
        self
    }

    /// Keep nuisances whose type is in `kinds`.
    pub fn syst_type(mut self, kinds: &[SystType]) -> Self {
        if kinds.is_empty() {
            return self;
        }
        let src: &Harvester = &self.src;
        self.nus.retain(|&i| kinds.contains(&src.nus[i].kind));
        self
    }

    fn signal_flag(mut self, signal: bool) -> Self {
        let src: &Harvester = &self.src;
        self.procs.retain(|&i| src.procs[i].signal == signal);
        self.nus.retain(|&i| src.nus[i].signal == signal);
        self
    }

    /// Keep signal processes and their nuisances.
    pub fn signals(self) -> Self {
        self.signal_flag(true)
    }

    /// Keep background processes and their nuisances.
    pub fn backgrounds(self) -> Self {
        self.signal_flag(false)
    }

    /// Keep observations and processes with a histogram, and nuisances that either
    /// are not shape-type or carry templates.
    pub fn histograms(mut self) -> Self {
        let src: &Harvester = &self.src;
        self.obs.retain(|&i| src.obs[i].shape.is_some());
        self.procs.retain(|&i| src.procs[i].shape.is_some());
        self.nus.retain(|&i| !src.nus[i].kind.is_shape() || src.nus[i].has_shapes());
        self
    }

    /// Keep processes for which `keep` holds.
    pub fn procs_where<F: Fn(&Process) -> bool>(mut self, keep: F) -> Self {
        let src: &Harvester = &self.src;
        self.procs.retain(|&i| keep(&src.procs[i]));
        self
    }

    /// Number of selected observations.
    pub fn n_obs(&self) -> usize {
        self.obs.len()
    }

    /// Number of selected processes.
    pub fn n_procs(&self) -> usize {
        self.procs.len()
    }

    /// Number of selected nuisances.
    pub fn n_systs(&self) -> usize {
        self.nus.len()
    }

    pub(crate) fn proc_indices(&self) -> &[usize] {
        &self.procs
    }

    /// Iterate over the selected processes without copying.
    pub fn processes(&self) -> impl Iterator<Item = &Process> + '_ {
        self.procs.iter().map(move |&i| &self.src.procs[i])
    }

    /// Distinct values of `f` over the selected processes.
    pub fn set_from_procs<T: Ord, F: Fn(&Process) -> T>(&self, f: F) -> BTreeSet<T> {
        self.processes().map(f).collect()
    }

    /// Distinct bin labels of the selected processes.
    pub fn bin_set(&self) -> BTreeSet<String> {
        self.set_from_procs(|p| p.id.bin.clone())
    }

    /// Copy the selected records into a new, independent store.
    ///
    /// Parameters are copied for every selected nuisance; workspaces are shared.
    pub fn materialize(&self) -> Harvester {
        let src: &Harvester = &self.src;
        let obs: Vec<Observation> = self.obs.iter().map(|&i| src.obs[i].clone()).collect();
        let procs: Vec<Process> = self.procs.iter().map(|&i| src.procs[i].clone()).collect();
        let nus: Vec<Nuisance> = self.nus.iter().map(|&i| src.nus[i].clone()).collect();
        let params = nus
            .iter()
            .filter_map(|n| src.params.get(&n.name).map(|p| (n.name.clone(), p.clone())))
            .collect();
        Harvester { obs, procs, nus, params, wspaces: src.wspaces.clone() }
    }
}

impl<H: DerefMut<Target = Harvester>> Selection<H> {
    /// Call `f` on every selected process of the source store.
    pub fn for_each_proc<F: FnMut(&mut Process)>(&mut self, mut f: F) {
        let src: &mut Harvester = &mut self.src;
        for &i in &self.procs {
            f(&mut src.procs[i]);
        }
    }

    /// Call `f` on every selected observation of the source store.
    pub fn for_each_obs<F: FnMut(&mut Observation)>(&mut self, mut f: F) {
        let src: &mut Harvester = &mut self.src;
        for &i in &self.obs {
            f(&mut src.obs[i]);
        }
    }

    /// Call `f` on every selected nuisance of the source store.
    pub fn for_each_syst<F: FnMut(&mut Nuisance)>(&mut self, mut f: F) {
        let src: &mut Harvester = &mut self.src;
        for &i in &self.nus {
            f(&mut src.nus[i]);
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Harvester, &[usize], &[usize], &[usize]) {
        let src: &mut Harvester = &mut self.src;
        (src, &self.obs, &self.procs, &self.nus)
    }
}
