//! Declaring systematic uncertainties on selected processes.

use std::ops::DerefMut;

use crate::harvester::Harvester;
use crate::nuisance::{Nuisance, SystType};
use crate::process::Process;
use crate::selection::Selection;

impl<H: DerefMut<Target = Harvester>> Selection<H> {
    /// Add a symmetric nuisance to every selected process for which `value`
    /// returns `Some`. `name` may use identity placeholders (`lumi_$ERA`).
    ///
    /// Returns the number of nuisances created.
    pub fn add_syst<F>(&mut self, name: &str, kind: SystType, value: F) -> usize
    where
        F: Fn(&Process) -> Option<f64>,
    {
        self.add_nuisances(name, kind, false, |p| value(p).map(|v| (v, v)))
    }

    /// Like [`Selection::add_syst`] with separate `(down, up)` values.
    pub fn add_syst_asymm<F>(&mut self, name: &str, kind: SystType, values: F) -> usize
    where
        F: Fn(&Process) -> Option<(f64, f64)>,
    {
        self.add_nuisances(name, kind, true, values)
    }

    fn add_nuisances<F>(&mut self, name: &str, kind: SystType, asymm: bool, values: F) -> usize
    where
        F: Fn(&Process) -> Option<(f64, f64)>,
    {
        let (src, _, procs, _) = self.parts_mut();
        let created: Vec<Nuisance> = procs
            .iter()
            .filter_map(|&i| {
                let p = &src.procs[i];
                values(p).map(|(down, up)| {
                    let mut n = Nuisance::from_process(p, p.id.resolve(name), kind);
                    n.asymm = asymm;
                    n.value_d = down;
                    n.value_u = up;
                    n
                })
            })
            .collect();
        let count = created.len();
        for n in created {
            src.add_systematic(n);
        }
        count
    }
}
