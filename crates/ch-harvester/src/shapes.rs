//! Attaching histograms, pdfs and datasets to records.
//!
//! Lookups are driven by naming patterns resolved against each record's identity
//! (see [`Identity::resolve`](crate::Identity::resolve)), e.g. `$BIN/$PROCESS` for
//! nominal templates and `$BIN/$PROCESS_$SYSTEMATIC` for variations, where
//! `$SYSTEMATIC` becomes `<name>Up` / `<name>Down`.

use std::ops::DerefMut;
use std::sync::Arc;

use ch_core::{HistogramSource, Result};
use ch_io::Workspace;

use crate::harvester::Harvester;
use crate::selection::Selection;

impl<H: DerefMut<Target = Harvester>> Selection<H> {
    /// Load templates for every selected record that does not have one yet.
    ///
    /// Observations and processes use `rule`; process rates become template
    /// integrals. Shape-type nuisances use `syst_rule` (skipped when empty).
    pub fn extract_shapes<S: HistogramSource + ?Sized>(
        &mut self,
        source: &S,
        rule: &str,
        syst_rule: &str,
    ) -> Result<()> {
        let (src, obs, procs, nus) = self.parts_mut();
        let mut loaded = 0usize;

        for &i in obs {
            let o = &mut src.obs[i];
            if o.shape.is_none() {
                o.set_shape(source.get_histogram(&o.id.resolve(rule))?);
                loaded += 1;
            }
        }
        for &i in procs {
            let p = &mut src.procs[i];
            if p.shape.is_none() {
                p.set_shape(source.get_histogram(&p.id.resolve(rule))?, true);
                loaded += 1;
            }
        }
        if !syst_rule.is_empty() {
            for &i in nus {
                let n = &mut src.nus[i];
                if n.has_shapes() || !n.kind.is_shape() {
                    continue;
                }
                let nominal = source.get_histogram(&n.id.resolve(rule))?;
                let up = source.get_histogram(&n.id.resolve_syst(syst_rule, &format!("{}Up", n.name)))?;
                let down =
                    source.get_histogram(&n.id.resolve_syst(syst_rule, &format!("{}Down", n.name)))?;
                n.set_shapes_from_nominal(up, down, &nominal);
                loaded += 1;
            }
        }
        log::debug!("extracted {} templates from {}", loaded, source.source_name());
        Ok(())
    }
}

impl Harvester {
    /// [`Selection::extract_shapes`] over the whole store.
    pub fn extract_shapes<S: HistogramSource + ?Sized>(
        &mut self,
        source: &S,
        rule: &str,
        syst_rule: &str,
    ) -> Result<()> {
        self.cp_mut().extract_shapes(source, rule, syst_rule)
    }

    /// Keep a copy of `ws`. A workspace with the same name already held is kept
    /// and `ws` is ignored.
    pub fn add_workspace(&mut self, ws: &Workspace) {
        if self.wspaces.contains_key(ws.name()) {
            return;
        }
        log::debug!("cloning workspace \"{}\"", ws.name());
        self.wspaces.insert(ws.name().to_string(), Arc::new(ws.clone()));
    }

    /// Look up a held workspace.
    pub fn workspace(&self, name: &str) -> Option<&Workspace> {
        self.wspaces.get(name).map(|w| w.as_ref())
    }

    /// Attach a pdf from workspace `ws_name` to every process without one; the
    /// object name is `rule` resolved against the process.
    ///
    /// Unknown workspaces are reported and ignored; unknown objects are errors.
    pub fn extract_pdfs(&mut self, ws_name: &str, rule: &str) -> Result<()> {
        let Some(ws) = self.wspaces.get(ws_name).cloned() else {
            log::warn!("workspace \"{}\" not held, no pdfs extracted", ws_name);
            return Ok(());
        };
        for p in self.procs.iter_mut().filter(|p| p.pdf.is_none()) {
            p.pdf = Some(ws.clone_object(&p.id.resolve(rule))?);
        }
        Ok(())
    }

    /// Attach a dataset from workspace `ws_name` to every observation without one.
    pub fn extract_data(&mut self, ws_name: &str, rule: &str) -> Result<()> {
        let Some(ws) = self.wspaces.get(ws_name).cloned() else {
            log::warn!("workspace \"{}\" not held, no data extracted", ws_name);
            return Ok(());
        };
        for o in self.obs.iter_mut().filter(|o| o.data.is_none()) {
            o.data = Some(ws.clone_object(&o.id.resolve(rule))?);
        }
        Ok(())
    }
}
