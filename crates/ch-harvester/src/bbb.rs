//! Bin-by-bin statistical uncertainties.
//!
//! Per-process mode turns every template bin whose relative error exceeds a
//! threshold into its own asymmetric shape nuisance. Merge mode runs first, per
//! bin label, and folds the smallest per-bin errors into the largest ones so that
//! fewer nuisances are needed for the same total variance.

use ch_core::{Error, Histogram, Result};

use crate::harvester::Harvester;
use crate::nuisance::{normalize, Nuisance, SystType};
use crate::process::Process;

/// Outcome of a per-process bin-by-bin pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinByBinReport {
    /// Nuisances created.
    pub added: usize,
    /// Processes skipped because `fixed_norm` was requested on a template with at
    /// most one populated bin, or with a zero nominal integral.
    pub skipped_processes: usize,
    /// Bins with content <= 0 but a positive error, including those of skipped
    /// processes.
    pub inconsistent_bins: usize,
}

/// Outcome of a merge pass, summed over all bin labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// (process, bin) pairs whose error counted towards a bin's variance.
    pub contributors: usize,
    /// Contributors whose error was zeroed.
    pub removed: usize,
}

fn check_threshold(what: &str, value: f64) -> Result<()> {
    if value.is_nan() || value < 0.0 {
        return Err(Error::Validation(format!("{} must be >= 0, got {}", what, value)));
    }
    Ok(())
}

fn check_merge_threshold(value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::Validation(format!("merge threshold must be in [0, 1], got {}", value)));
    }
    Ok(())
}

/// Bin-by-bin nuisances for one process, or `None` when the process is skipped.
fn process_bbb(
    process: &Process,
    h: &Histogram,
    threshold: f64,
    fixed_norm: bool,
    report: &mut BinByBinReport,
) -> Option<Vec<Nuisance>> {
    // Counted even when the process is skipped below.
    for j in 0..h.n_bins() {
        if h.bin_content(j) <= 0.0 && h.bin_error(j) > 0.0 {
            log::warn!("bin {} of {} has content <= 0 and error > 0, skipping", j + 1, process);
            report.inconsistent_bins += 1;
        }
    }

    let populated = h.contents().iter().filter(|&&c| c > 0.0).count();
    if fixed_norm && populated <= 1 {
        log::warn!("fixed_norm requested but template has <= 1 populated bins, skipping {}", process);
        return None;
    }
    let total = h.integral();
    if !fixed_norm && total == 0.0 {
        log::warn!("template has zero integral, skipping {}", process);
        return None;
    }

    let mut out = Vec::new();
    for j in 0..h.n_bins() {
        let (val, err) = (h.bin_content(j), h.bin_error(j));
        if val <= 0.0 || err / val <= threshold {
            continue;
        }
        let name = format!("CMS_{}_{}_bin_{}", process.id.bin, process.id.process, j + 1);
        let mut n = Nuisance::from_process(process, name, SystType::Shape);
        n.asymm = true;

        let mut down = h.clone();
        down.set_bin_content(j, (val - err).max(0.0));
        let mut up = h.clone();
        up.set_bin_content(j, val + err);
        if !fixed_norm {
            n.value_d = down.integral() / total;
            n.value_u = up.integral() / total;
        }
        normalize(&mut down);
        normalize(&mut up);
        n.set_shapes(up, down);
        out.push(n);
    }
    Some(out)
}

impl Harvester {
    /// Add bin-by-bin nuisances for every process with a template, into this store.
    ///
    /// A bin gets a nuisance when `error / content > threshold`. With `fixed_norm`
    /// the nuisance values stay at 1 (shape-only variations); otherwise they are the
    /// yield ratios of the varied templates.
    pub fn add_bin_by_bin(&mut self, threshold: f64, fixed_norm: bool) -> Result<BinByBinReport> {
        let (created, report) = self.collect_bin_by_bin(threshold, fixed_norm)?;
        for n in created {
            self.add_systematic(n);
        }
        Ok(report)
    }

    /// Like [`Harvester::add_bin_by_bin`], writing the nuisances and their
    /// parameters into `target`.
    pub fn add_bin_by_bin_to(
        &self,
        threshold: f64,
        fixed_norm: bool,
        target: &mut Harvester,
    ) -> Result<BinByBinReport> {
        let (created, report) = self.collect_bin_by_bin(threshold, fixed_norm)?;
        for n in created {
            target.add_systematic(n);
        }
        Ok(report)
    }

    fn collect_bin_by_bin(
        &self,
        threshold: f64,
        fixed_norm: bool,
    ) -> Result<(Vec<Nuisance>, BinByBinReport)> {
        check_threshold("bin-by-bin threshold", threshold)?;
        let mut report = BinByBinReport::default();
        let mut created = Vec::new();
        for p in &self.procs {
            let Some(h) = &p.shape else { continue };
            match process_bbb(p, h, threshold, fixed_norm, &mut report) {
                Some(ns) => created.extend(ns),
                None => report.skipped_processes += 1,
            }
        }
        report.added = created.len();
        log::debug!("bin-by-bin: {} nuisances added", report.added);
        Ok((created, report))
    }

    /// Merge small per-bin statistical errors into larger ones, independently for
    /// every bin label.
    ///
    /// Within a histogram bin, contributors are the processes with zero content and
    /// a non-zero error, or with `error / content > bbb_threshold`. The smallest
    /// contributors are zeroed while the removed variance stays below
    /// `merge_threshold` times the total; the largest is never removed. Survivors
    /// are scaled by `sqrt(total / (total - removed))`.
    pub fn merge_bin_errors(&mut self, bbb_threshold: f64, merge_threshold: f64) -> Result<MergeReport> {
        check_threshold("bin-by-bin threshold", bbb_threshold)?;
        check_merge_threshold(merge_threshold)?;
        let mut report = MergeReport::default();

        for label in self.bin_set() {
            let indices: Vec<usize> =
                self.cp().bin(&[label.as_str()]).histograms().proc_indices().to_vec();
            let originals: Vec<&Histogram> =
                indices.iter().filter_map(|&i| self.procs[i].shape.as_ref()).collect();
            let Some(first) = originals.first() else { continue };
            let n_bins = first.n_bins();
            if originals.iter().any(|h| h.n_bins() != n_bins) {
                log::warn!("bin {}: templates differ in bin count, extra bins are not merged", label);
            }
            let mut copies: Vec<Histogram> = originals.iter().map(|h| (*h).clone()).collect();

            for b in 0..n_bins {
                let mut contrib: Vec<(f64, usize)> = Vec::new();
                for (k, h) in originals.iter().enumerate() {
                    if b >= h.n_bins() {
                        continue;
                    }
                    let (val, err) = (h.bin_content(b), h.bin_error(b));
                    if val == 0.0 && err == 0.0 {
                        continue;
                    }
                    if val == 0.0 || err / val > bbb_threshold {
                        contrib.push((err * err, k));
                    }
                }
                let total: f64 = contrib.iter().map(|c| c.0).sum();
                if total == 0.0 {
                    continue;
                }
                report.contributors += contrib.len();
                contrib.sort_by(|x, y| x.0.total_cmp(&y.0));

                let mut removed = 0.0;
                let mut n_removed = 0;
                for &(e2, k) in &contrib[..contrib.len() - 1] {
                    if e2 + removed >= merge_threshold * total {
                        break;
                    }
                    removed += e2;
                    n_removed += 1;
                    copies[k].set_bin_error(b, 0.0);
                }
                report.removed += n_removed;

                let expand = (total / (total - removed)).sqrt();
                for &(_, k) in &contrib[n_removed..] {
                    let err = copies[k].bin_error(b);
                    copies[k].set_bin_error(b, err * expand);
                }
            }

            for (&i, h) in indices.iter().zip(copies) {
                self.procs[i].shape = Some(h);
            }
        }
        log::debug!(
            "merge: {} contributors, {} removed",
            report.contributors,
            report.removed
        );
        Ok(report)
    }
}

/// Thresholds for a merge-then-add bin-by-bin pass.
///
/// ```
/// use ch_harvester::BinByBinFactory;
///
/// let bbb = BinByBinFactory::new().with_add_threshold(0.1).with_merge_threshold(0.5);
/// assert_eq!(bbb.add_threshold(), 0.1);
/// assert!(bbb.fix_norm());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinByBinFactory {
    add_threshold: f64,
    merge_threshold: f64,
    fix_norm: bool,
}

impl Default for BinByBinFactory {
    fn default() -> Self {
        Self { add_threshold: 0.0, merge_threshold: 0.0, fix_norm: true }
    }
}

impl BinByBinFactory {
    /// Add threshold 0, merge threshold 0, fixed normalisation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative error above which a bin is considered.
    pub fn with_add_threshold(mut self, threshold: f64) -> Self {
        self.add_threshold = threshold;
        self
    }

    /// Fraction of a bin's variance that may be merged away.
    pub fn with_merge_threshold(mut self, threshold: f64) -> Self {
        self.merge_threshold = threshold;
        self
    }

    /// Whether created nuisances keep unit values.
    pub fn with_fix_norm(mut self, fix_norm: bool) -> Self {
        self.fix_norm = fix_norm;
        self
    }

    /// Current add threshold.
    pub fn add_threshold(&self) -> f64 {
        self.add_threshold
    }

    /// Current merge threshold.
    pub fn merge_threshold(&self) -> f64 {
        self.merge_threshold
    }

    /// Current normalisation mode.
    pub fn fix_norm(&self) -> bool {
        self.fix_norm
    }

    /// Merge the errors of `src`, then add nuisances for `src` into `dest`.
    pub fn merge_and_add(&self, src: &mut Harvester, dest: &mut Harvester) -> Result<BinByBinReport> {
        src.merge_bin_errors(self.add_threshold, self.merge_threshold)?;
        self.add_only(src, dest)
    }

    /// [`BinByBinFactory::merge_and_add`] with `src` as its own destination.
    pub fn merge_and_add_in_place(&self, cb: &mut Harvester) -> Result<BinByBinReport> {
        cb.merge_bin_errors(self.add_threshold, self.merge_threshold)?;
        cb.add_bin_by_bin(self.add_threshold, self.fix_norm)
    }

    /// Add nuisances for `src` into `dest` without merging.
    pub fn add_only(&self, src: &Harvester, dest: &mut Harvester) -> Result<BinByBinReport> {
        src.add_bin_by_bin_to(self.add_threshold, self.fix_norm, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hist(content: &[f64], errors: &[f64]) -> Histogram {
        Histogram::from_contents("h", content.to_vec(), errors.to_vec()).unwrap()
    }

    fn store_with(shapes: &[(&str, Histogram)]) -> Harvester {
        let mut cb = Harvester::new();
        let names: Vec<&str> = shapes.iter().map(|s| s.0).collect();
        cb.add_processes(&["*"], &["htt"], &["8TeV"], &["mt"], &names, &[(1, "mt_0jet")], false);
        for (p, (_, h)) in cb.procs.iter_mut().zip(shapes) {
            p.set_shape(h.clone(), true);
        }
        cb
    }

    #[test]
    fn test_single_bin_fixed_norm_skipped() {
        let mut cb = store_with(&[("ZTT", hist(&[100.0], &[20.0]))]);
        let report = cb.add_bin_by_bin(0.1, true).unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(report.skipped_processes, 1);
        assert!(cb.systematics().is_empty());
    }

    #[test]
    fn test_single_bin_values() {
        let mut cb = store_with(&[("ZTT", hist(&[100.0], &[20.0]))]);
        let report = cb.add_bin_by_bin(0.1, false).unwrap();
        assert_eq!(report.added, 1);

        let n = &cb.systematics()[0];
        assert_eq!(n.name, "CMS_mt_0jet_ZTT_bin_1");
        assert_eq!(n.kind, SystType::Shape);
        assert!(n.asymm);
        assert_relative_eq!(n.value_d, 0.8);
        assert_relative_eq!(n.value_u, 1.2);
        assert_relative_eq!(n.shape_d().unwrap().integral(), 1.0);
        assert_relative_eq!(n.shape_u().unwrap().integral(), 1.0);
        assert!(cb.parameter("CMS_mt_0jet_ZTT_bin_1").is_some());
    }

    #[test]
    fn test_threshold_and_inconsistent_bins() {
        let h = hist(&[100.0, 4.0, 0.0, -1.0, 50.0], &[1.0, 2.0, 0.0, 1.0, 10.0]);
        let mut cb = store_with(&[("W", h)]);
        let report = cb.add_bin_by_bin(0.1, true).unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(report.inconsistent_bins, 1);
        let names: Vec<&str> = cb.systematics().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["CMS_mt_0jet_W_bin_2", "CMS_mt_0jet_W_bin_5"]);
        assert!(cb.systematics().iter().all(|n| n.value_u == 1.0 && n.value_d == 1.0));
    }

    #[test]
    fn test_inconsistent_bins_counted_for_skipped_process() {
        let mut cb = store_with(&[("QCD", hist(&[5.0, -5.0], &[1.0, 2.0]))]);
        let report = cb.add_bin_by_bin(0.1, false).unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(report.skipped_processes, 1);
        assert_eq!(report.inconsistent_bins, 1);
        assert!(cb.systematics().is_empty());
    }

    #[test]
    fn test_down_variation_clamped_at_zero() {
        let mut cb = store_with(&[("QCD", hist(&[2.0, 10.0], &[3.0, 0.1]))]);
        cb.add_bin_by_bin(0.5, false).unwrap();
        let n = &cb.systematics()[0];
        assert_relative_eq!(n.value_d, 10.0 / 12.0);
        assert_relative_eq!(n.shape_d().unwrap().bin_content(0), 0.0);
    }

    #[test]
    fn test_add_into_target_dedups_parameters() {
        let cb = store_with(&[("ZTT", hist(&[10.0, 10.0], &[5.0, 5.0]))]);
        let mut target = Harvester::new();
        cb.add_bin_by_bin_to(0.1, true, &mut target).unwrap();
        cb.add_bin_by_bin_to(0.1, true, &mut target).unwrap();
        assert!(cb.systematics().is_empty());
        assert_eq!(target.systematics().len(), 4);
        assert_eq!(target.parameters().count(), 2);
    }

    #[test]
    fn test_merge_removes_smallest_and_rescales() {
        let mut cb = store_with(&[
            ("A", hist(&[10.0], &[1.0])),
            ("B", hist(&[10.0], &[2.0])),
            ("C", hist(&[10.0], &[3.0])),
        ]);
        let report = cb.merge_bin_errors(0.05, 0.3).unwrap();
        assert_eq!(report, MergeReport { contributors: 3, removed: 1 });

        let expand = (14.0f64 / 13.0).sqrt();
        let errs: Vec<f64> = cb.processes().iter().map(|p| p.shape.as_ref().unwrap().bin_error(0)).collect();
        assert_relative_eq!(errs[0], 0.0);
        assert_relative_eq!(errs[1], 2.0 * expand, epsilon = 1e-12);
        assert_relative_eq!(errs[2], 3.0 * expand, epsilon = 1e-12);
        // Survivors scale by sqrt(total / (total - removed)), not 1 / (1 - removed * total),
        // so the summed variance of the bin stays at 14.
        let var: f64 = errs.iter().map(|e| e * e).sum();
        assert_relative_eq!(var, 14.0, epsilon = 1e-9);
        // Contents are untouched.
        assert_relative_eq!(cb.rate(), 30.0);
    }

    #[test]
    fn test_merge_keeps_last_contributor() {
        let mut cb = store_with(&[("A", hist(&[10.0], &[1.0])), ("B", hist(&[10.0], &[2.0]))]);
        cb.merge_bin_errors(0.0, 1.0).unwrap();
        let errs: Vec<f64> = cb.processes().iter().map(|p| p.shape.as_ref().unwrap().bin_error(0)).collect();
        assert_relative_eq!(errs[0], 0.0);
        assert_relative_eq!(errs[1], 5.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_merge_bins_are_independent() {
        let mut cb = Harvester::new();
        cb.add_processes(&["*"], &["htt"], &["8TeV"], &["mt"], &["A"], &[(1, "mt_0jet"), (2, "mt_vbf")], false);
        cb.procs[0].set_shape(hist(&[10.0], &[1.0]), true);
        cb.procs[1].set_shape(hist(&[10.0], &[2.0]), true);
        let report = cb.merge_bin_errors(0.0, 1.0).unwrap();
        assert_eq!(report.removed, 0);
        assert_relative_eq!(cb.procs[0].shape.as_ref().unwrap().bin_error(0), 1.0);
    }

    #[test]
    fn test_merge_ignores_empty_bins() {
        let mut cb = store_with(&[("A", hist(&[0.0, 5.0], &[0.0, 0.0]))]);
        let report = cb.merge_bin_errors(0.1, 0.5).unwrap();
        assert_eq!(report.contributors, 0);
    }

    #[test]
    fn test_threshold_validation() {
        let mut cb = Harvester::new();
        assert!(matches!(cb.add_bin_by_bin(-0.1, true), Err(Error::Validation(_))));
        assert!(matches!(cb.add_bin_by_bin(f64::NAN, true), Err(Error::Validation(_))));
        assert!(matches!(cb.merge_bin_errors(0.1, 1.5), Err(Error::Validation(_))));
    }

    #[test]
    fn test_factory_merge_and_add() {
        let mut src = store_with(&[
            ("A", hist(&[10.0, 10.0], &[1.0, 1.0])),
            ("B", hist(&[10.0, 10.0], &[3.0, 3.0])),
        ]);
        let mut dest = Harvester::new();
        let bbb = BinByBinFactory::new().with_add_threshold(0.05).with_merge_threshold(0.5);
        let report = bbb.merge_and_add(&mut src, &mut dest).unwrap();
        // A's errors are merged into B, so only B's two bins get nuisances.
        assert_eq!(report.added, 2);
        assert!(dest.systematics().iter().all(|n| n.id.process == "B"));
    }
}
