//! `ch-cli harvest`: build a model from a config and the shape file it names.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;

use ch_harvester::{
    BinByBinFactory, BinByBinReport, Harvester, ModelDocument, STANDARD_BIN_PATTERN,
};
use ch_io::{Graph, ShapeFile, parse_file_lines};

use crate::config::HarvestConfig;

/// Counters reported next to the model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestSummary {
    pub observations: usize,
    pub processes: usize,
    pub systematics: usize,
    pub parameters: usize,
    pub bins: usize,
    pub bbb_added: usize,
    pub bbb_skipped_processes: usize,
    pub systematics_dropped: usize,
    pub rate: f64,
    pub observed_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestOutput {
    pub summary: HarvestSummary,
    pub model: ModelDocument,
}

pub fn run_harvest(cfg: &HarvestConfig) -> Result<(Harvester, HarvestSummary)> {
    let masses = cfg.mass_points()?;
    let cats: Vec<(i32, String)> = cfg.categories.iter().map(|c| (c.id, c.name.clone())).collect();
    let any_mass = vec!["*".to_string()];
    let analysis = vec![cfg.analysis.clone()];
    let mut summary = HarvestSummary::default();

    tracing::info!("creating processes and observations");
    let mut cb = Harvester::new();
    cb.add_observations(&any_mass, &analysis, &cfg.eras, &cfg.channels, &cats);
    cb.add_processes(&any_mass, &analysis, &cfg.eras, &cfg.channels, &cfg.backgrounds, &cats, false);
    cb.add_processes(&masses, &analysis, &cfg.eras, &cfg.channels, &cfg.signals, &cats, true);

    tracing::info!("adding systematic uncertainties");
    for s in &cfg.systematics {
        let mut sel = cb.cp_mut().process(&s.processes).channel(&s.channels).era(&s.eras);
        let n = match s.value_down {
            Some(down) => sel.add_syst_asymm(&s.name, s.kind, |_| Some((down, s.value))),
            None => sel.add_syst(&s.name, s.kind, |_| Some(s.value)),
        };
        if n == 0 {
            tracing::warn!(name = %s.name, "systematic matched no process");
        }
    }

    tracing::info!(path = %cfg.shapes.display(), "extracting histograms");
    let shapes = ShapeFile::open(&cfg.shapes)
        .with_context(|| format!("failed to open shape file {}", cfg.shapes.display()))?;
    cb.cp_mut()
        .backgrounds()
        .extract_shapes(&shapes, &cfg.rules.background, &cfg.rules.background_syst)
        .context("background extraction failed")?;
    cb.cp_mut()
        .signals()
        .extract_shapes(&shapes, &cfg.rules.signal, &cfg.rules.signal_syst)
        .context("signal extraction failed")?;

    if let Some(w) = &cfg.workspace {
        let ws = shapes.get_workspace(&w.path)?;
        cb.add_workspace(&ws);
        if let Some(rule) = &w.pdf_rule {
            cb.extract_pdfs(ws.name(), rule)?;
        }
        if let Some(rule) = &w.data_rule {
            cb.extract_data(ws.name(), rule)?;
        }
    }

    for x in &cfg.xsec {
        tracing::info!(table = %x.table.display(), column = %x.y, "scaling process rates");
        let graph = Graph::from_table(&x.table, &x.x, &x.y)
            .with_context(|| format!("failed to read table {}", x.table.display()))?;
        let mut bad_mass = None;
        cb.cp_mut().process(&x.processes).era(&x.eras).for_each_proc(|p| {
            match p.id.mass.parse::<f64>() {
                Ok(m) => p.rate *= graph.eval(m),
                Err(_) => bad_mass = Some(p.id.mass.clone()),
            }
        });
        if let Some(m) = bad_mass {
            anyhow::bail!("cannot scale by {}: mass '{}' is not a number", x.y, m);
        }
    }

    if let Some(b) = &cfg.bin_by_bin {
        tracing::info!("merging bin errors and generating bin-by-bin uncertainties");
        let bbb = BinByBinFactory::new()
            .with_add_threshold(b.add_threshold)
            .with_merge_threshold(b.merge_threshold)
            .with_fix_norm(b.fix_norm);
        let mut src = cb.cp().backgrounds().process(&b.processes).materialize();
        let report: BinByBinReport = bbb.merge_and_add(&mut src, &mut cb)?;
        // Carry the merged templates back into the model.
        for merged in src.processes() {
            cb.cp_mut().procs_where(|p| p.id == merged.id).for_each_proc(|p| {
                p.shape = merged.shape.clone();
            });
        }
        summary.bbb_added = report.added;
        summary.bbb_skipped_processes = report.skipped_processes;
    }

    if cfg.standard_bin_names {
        tracing::info!("setting standardised bin names");
        cb.set_standard_bin_names(STANDARD_BIN_PATTERN);
    }

    if let Some(path) = &cfg.drop_list {
        let to_drop: BTreeSet<String> = parse_file_lines(path)
            .with_context(|| format!("failed to read drop list {}", path.display()))?
            .into_iter()
            .collect();
        tracing::info!(entries = to_drop.len(), "applying drop list");
        let before = cb.syst_name_set().len();
        cb.filter_systs(|n| to_drop.contains(&n.name));
        summary.systematics_dropped = before - cb.syst_name_set().len();
    }

    summary.observations = cb.observations().len();
    summary.processes = cb.processes().len();
    summary.systematics = cb.systematics().len();
    summary.parameters = cb.parameters().count();
    summary.bins = cb.bin_set().len();
    summary.rate = cb.rate();
    summary.observed_rate = cb.observed_rate();
    Ok((cb, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::read_harvest_config;
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures").join(name)
    }

    #[test]
    fn test_harvest_fixture() {
        let cfg = read_harvest_config(&fixture_path("harvest.yaml")).unwrap();
        let (cb, summary) = run_harvest(&cfg).unwrap();

        assert_eq!(summary.observations, 2);
        // 3 backgrounds and 1 signal at 3 mass points, in 2 categories.
        assert_eq!(summary.processes, 12);
        assert_eq!(summary.bins, 2);
        assert_relative_eq!(summary.observed_rate, 110.0);

        // ggH125 template has integral 3 in each category, scaled by xsec(125) = 2.
        let ggh125 = cb.cp().process(&["ggH"]).mass(&["125"]).materialize();
        assert_relative_eq!(ggh125.rate(), 12.0);
        // xsec(120) = 1.5.
        let ggh120 = cb.cp().process(&["ggH"]).mass(&["120"]).materialize();
        assert_relative_eq!(ggh120.rate(), 2.0 * 3.0 * 1.5);

        assert!(summary.bbb_added > 0);
        assert_eq!(summary.systematics_dropped, 1);
        assert!(!cb.syst_name_set().contains("CMS_htt_QCD_norm"));
        assert!(cb.bin_set().contains("htt_mt_1_8TeV"));
        assert!(cb.processes().iter().all(|p| p.pdf.is_some()));
    }
}
