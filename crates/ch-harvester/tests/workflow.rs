use approx::assert_relative_eq;
use ch_core::Histogram;
use ch_harvester::{BinByBinFactory, Harvester, STANDARD_BIN_PATTERN, SystType};
use ch_io::ShapeFile;

fn hist(content: &[f64], errors: &[f64]) -> Histogram {
    Histogram::from_contents("", content.to_vec(), errors.to_vec()).unwrap()
}

/// Two categories of a single channel, templates for data, three backgrounds and
/// one signal mass point.
fn shapes() -> ShapeFile {
    let mut f = ShapeFile::in_memory("htt_mt.inputs.json");
    for cat in ["muTau_0jet", "muTau_vbf"] {
        f.insert_histogram(&format!("{}/data_obs", cat), &hist(&[30.0, 20.0, 5.0], &[5.5, 4.5, 2.2]))
            .unwrap();
        f.insert_histogram(&format!("{}/ZTT", cat), &hist(&[20.0, 12.0, 2.0], &[1.0, 0.8, 0.9]))
            .unwrap();
        f.insert_histogram(&format!("{}/W", cat), &hist(&[6.0, 4.0, 1.0], &[1.5, 1.2, 0.8]))
            .unwrap();
        f.insert_histogram(&format!("{}/QCD", cat), &hist(&[3.0, 2.0, 0.0], &[1.0, 1.0, 0.5]))
            .unwrap();
        f.insert_histogram(&format!("{}/ggH125", cat), &hist(&[0.5, 1.5, 1.0], &[0.05, 0.1, 0.1]))
            .unwrap();
        f.insert_histogram(&format!("{}/ZTT_CMS_scale_tUp", cat), &hist(&[21.0, 12.0, 2.0], &[1.0, 0.8, 0.9]))
            .unwrap();
        f.insert_histogram(&format!("{}/ZTT_CMS_scale_tDown", cat), &hist(&[19.0, 12.0, 2.0], &[1.0, 0.8, 0.9]))
            .unwrap();
    }
    f
}

fn build() -> Harvester {
    let cats = [(1, "muTau_0jet"), (5, "muTau_vbf")];
    let mut cb = Harvester::new();
    cb.add_observations(&["*"], &["htt"], &["8TeV"], &["mt"], &cats);
    cb.add_processes(&["*"], &["htt"], &["8TeV"], &["mt"], &["ZTT", "W", "QCD"], &cats, false);
    cb.add_processes(&["125"], &["htt"], &["8TeV"], &["mt"], &["ggH"], &cats, true);

    cb.cp_mut().signals().add_syst("lumi_$ERA", SystType::LnN, |_| Some(1.026));
    cb.cp_mut().process(&["ZTT"]).add_syst("CMS_scale_t", SystType::Shape, |_| Some(1.0));

    let f = shapes();
    cb.cp_mut()
        .backgrounds()
        .extract_shapes(&f, "$BIN/$PROCESS", "$BIN/$PROCESS_$SYSTEMATIC")
        .unwrap();
    cb.cp_mut().signals().extract_shapes(&f, "$BIN/$PROCESS$MASS", "").unwrap();
    cb
}

#[test]
fn full_chain_builds_expected_records() {
    let cb = build();
    assert_eq!(cb.observations().len(), 2);
    assert_eq!(cb.processes().len(), 8);
    assert_eq!(cb.systematics().len(), 4);
    assert_eq!(cb.parameters().count(), 2);
    assert_relative_eq!(cb.observed_rate(), 110.0);
    assert_relative_eq!(cb.cp().bin(&["muTau_vbf"]).signals().materialize().rate(), 3.0);

    let scale = cb.cp().syst_name(&["CMS_scale_t"]).materialize();
    assert!(scale.systematics().iter().all(|n| n.has_shapes()));
    assert_relative_eq!(scale.systematics()[0].value_u, 35.0 / 34.0);
}

#[test]
fn views_are_independent_of_the_source() {
    let cb = build();
    let mut view = cb.cp().bin_id(&[5]).materialize();
    view.cp_mut().for_each_proc(|p| p.rate *= 10.0);
    view.filter_procs(|p| p.id.process == "QCD");
    assert_eq!(cb.processes().len(), 8);
    assert_relative_eq!(cb.cp().bin_id(&[5]).materialize().rate(), 53.0);
}

#[test]
fn view_histograms_are_deep_copies() {
    let cb = build();
    let src_shape = |cb: &Harvester| {
        let h = cb.processes()[0].shape.clone().unwrap();
        (h.contents().to_vec(), h.errors())
    };
    let before = src_shape(&cb);

    let mut view = cb.cp().materialize();
    assert_eq!(view.processes().len(), cb.processes().len());
    assert_eq!(view.systematics().len(), cb.systematics().len());
    view.cp_mut().for_each_proc(|p| {
        if let Some(h) = p.shape.as_mut() {
            h.set_bin_content(0, 99.0);
            h.set_bin_error(1, 7.0);
        }
    });
    view.merge_bin_errors(0.0, 1.0).unwrap();
    assert_relative_eq!(view.processes()[0].shape.as_ref().unwrap().bin_content(0), 99.0);

    assert_eq!(src_shape(&cb), before);
    assert_eq!(cb.processes().len(), 8);
    assert_eq!(cb.systematics().len(), 4);
}

#[test]
fn for_each_proc_edits_in_place() {
    let mut cb = build();
    cb.cp_mut().signals().era(&["8TeV"]).for_each_proc(|p| p.rate *= 0.5);
    assert_relative_eq!(cb.cp().signals().materialize().rate(), 3.0);
    assert_relative_eq!(cb.cp().backgrounds().materialize().rate(), 100.0);
}

#[test]
fn bin_by_bin_from_backgrounds_into_the_store() {
    let mut cb = build();
    let mut bkgs = cb.cp().backgrounds().materialize();
    let bbb = BinByBinFactory::new().with_add_threshold(0.1).with_merge_threshold(0.5);
    let qcd_errors = |cb: &Harvester| -> Vec<Vec<f64>> {
        cb.processes()
            .iter()
            .filter(|p| p.id.process == "QCD")
            .map(|p| p.shape.as_ref().unwrap().errors())
            .collect()
    };
    let before = qcd_errors(&cb);
    let report = bbb.merge_and_add(&mut bkgs, &mut cb).unwrap();
    // Merging happened on the view; the store's templates keep their errors.
    assert_eq!(qcd_errors(&cb), before);
    assert!(qcd_errors(&bkgs).iter().flatten().all(|&e| e == 0.0));
    // QCD's errors are merged into W and ZTT in every histogram bin, leaving
    // W on all three bins and ZTT on its last.
    assert_eq!(report.added, 8);
    assert_eq!(report.inconsistent_bins, 0);

    let names = cb.syst_name_set();
    assert!(names.contains("CMS_muTau_0jet_W_bin_1"));
    assert!(names.contains("CMS_muTau_vbf_ZTT_bin_3"));
    assert!(!names.iter().any(|n| n.contains("_QCD_bin_")));
    // Each created nuisance has exactly one parameter.
    let n_bbb = cb.systematics().iter().filter(|n| n.name.contains("_bin_")).count();
    assert_eq!(cb.parameters().count(), 2 + n_bbb);
}

#[test]
fn standard_bin_names_after_extraction() {
    let mut cb = build();
    cb.set_standard_bin_names(STANDARD_BIN_PATTERN);
    assert_eq!(
        cb.bin_set().into_iter().collect::<Vec<_>>(),
        vec!["htt_mt_1_8TeV".to_string(), "htt_mt_5_8TeV".to_string()]
    );
    assert!(cb.systematics().iter().all(|n| n.id.bin.starts_with("htt_mt_")));
}
