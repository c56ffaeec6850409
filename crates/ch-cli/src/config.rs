//! `ch-cli harvest` configuration (YAML or JSON).

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use ch_harvester::{SystType, vals_from_range};

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Shape file with every template, relative to the config file.
    pub shapes: PathBuf,
    #[serde(default = "default_analysis")]
    pub analysis: String,
    pub eras: Vec<String>,
    pub channels: Vec<String>,
    pub categories: Vec<Category>,
    /// Signal mass points, e.g. `110:145|5`.
    pub masses: String,
    pub backgrounds: Vec<String>,
    #[serde(default)]
    pub signals: Vec<String>,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default)]
    pub systematics: Vec<SystematicConfig>,
    #[serde(default)]
    pub xsec: Vec<XsecConfig>,
    #[serde(default)]
    pub bin_by_bin: Option<BinByBinConfig>,
    /// Rename bins to `$ANALYSIS_$CHANNEL_$BINID_$ERA`.
    #[serde(default)]
    pub standard_bin_names: bool,
    /// File of nuisance names to remove at the end, relative to the config file.
    #[serde(default)]
    pub drop_list: Option<PathBuf>,
    #[serde(default)]
    pub workspace: Option<WorkspaceConfig>,
}

/// Pdfs and datasets taken from a workspace stored in the shape file.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Object path of the workspace inside the shape file.
    pub path: String,
    /// Object name pattern for process pdfs, e.g. `$PROCESS_pdf`.
    #[serde(default)]
    pub pdf_rule: Option<String>,
    /// Object name pattern for observed datasets.
    #[serde(default)]
    pub data_rule: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Template naming patterns.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub background: String,
    pub background_syst: String,
    pub signal: String,
    pub signal_syst: String,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            background: "$BIN/$PROCESS".into(),
            background_syst: "$BIN/$PROCESS_$SYSTEMATIC".into(),
            signal: "$BIN/$PROCESS$MASS".into(),
            signal_syst: "$BIN/$PROCESS$MASS_$SYSTEMATIC".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystematicConfig {
    /// Name pattern, e.g. `lumi_$ERA`.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SystType,
    /// Up value (or the symmetric value).
    #[serde(default = "default_value")]
    pub value: f64,
    /// Down value; makes the nuisance asymmetric.
    #[serde(default)]
    pub value_down: Option<f64>,
    /// Processes it applies to.
    pub processes: Vec<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub eras: Vec<String>,
}

/// Scale process rates by `y(mass)` looked up in a text table.
#[derive(Debug, Clone, Deserialize)]
pub struct XsecConfig {
    pub table: PathBuf,
    pub x: String,
    pub y: String,
    pub processes: Vec<String>,
    #[serde(default)]
    pub eras: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinByBinConfig {
    #[serde(default = "default_add_threshold")]
    pub add_threshold: f64,
    #[serde(default)]
    pub merge_threshold: f64,
    #[serde(default = "default_fix_norm")]
    pub fix_norm: bool,
    /// Background processes to consider; all backgrounds when empty.
    #[serde(default)]
    pub processes: Vec<String>,
}

fn default_analysis() -> String {
    "htt".to_string()
}

fn default_value() -> f64 {
    1.0
}

fn default_add_threshold() -> f64 {
    0.1
}

fn default_fix_norm() -> bool {
    true
}

impl HarvestConfig {
    /// Expanded mass points.
    pub fn mass_points(&self) -> Result<Vec<String>> {
        Ok(vals_from_range(&self.masses)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.eras.is_empty() || self.channels.is_empty() {
            anyhow::bail!("config must list at least one era and one channel");
        }
        if self.categories.is_empty() {
            anyhow::bail!("config must list at least one category");
        }
        for (i, c) in self.categories.iter().enumerate() {
            if self.categories[..i].iter().any(|o| o.name == c.name) {
                anyhow::bail!("duplicate category name: {}", c.name);
            }
        }
        if !self.signals.is_empty() && self.mass_points()?.is_empty() {
            anyhow::bail!("signals given but no mass points in '{}'", self.masses);
        }
        for s in &self.systematics {
            if s.processes.is_empty() {
                anyhow::bail!("systematic {} applies to no process", s.name);
            }
            if !(s.value > 0.0) || s.value_down.is_some_and(|d| !(d > 0.0)) {
                anyhow::bail!("systematic {} must have positive values", s.name);
            }
        }
        if let Some(bbb) = &self.bin_by_bin {
            if !(bbb.add_threshold >= 0.0) {
                anyhow::bail!("bin_by_bin.add_threshold must be >= 0");
            }
            if !(0.0..=1.0).contains(&bbb.merge_threshold) {
                anyhow::bail!("bin_by_bin.merge_threshold must be in [0, 1]");
            }
        }
        Ok(())
    }
}

/// Read and validate a config. Relative paths inside it are resolved against
/// the config file's directory.
pub fn read_harvest_config(path: &Path) -> Result<HarvestConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let mut cfg: HarvestConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        serde_yaml_ng::from_slice(&bytes)?
    };
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    cfg.shapes = base.join(&cfg.shapes);
    for x in &mut cfg.xsec {
        x.table = base.join(&x.table);
    }
    cfg.drop_list = cfg.drop_list.take().map(|d| base.join(d));
    cfg.validate()?;
    Ok(cfg)
}
