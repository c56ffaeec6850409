//! JSON shape files: a flat, path-keyed collection of typed objects.
//!
//! ```json
//! {
//!   "objects": {
//!     "muTau_0jet/ZTT":        { "class": "TH1D", "bin_content": [..], "bin_error": [..] },
//!     "muTau_0jet/ZTT_CMS_scale_tUp": { "class": "TH1D", "bin_content": [..] },
//!     "w_htt":                 { "class": "RooWorkspace", "objects": [..] }
//!   }
//! }
//! ```
//!
//! Paths use `/` as directory separator; leading, trailing and doubled separators are
//! ignored on lookup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ch_core::{Error, Histogram, HistogramSource, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workspace::Workspace;

/// Class name written for histograms created in memory.
pub const HISTOGRAM_CLASS: &str = "TH1D";
/// Class name of workspace objects.
pub const WORKSPACE_CLASS: &str = "RooWorkspace";

/// A stored object: its class name plus a class-specific JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    /// Class name (e.g. `TH1D`, `TH1F`, `RooWorkspace`, `TGraph`).
    pub class: String,
    /// Remaining fields, interpreted according to `class`.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl StoredObject {
    /// Whether this object is a one-dimensional histogram.
    pub fn is_histogram(&self) -> bool {
        self.class.starts_with("TH1")
    }
}

/// Public info about a stored object (for `list_keys()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Full object path.
    pub name: String,
    /// Class name.
    pub class_name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ShapeFileData {
    #[serde(default)]
    objects: BTreeMap<String, StoredObject>,
}

/// An opened shape file.
#[derive(Debug, Clone)]
pub struct ShapeFile {
    path: PathBuf,
    objects: BTreeMap<String, StoredObject>,
}

impl ShapeFile {
    /// Open and parse a shape file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path)?;
        let data: ShapeFileData = serde_json::from_str(&text)?;
        let objects = data.objects.into_iter().map(|(k, v)| (normalize_path(&k), v)).collect();
        log::debug!("opened shape file {}", path.display());
        Ok(Self { path, objects })
    }

    /// An empty in-memory shape file; `path` is only used for naming.
    pub fn in_memory(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), objects: BTreeMap::new() }
    }

    /// Path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a histogram at `path`, replacing whatever was there.
    pub fn insert_histogram(&mut self, path: &str, hist: &Histogram) -> Result<()> {
        let payload = match serde_json::to_value(hist)? {
            Value::Object(m) => m,
            _ => return Err(Error::Validation("histogram did not serialize to an object".into())),
        };
        self.insert_object(path, StoredObject { class: HISTOGRAM_CLASS.to_string(), payload });
        Ok(())
    }

    /// Store an arbitrary object at `path`, replacing whatever was there.
    pub fn insert_object(&mut self, path: &str, object: StoredObject) {
        self.objects.insert(normalize_path(path), object);
    }

    /// Write the file back to disk as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = ShapeFileData { objects: self.objects.clone() };
        fs::write(path, serde_json::to_string_pretty(&data)?)?;
        Ok(())
    }

    /// List every stored object.
    pub fn list_keys(&self) -> Vec<KeyInfo> {
        self.objects
            .iter()
            .map(|(name, o)| KeyInfo { name: name.clone(), class_name: o.class.clone() })
            .collect()
    }

    /// Look up the raw object at `path`.
    pub fn get_object(&self, path: &str) -> Result<&StoredObject> {
        self.objects.get(&normalize_path(path)).ok_or_else(|| {
            Error::NotFound(format!("object '{}' not found in {}", path, self.path.display()))
        })
    }

    /// Get a workspace by its path.
    pub fn get_workspace(&self, path: &str) -> Result<Workspace> {
        let obj = self.get_object(path)?;
        if obj.class != WORKSPACE_CLASS {
            return Err(self.wrong_type(path, WORKSPACE_CLASS, &obj.class));
        }
        let fallback = path.rsplit('/').next().unwrap_or(path);
        Workspace::from_payload(fallback, &obj.payload)
    }

    fn wrong_type(&self, path: &str, expected: &str, found: &str) -> Error {
        Error::WrongType {
            path: path.to_string(),
            source_name: self.path.display().to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl HistogramSource for ShapeFile {
    fn source_name(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }

    fn get_histogram(&self, path: &str) -> Result<Histogram> {
        let obj = self.get_object(path)?;
        if !obj.is_histogram() {
            return Err(self.wrong_type(path, "TH1", &obj.class));
        }
        let mut hist: Histogram = serde_json::from_value(Value::Object(obj.payload.clone()))
            .map_err(|e| {
                Error::Validation(format!(
                    "histogram '{}' in {}: {}",
                    path,
                    self.path.display(),
                    e
                ))
            })?;
        if hist.name().is_empty() {
            let key = normalize_path(path);
            hist.set_name(key.rsplit('/').next().unwrap_or(&key));
        }
        Ok(hist)
    }
}

fn normalize_path(path: &str) -> String {
    path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("/")
}
