//! Named collections of opaque model objects (pdfs, datasets).

use std::collections::BTreeMap;

use ch_core::{Error, ModelObject, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A model object described only by its class and a flat parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericObject {
    /// Object name.
    pub name: String,
    /// Class name.
    pub class_name: String,
    /// Named numeric parameters.
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl GenericObject {
    /// Create an object with no parameters.
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self { name: name.into(), class_name: class_name.into(), params: BTreeMap::new() }
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

impl ModelObject for GenericObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn clone_object(&self) -> Box<dyn ModelObject> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Deserialize)]
struct WorkspaceData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    objects: Vec<GenericObject>,
}

/// A named workspace. Cloning deep-copies every contained object.
#[derive(Debug, Clone)]
pub struct Workspace {
    name: String,
    objects: BTreeMap<String, Box<dyn ModelObject>>,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), objects: BTreeMap::new() }
    }

    pub(crate) fn from_payload(fallback_name: &str, payload: &Map<String, Value>) -> Result<Self> {
        let data: WorkspaceData = serde_json::from_value(Value::Object(payload.clone()))?;
        let mut ws = Workspace::new(data.name.unwrap_or_else(|| fallback_name.to_string()));
        for obj in data.objects {
            ws.insert(Box::new(obj));
        }
        Ok(ws)
    }

    /// Workspace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert an object under its own name, replacing any previous object.
    pub fn insert(&mut self, object: Box<dyn ModelObject>) {
        self.objects.insert(object.name().to_string(), object);
    }

    /// Borrow an object.
    pub fn get(&self, name: &str) -> Option<&dyn ModelObject> {
        self.objects.get(name).map(|o| o.as_ref())
    }

    /// Deep copy of the object called `name`.
    pub fn clone_object(&self, name: &str) -> Result<Box<dyn ModelObject>> {
        self.objects.get(name).map(|o| o.clone_object()).ok_or_else(|| {
            Error::NotFound(format!("object '{}' not found in workspace '{}'", name, self.name))
        })
    }

    /// Object names in sorted order.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(|k| k.as_str())
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the workspace holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_object() {
        let mut ws = Workspace::new("w");
        ws.insert(Box::new(GenericObject::new("sig_pdf", "RooGaussian").with_param("mean", 125.0)));
        let obj = ws.clone_object("sig_pdf").unwrap();
        assert_eq!(obj.class_name(), "RooGaussian");
        assert!(matches!(ws.clone_object("bkg_pdf"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_from_payload_uses_fallback_name() {
        let payload: Map<String, Value> = serde_json::from_str(
            r#"{"objects":[{"name":"a","class_name":"RooDataHist"}]}"#,
        )
        .unwrap();
        let ws = Workspace::from_payload("w_fallback", &payload).unwrap();
        assert_eq!(ws.name(), "w_fallback");
        assert_eq!(ws.object_names().collect::<Vec<_>>(), vec!["a"]);
    }
}
