//! One-dimensional binned histogram value type.
//!
//! Bins are indexed from `0` to `n_bins() - 1`; under/overflow is not stored.
//! Statistical errors follow the ROOT convention: when per-bin sums of squared
//! weights (`sumw2`) are present the error is `sqrt(sumw2)`, otherwise it is
//! `sqrt(|content|)`. Setting an error or scaling the histogram materialises `sumw2`.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A 1D histogram owned by a single record.
///
/// `Clone` is always a deep copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HistogramData", into = "HistogramData")]
pub struct Histogram {
    name: String,
    bin_edges: Vec<f64>,
    bin_content: Vec<f64>,
    sumw2: Option<Vec<f64>>,
}

/// Serialized form. Accepts either `bin_error` or `sumw2`; `bin_edges` defaults to
/// unit-width bins starting at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistogramData {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bin_edges: Option<Vec<f64>>,
    bin_content: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bin_error: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sumw2: Option<Vec<f64>>,
}

impl TryFrom<HistogramData> for Histogram {
    type Error = Error;

    fn try_from(data: HistogramData) -> Result<Self> {
        let n = data.bin_content.len();
        let edges = data.bin_edges.unwrap_or_else(|| unit_edges(n));
        let mut h = Histogram::new(data.name, edges, data.bin_content)?;
        match (data.sumw2, data.bin_error) {
            (Some(_), Some(_)) => {
                return Err(Error::Validation(format!(
                    "histogram '{}' specifies both sumw2 and bin_error",
                    h.name
                )));
            }
            (Some(sw2), None) => {
                check_len(&h.name, "sumw2", sw2.len(), n)?;
                h.sumw2 = Some(sw2);
            }
            (None, Some(err)) => {
                check_len(&h.name, "bin_error", err.len(), n)?;
                h.sumw2 = Some(err.iter().map(|e| e * e).collect());
            }
            (None, None) => {}
        }
        Ok(h)
    }
}

impl From<Histogram> for HistogramData {
    fn from(h: Histogram) -> Self {
        HistogramData {
            name: h.name,
            bin_edges: Some(h.bin_edges),
            bin_content: h.bin_content,
            bin_error: None,
            sumw2: h.sumw2,
        }
    }
}

fn unit_edges(n: usize) -> Vec<f64> {
    (0..=n).map(|i| i as f64).collect()
}

fn check_len(name: &str, what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(Error::Validation(format!(
            "histogram '{}': {} length mismatch: got={} expected={}",
            name, what, got, expected
        )));
    }
    Ok(())
}

impl Histogram {
    /// Create a histogram from explicit bin edges and contents (no stored errors).
    pub fn new(name: impl Into<String>, bin_edges: Vec<f64>, bin_content: Vec<f64>) -> Result<Self> {
        let name = name.into();
        check_len(&name, "bin_edges", bin_edges.len(), bin_content.len() + 1)?;
        if bin_edges.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(Error::Validation(format!(
                "histogram '{}': bin edges must be strictly increasing",
                name
            )));
        }
        Ok(Self { name, bin_edges, bin_content, sumw2: None })
    }

    /// Create an empty histogram with `n_bins` equal-width bins on `[x_min, x_max)`.
    pub fn uniform(name: impl Into<String>, n_bins: usize, x_min: f64, x_max: f64) -> Result<Self> {
        if n_bins == 0 || !(x_max > x_min) {
            return Err(Error::Validation(format!(
                "uniform binning requires n_bins > 0 and x_max > x_min (got {} bins on [{}, {}))",
                n_bins, x_min, x_max
            )));
        }
        let width = (x_max - x_min) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| x_min + width * i as f64).collect();
        edges.push(x_max);
        Self::new(name, edges, vec![0.0; n_bins])
    }

    /// Create a histogram with unit-width bins from contents and absolute errors.
    pub fn from_contents(
        name: impl Into<String>,
        bin_content: Vec<f64>,
        bin_error: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        check_len(&name, "bin_error", bin_error.len(), bin_content.len())?;
        let edges = unit_edges(bin_content.len());
        let mut h = Self::new(name, edges, bin_content)?;
        h.sumw2 = Some(bin_error.iter().map(|e| e * e).collect());
        Ok(h)
    }

    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the histogram.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of bins (excluding under/overflow).
    pub fn n_bins(&self) -> usize {
        self.bin_content.len()
    }

    /// Bin edges (length = `n_bins() + 1`).
    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// All bin contents.
    pub fn contents(&self) -> &[f64] {
        &self.bin_content
    }

    /// All bin errors.
    pub fn errors(&self) -> Vec<f64> {
        (0..self.n_bins()).map(|i| self.bin_error(i)).collect()
    }

    /// Whether per-bin squared weights are stored.
    pub fn has_sumw2(&self) -> bool {
        self.sumw2.is_some()
    }

    /// Content of bin `i`.
    ///
    /// # Panics
    /// Panics if `i >= n_bins()`.
    pub fn bin_content(&self, i: usize) -> f64 {
        self.bin_content[i]
    }

    /// Set the content of bin `i`. Stored errors are left untouched.
    ///
    /// # Panics
    /// Panics if `i >= n_bins()`.
    pub fn set_bin_content(&mut self, i: usize, value: f64) {
        self.bin_content[i] = value;
    }

    /// Statistical error of bin `i`.
    ///
    /// # Panics
    /// Panics if `i >= n_bins()`.
    pub fn bin_error(&self, i: usize) -> f64 {
        match &self.sumw2 {
            Some(sw2) => sw2[i].max(0.0).sqrt(),
            None => self.bin_content[i].abs().sqrt(),
        }
    }

    /// Set the statistical error of bin `i`.
    ///
    /// # Panics
    /// Panics if `i >= n_bins()`.
    pub fn set_bin_error(&mut self, i: usize, error: f64) {
        let sw2 = self.materialize_sumw2();
        sw2[i] = error * error;
    }

    /// Sum of all bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Multiply contents by `factor` and errors by `|factor|`.
    pub fn scale(&mut self, factor: f64) {
        if factor == 1.0 {
            return;
        }
        let f2 = factor * factor;
        for w2 in self.materialize_sumw2().iter_mut() {
            *w2 *= f2;
        }
        for c in &mut self.bin_content {
            *c *= factor;
        }
    }

    fn materialize_sumw2(&mut self) -> &mut Vec<f64> {
        let contents = &self.bin_content;
        self.sumw2.get_or_insert_with(|| contents.iter().map(|c| c.abs()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_errors_default_to_poisson() {
        let h = Histogram::new("h", vec![0.0, 1.0, 2.0], vec![4.0, 9.0]).unwrap();
        assert!(!h.has_sumw2());
        assert_relative_eq!(h.bin_error(0), 2.0);
        assert_relative_eq!(h.bin_error(1), 3.0);
    }

    #[test]
    fn test_set_error_materializes_sumw2() {
        let mut h = Histogram::new("h", vec![0.0, 1.0, 2.0], vec![4.0, 9.0]).unwrap();
        h.set_bin_error(0, 0.5);
        assert!(h.has_sumw2());
        assert_relative_eq!(h.bin_error(0), 0.5);
        // Untouched bins keep their previous (Poisson) error.
        assert_relative_eq!(h.bin_error(1), 3.0);
    }

    #[test]
    fn test_scale_and_integral() {
        let mut h = Histogram::from_contents("h", vec![10.0, 30.0], vec![1.0, 2.0]).unwrap();
        assert_relative_eq!(h.integral(), 40.0);
        h.scale(0.5);
        assert_relative_eq!(h.integral(), 20.0);
        assert_relative_eq!(h.bin_content(1), 15.0);
        assert_relative_eq!(h.bin_error(1), 1.0);
    }

    #[test]
    fn test_clone_is_deep() {
        let h = Histogram::from_contents("h", vec![1.0], vec![1.0]).unwrap();
        let mut c = h.clone();
        c.set_bin_content(0, 5.0);
        c.set_bin_error(0, 3.0);
        assert_relative_eq!(h.bin_content(0), 1.0);
        assert_relative_eq!(h.bin_error(0), 1.0);
    }

    #[test]
    fn test_uniform_edges() {
        let h = Histogram::uniform("u", 4, 0.0, 2.0).unwrap();
        assert_eq!(h.n_bins(), 4);
        assert_relative_eq!(h.bin_edges()[2], 1.0);
        assert!(Histogram::uniform("bad", 0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_rejects_bad_edges() {
        assert!(Histogram::new("h", vec![0.0, 1.0], vec![1.0, 2.0]).is_err());
        assert!(Histogram::new("h", vec![0.0, 0.0, 1.0], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_deserialize_with_bin_error() {
        let h: Histogram =
            serde_json::from_str(r#"{"name":"x","bin_content":[4.0,1.0],"bin_error":[1.0,0.5]}"#)
                .unwrap();
        assert_eq!(h.bin_edges(), &[0.0, 1.0, 2.0]);
        assert_relative_eq!(h.bin_error(1), 0.5);

        let bad = serde_json::from_str::<Histogram>(r#"{"bin_content":[4.0],"bin_error":[1.0,2.0]}"#);
        assert!(bad.is_err());
    }
}
