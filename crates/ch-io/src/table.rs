//! Lookup tables: piecewise-linear functions read from whitespace-separated text.
//!
//! Table format: the first non-comment line names the columns, every following
//! non-comment line holds one row of numbers. Lines starting with `#` are ignored.
//!
//! ```text
//! mH    xsec    br
//! 120   19.27   0.0698
//! 125   17.50   0.0627
//! ```

use std::fs;
use std::path::Path;

use ch_core::{Error, Result};

/// A piecewise-linear function through sorted `(x, y)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Graph {
    /// Build from points in any order.
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::Validation("graph requires at least one point".into()));
        }
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(Error::Validation("graph points must be finite".into()));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (x, y) = points.into_iter().unzip();
        Ok(Self { x, y })
    }

    /// Read columns `x_col` and `y_col` from a table file.
    pub fn from_table(path: impl AsRef<Path>, x_col: &str, y_col: &str) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_table_str(&text, x_col, y_col)
            .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))
    }

    /// Parse columns `x_col` and `y_col` from table text.
    pub fn from_table_str(text: &str, x_col: &str, y_col: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (_, header) = lines.next().ok_or_else(|| Error::Parse("empty table".into()))?;
        let columns: Vec<&str> = header.split_whitespace().collect();
        let column = |name: &str| {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or_else(|| Error::Parse(format!("column '{}' not in header {:?}", name, columns)))
        };
        let (ix, iy) = (column(x_col)?, column(y_col)?);

        let mut points = Vec::new();
        for (line_no, line) in lines {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != columns.len() {
                return Err(Error::Parse(format!(
                    "line {}: expected {} columns, found {}",
                    line_no,
                    columns.len(),
                    fields.len()
                )));
            }
            let parse = |s: &str| {
                s.parse::<f64>()
                    .map_err(|e| Error::Parse(format!("line {}: '{}': {}", line_no, s, e)))
            };
            points.push((parse(fields[ix])?, parse(fields[iy])?));
        }
        Self::new(points)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false: a graph holds at least one point.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Evaluate by linear interpolation, extrapolating linearly from the end segments.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        if n == 1 {
            return self.y[0];
        }
        // Index of the left point of the segment used for interpolation.
        let i = self.x.partition_point(|&xi| xi <= x).clamp(1, n - 1) - 1;
        let (x0, x1, y0, y1) = (self.x[i], self.x[i + 1], self.y[i], self.y[i + 1]);
        if x1 == x0 {
            return y0;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}
