//! Cartesian products of axis indices and axis-value helpers.

use ch_core::{Error, Result};

/// Every index tuple `(i0, .., ik-1)` with `0 <= ij < lengths[j]`, last axis
/// varying fastest.
///
/// Any zero length gives no tuples; no axes at all gives the single empty tuple.
///
/// ```
/// use ch_harvester::generate_combinations;
///
/// let c = generate_combinations(&[2, 3]);
/// assert_eq!(c.len(), 6);
/// assert_eq!(c[1], vec![0, 1]);
/// assert_eq!(c[3], vec![1, 0]);
/// ```
pub fn generate_combinations(lengths: &[usize]) -> Vec<Vec<usize>> {
    if lengths.iter().any(|&n| n == 0) {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(lengths.iter().product());
    let mut idx = vec![0usize; lengths.len()];
    loop {
        out.push(idx.clone());
        let mut axis = lengths.len();
        loop {
            if axis == 0 {
                return out;
            }
            axis -= 1;
            idx[axis] += 1;
            if idx[axis] < lengths[axis] {
                break;
            }
            idx[axis] = 0;
        }
    }
}

/// Expand a comma-separated list of values and `lo:hi|step` ranges into strings.
///
/// `"110:120|5,125.5"` gives `["110", "115", "120", "125.5"]`. Integral values are
/// printed without a decimal point. A range without `|step` uses a step of 1.
/// Plain entries are passed through untouched (so `*` is allowed).
pub fn vals_from_range(input: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((lo, rest)) = part.split_once(':') else {
            out.push(part.to_string());
            continue;
        };
        let (hi, step) = match rest.split_once('|') {
            Some((hi, step)) => (hi, parse_number(step, part)?),
            None => (rest, 1.0),
        };
        let (lo, hi) = (parse_number(lo, part)?, parse_number(hi, part)?);
        if !(step > 0.0) {
            return Err(Error::Parse(format!("range '{}': step must be positive", part)));
        }
        if hi < lo {
            return Err(Error::Parse(format!("range '{}': upper edge below lower edge", part)));
        }
        let n = ((hi - lo) / step + 1e-9).floor() as usize;
        out.extend((0..=n).map(|k| format_value(lo + step * k as f64)));
    }
    Ok(out)
}

fn parse_number(s: &str, context: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| Error::Parse(format!("range '{}': '{}': {}", context, s.trim(), e)))
}

fn format_value(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{}", v)
    }
}
