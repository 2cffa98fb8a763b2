//! Equal-width histograms for marginal distributions.

use serde::{Deserialize, Serialize};

use super::{finite, StatsError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `counts.len() + 1` ascending bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// (lower edge, upper edge, count) per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(e, &c)| (e[0], e[1], c))
    }
}

/// Bin the finite values into `bins` equal-width buckets spanning
/// [min, max]. The last bucket is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> Result<Histogram, StatsError> {
    if bins == 0 {
        return Err(StatsError::InvalidArgument("bins must be >= 1".into()));
    }
    let values = finite(values);
    if values.is_empty() {
        return Err(StatsError::TooFewObservations { needed: 1, got: 0 });
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(Histogram { edges, counts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_value_once() {
        let h = histogram(&[0.0, 0.1, 0.5, 0.9, 1.0, f64::NAN], 2).unwrap();
        assert_eq!(h.counts, vec![2, 3]);
        assert_eq!(h.total(), 5);
        assert_eq!(h.edges.len(), 3);
    }

    #[test]
    fn infinite_values_are_ignored() {
        let h = histogram(&[0.0, 1.0, f64::INFINITY, f64::NEG_INFINITY], 2).unwrap();
        assert_eq!(h.edges, vec![0.0, 0.5, 1.0]);
        assert_eq!(h.counts, vec![1, 1]);
        assert!(histogram(&[f64::INFINITY], 2).is_err());
    }

    #[test]
    fn constant_input_gets_a_unit_wide_bin() {
        let h = histogram(&[4.0, 4.0], 1).unwrap();
        assert_eq!(h.edges, vec![3.5, 4.5]);
        assert_eq!(h.counts, vec![2]);
    }

    #[test]
    fn zero_bins_is_an_error() {
        assert!(histogram(&[1.0], 0).is_err());
        assert!(histogram(&[f64::NAN], 3).is_err());
    }
}
