//! `K_m(s) = -log2(D(n,m)(s))`: the consumer-facing complexity estimator, built once from a
//! distribution and then queried many times.

use std::path::Path;

use hashbrown::HashMap;

use crate::error::CtmResult;

/// Precomputed `-log2` transform of a `D` distribution, with ranking support.
pub struct KolmogorovComplexityEstimator {
    k: HashMap<String, f64>,
}

impl KolmogorovComplexityEstimator {
    /// Builds the estimator from an in-memory distribution.
    pub fn from_distribution(d: &HashMap<String, f64>) -> Self {
        let k = d
            .iter()
            .filter(|(_, p)| **p > 0.0)
            .map(|(s, p)| (s.clone(), -p.log2()))
            .collect();
        Self { k }
    }

    /// Loads a distribution file (the `D_distribution` field of a checkpoint/distribution JSON)
    /// and builds the estimator from it.
    pub fn from_file(path: &Path, n_states: usize) -> CtmResult<Self> {
        let aggregator = crate::checkpoint::load(path, n_states)?;
        let d = aggregator
            .d_distribution()
            .cloned()
            .unwrap_or_default();
        Ok(Self::from_distribution(&d))
    }

    /// `K[s]`, or `+inf` if `s` is unknown or has zero probability in the source distribution.
    pub fn estimate(&self, s: &str) -> f64 {
        self.k.get(s).copied().unwrap_or(f64::INFINITY)
    }

    /// The `top_n` simplest strings (lowest `K`), sorted ascending with a stable tie-break on
    /// the string itself for determinism. `None` returns every known string.
    pub fn ranked(&self, top_n: Option<usize>) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self.k.iter().map(|(s, k)| (s.clone(), *k)).collect();
        entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        if let Some(n) = top_n {
            entries.truncate(n);
        }
        entries
    }
}
