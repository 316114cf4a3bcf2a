//! Per-campaign tallies: output frequency counts, non-halting reason counts, and the
//! completion-rule arithmetic that reconstructs full-set tallies from a reduced-enumeration run.

use hashbrown::HashMap;

use crate::enumerator::subspace_size;
use crate::error::{CtmError, CtmResult};
use crate::simulator::SimulationOutcome;

pub const REASON_TIMEOUT: &str = "timeout";

/// Accumulates simulation outcomes for one campaign. `record_one`/`merge_batch` are the hot
/// path; both are commutative and associative so worker-produced partials may be merged in any
/// order (see the parallel driver).
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    n_states: usize,
    output_counts: HashMap<String, u64>,
    non_halting_reasons: HashMap<String, u64>,
    total_processed_raw: u64,
    total_halting_raw: u64,

    // Populated only after `apply_completion_rules` (reduced) or `finalize_raw` (raw).
    effective_output_counts: Option<HashMap<String, u64>>,
    effective_halting: Option<u64>,
    effective_non_halting: Option<u64>,
    effective_total: Option<u64>,
    d_distribution: Option<HashMap<String, f64>>,
}

impl Aggregator {
    pub fn new(n_states: usize) -> Self {
        Self {
            n_states,
            ..Default::default()
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn total_processed_raw(&self) -> u64 {
        self.total_processed_raw
    }

    pub fn total_halting_raw(&self) -> u64 {
        self.total_halting_raw
    }

    pub fn output_counts(&self) -> &HashMap<String, u64> {
        &self.output_counts
    }

    pub fn non_halting_reasons(&self) -> &HashMap<String, u64> {
        &self.non_halting_reasons
    }

    pub fn d_distribution(&self) -> Option<&HashMap<String, f64>> {
        self.d_distribution.as_ref()
    }

    pub fn effective_output_counts(&self) -> Option<&HashMap<String, u64>> {
        self.effective_output_counts.as_ref()
    }

    pub fn effective_halting(&self) -> Option<u64> {
        self.effective_halting
    }

    pub fn effective_non_halting(&self) -> Option<u64> {
        self.effective_non_halting
    }

    pub fn effective_total(&self) -> Option<u64> {
        self.effective_total
    }

    /// Records one simulation outcome.
    pub fn record_one(&mut self, outcome: &SimulationOutcome) {
        self.total_processed_raw += 1;
        match outcome {
            SimulationOutcome::Halted(output) => {
                self.total_halting_raw += 1;
                *self.output_counts.entry(output.clone()).or_insert(0) += 1;
            }
            SimulationOutcome::Timeout => {
                *self
                    .non_halting_reasons
                    .entry(REASON_TIMEOUT.to_string())
                    .or_insert(0) += 1;
            }
            SimulationOutcome::Filtered(reason) => {
                *self
                    .non_halting_reasons
                    .entry((*reason).to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    /// Merges a worker-produced partial into this aggregator. Associative and commutative.
    pub fn merge_batch(&mut self, partial: &Aggregator) {
        self.total_processed_raw += partial.total_processed_raw;
        self.total_halting_raw += partial.total_halting_raw;
        for (k, v) in &partial.output_counts {
            *self.output_counts.entry(k.clone()).or_insert(0) += v;
        }
        for (k, v) in &partial.non_halting_reasons {
            *self.non_halting_reasons.entry(k.clone()).or_insert(0) += v;
        }
    }

    fn non_halting_total(&self) -> u64 {
        self.non_halting_reasons.values().sum()
    }

    /// P3: `total_processed_raw = total_halting_raw + sum(non_halting_reasons)`.
    pub fn invariant_totals_hold(&self) -> bool {
        self.total_processed_raw == self.total_halting_raw + self.non_halting_total()
    }

    /// Applies the four completion rules for reduced enumeration. `m_red` is the size of the
    /// reduced set that was actually simulated (`total_processed_raw` for a completed reduced
    /// campaign). No-op precondition: call only once, after enumeration for a reduced campaign
    /// has finished.
    pub fn apply_completion_rules(&mut self, m_red: u64) {
        let mut counts = self.output_counts.clone();
        let mut non_halting = self.non_halting_total();

        // 1. Right-left reflection.
        let reflected: Vec<(String, u64)> = counts
            .iter()
            .map(|(s, c)| (reverse(s), *c))
            .collect();
        for (s, c) in reflected {
            *counts.entry(s).or_insert(0) += c;
        }
        non_halting *= 2;

        // 2. Trivial initial halts.
        let subspace = if self.n_states > 1 {
            m_red / (2 * (self.n_states as u64 - 1))
        } else {
            0
        };
        *counts.entry("0".to_string()).or_insert(0) += subspace;
        *counts.entry("1".to_string()).or_insert(0) += subspace;

        // 3. Initial self-transitions.
        non_halting += 4 * subspace;

        // 4. Blank-symbol complement.
        let complemented: Vec<(String, u64)> = counts
            .iter()
            .map(|(s, c)| (complement(s), *c))
            .collect();
        for (s, c) in complemented {
            *counts.entry(s).or_insert(0) += c;
        }
        non_halting *= 2;

        let effective_halting: u64 = counts.values().sum();
        let effective_total = effective_halting + non_halting;

        self.effective_output_counts = Some(counts);
        self.effective_halting = Some(effective_halting);
        self.effective_non_halting = Some(non_halting);
        self.effective_total = Some(effective_total);
    }

    /// Raw-enumeration path: the effective counts are simply the raw counts, no arithmetic.
    pub fn finalize_raw(&mut self) {
        self.effective_output_counts = Some(self.output_counts.clone());
        self.effective_halting = Some(self.total_halting_raw);
        self.effective_non_halting = Some(self.non_halting_total());
        self.effective_total = Some(self.total_processed_raw);
    }

    /// `D[s] = effective_output_counts[s] / effective_halting`. Fails with `EmptyDistribution`
    /// when the denominator is zero. Call after `apply_completion_rules` or `finalize_raw`.
    pub fn calculate_d(&mut self) -> CtmResult<()> {
        let counts = self
            .effective_output_counts
            .as_ref()
            .ok_or(CtmError::EmptyDistribution)?;
        let halting = self.effective_halting.unwrap_or(0);
        if halting == 0 {
            return Err(CtmError::EmptyDistribution);
        }
        let d = counts
            .iter()
            .map(|(s, c)| (s.clone(), *c as f64 / halting as f64))
            .collect();
        self.d_distribution = Some(d);
        Ok(())
    }
}

fn reverse(s: &str) -> String {
    s.chars().rev().collect()
}

fn complement(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '0' => '1',
            '1' => '0',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_one_updates_counters_and_holds_invariant() {
        let mut agg = Aggregator::new(2);
        agg.record_one(&SimulationOutcome::Halted("1".to_string()));
        agg.record_one(&SimulationOutcome::Timeout);
        agg.record_one(&SimulationOutcome::Filtered("escapee"));
        assert_eq!(agg.total_processed_raw(), 3);
        assert_eq!(agg.total_halting_raw(), 1);
        assert!(agg.invariant_totals_hold());
    }

    #[test]
    fn merge_is_associative_and_commutative() {
        let mut a = Aggregator::new(1);
        a.record_one(&SimulationOutcome::Halted("0".to_string()));
        let mut b = Aggregator::new(1);
        b.record_one(&SimulationOutcome::Halted("1".to_string()));
        let mut c = Aggregator::new(1);
        c.record_one(&SimulationOutcome::Timeout);

        let mut order1 = Aggregator::new(1);
        order1.merge_batch(&a);
        order1.merge_batch(&b);
        order1.merge_batch(&c);

        let mut order2 = Aggregator::new(1);
        order2.merge_batch(&c);
        order2.merge_batch(&b);
        order2.merge_batch(&a);

        assert_eq!(order1.total_processed_raw(), order2.total_processed_raw());
        assert_eq!(order1.total_halting_raw(), order2.total_halting_raw());
        let mut counts1: Vec<_> = order1.output_counts().iter().collect();
        let mut counts2: Vec<_> = order2.output_counts().iter().collect();
        counts1.sort();
        counts2.sort();
        assert_eq!(counts1, counts2);
    }

    #[test]
    fn completion_arithmetic_matches_worked_example() {
        // n=2, raw output_counts = {"0": 1}, non_halting = 0, M_red = 4.
        let mut agg = Aggregator::new(2);
        agg.record_one(&SimulationOutcome::Halted("0".to_string()));
        agg.apply_completion_rules(4);
        let counts = agg.effective_output_counts().unwrap();
        assert_eq!(counts.get("0"), Some(&6));
        assert_eq!(counts.get("1"), Some(&6));
        assert_eq!(agg.effective_halting(), Some(12));
        assert_eq!(agg.effective_non_halting(), Some(16));
        assert_eq!(agg.effective_total(), Some(28));
        agg.calculate_d().unwrap();
        let d = agg.d_distribution().unwrap();
        assert_eq!(d.get("0"), Some(&0.5));
        assert_eq!(d.get("1"), Some(&0.5));
    }

    #[test]
    fn calculate_d_sums_to_one() {
        let mut agg = Aggregator::new(1);
        agg.record_one(&SimulationOutcome::Halted("".to_string()));
        agg.record_one(&SimulationOutcome::Halted("1".to_string()));
        agg.record_one(&SimulationOutcome::Halted("1".to_string()));
        agg.finalize_raw();
        agg.calculate_d().unwrap();
        let total: f64 = agg.d_distribution().unwrap().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn calculate_d_fails_when_no_halting_machines() {
        let mut agg = Aggregator::new(1);
        agg.record_one(&SimulationOutcome::Timeout);
        agg.finalize_raw();
        assert!(matches!(agg.calculate_d(), Err(CtmError::EmptyDistribution)));
    }

    #[test]
    fn completion_rule_symmetry_reverse_and_complement() {
        let mut agg = Aggregator::new(3);
        agg.record_one(&SimulationOutcome::Halted("01".to_string()));
        let m_red = subspace_size(3) as u64 * 2 * (3 - 1);
        agg.apply_completion_rules(m_red);
        let counts = agg.effective_output_counts().unwrap().clone();
        for (s, c) in counts.iter() {
            let rev = reverse(s);
            let comp = complement(s);
            assert_eq!(counts.get(&rev), Some(c), "reverse of {s} missing or unequal");
            assert_eq!(counts.get(&comp), Some(c), "complement of {s} missing or unequal");
        }
    }
}
