//! Atomic JSON persistence and restore of [`Aggregator`] state — the checkpoint and final
//! distribution file share one schema (§6): `raw=true` exports carry only the raw counters
//! (used mid-campaign, for resume), `raw=false` exports also carry the completion-rule output
//! and `D_distribution` (the final artifact).

use std::fs;
use std::io::Write;
use std::path::Path;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::aggregator::Aggregator;
use crate::error::{CtmError, CtmResult};

#[derive(Debug, Serialize, Deserialize, Default)]
struct DistributionFile {
    #[serde(default)]
    num_states: usize,
    #[serde(default)]
    total_processed_raw: u64,
    #[serde(default)]
    total_halting_raw: u64,
    #[serde(default)]
    non_halting_reasons: HashMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_counts: Option<HashMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effective_output_counts: Option<HashMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effective_halting: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effective_non_halting: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effective_total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "D_distribution")]
    d_distribution: Option<HashMap<String, f64>>,
}

impl From<&Aggregator> for DistributionFile {
    fn from(agg: &Aggregator) -> Self {
        Self {
            num_states: agg.n_states(),
            total_processed_raw: agg.total_processed_raw(),
            total_halting_raw: agg.total_halting_raw(),
            non_halting_reasons: agg.non_halting_reasons().clone(),
            output_counts: Some(agg.output_counts().clone()),
            effective_output_counts: agg.effective_output_counts().cloned(),
            effective_halting: agg.effective_halting(),
            effective_non_halting: agg.effective_non_halting(),
            effective_total: agg.effective_total(),
            d_distribution: agg.d_distribution().cloned(),
        }
    }
}

/// Writes `aggregator` to `path` via the atomic write protocol: write to a temp file in the
/// same directory, `fsync`, then `rename` over the destination. `raw=true` omits the
/// completion-rule/D fields even if they have been computed (checkpoint use); `raw=false`
/// includes everything currently present (final export).
pub fn save(aggregator: &Aggregator, path: &Path, raw: bool) -> CtmResult<()> {
    let mut file: DistributionFile = aggregator.into();
    if raw {
        file.effective_output_counts = None;
        file.effective_halting = None;
        file.effective_non_halting = None;
        file.effective_total = None;
        file.d_distribution = None;
    }
    let json = serde_json::to_string_pretty(&file)?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp_path = match dir {
        Some(dir) => dir.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        )),
        None => std::path::PathBuf::from(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        )),
    };

    let mut tmp_file = fs::File::create(&tmp_path)?;
    tmp_file.write_all(json.as_bytes())?;
    tmp_file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Loads a checkpoint/distribution file, rejecting a schema mismatch or a `num_states`
/// disagreement with `expected_n_states`.
pub fn load(path: &Path, expected_n_states: usize) -> CtmResult<Aggregator> {
    let content = fs::read_to_string(path)?;
    let file: DistributionFile = serde_json::from_str(&content)?;
    if file.num_states != expected_n_states {
        return Err(CtmError::InvalidCheckpoint(format!(
            "checkpoint num_states={} does not match campaign n_states={expected_n_states}",
            file.num_states
        )));
    }

    let mut aggregator = Aggregator::new(file.num_states);
    for (output, count) in file.output_counts.unwrap_or_default() {
        // Re-inflate raw counters one result at a time through record_one so the invariants
        // (total_processed_raw, total_halting_raw) are rebuilt consistently rather than poked
        // in directly.
        for _ in 0..count {
            aggregator.record_one(&crate::simulator::SimulationOutcome::Halted(output.clone()));
        }
    }
    for (reason, count) in &file.non_halting_reasons {
        for _ in 0..*count {
            let outcome = if reason == crate::aggregator::REASON_TIMEOUT {
                crate::simulator::SimulationOutcome::Timeout
            } else {
                crate::simulator::SimulationOutcome::Filtered(leak_reason(reason))
            };
            aggregator.record_one(&outcome);
        }
    }
    Ok(aggregator)
}

/// `Filtered` carries a `&'static str`; reasons loaded back from JSON are owned `String`s, so we
/// intern the handful of known reason names rather than leaking arbitrary strings.
fn leak_reason(reason: &str) -> &'static str {
    match reason {
        "no_halt_transition" => "no_halt_transition",
        "escapee" => "escapee",
        "cycle_two" => "cycle_two",
        _ => "unknown",
    }
}

/// True iff a checkpoint file exists at `path`.
pub fn exists(path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulationOutcome;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("ctm_estimator_test_{name}_{}.json", std::process::id()));
        p
    }

    #[test]
    fn save_then_load_round_trips_raw_counters() {
        let mut agg = Aggregator::new(1);
        agg.record_one(&SimulationOutcome::Halted("1".to_string()));
        agg.record_one(&SimulationOutcome::Halted("1".to_string()));
        agg.record_one(&SimulationOutcome::Timeout);
        agg.record_one(&SimulationOutcome::Filtered("escapee"));

        let path = temp_path("roundtrip");
        save(&agg, &path, true).unwrap();
        let loaded = load(&path, 1).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.total_processed_raw(), agg.total_processed_raw());
        assert_eq!(loaded.total_halting_raw(), agg.total_halting_raw());
        assert_eq!(loaded.output_counts(), agg.output_counts());
        assert_eq!(loaded.non_halting_reasons(), agg.non_halting_reasons());
    }

    #[test]
    fn load_rejects_num_states_mismatch() {
        let agg = Aggregator::new(2);
        let path = temp_path("mismatch");
        save(&agg, &path, true).unwrap();
        let result = load(&path, 3);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(CtmError::InvalidCheckpoint(_))));
    }

    #[test]
    fn raw_export_omits_effective_fields() {
        let mut agg = Aggregator::new(1);
        agg.record_one(&SimulationOutcome::Halted("".to_string()));
        agg.finalize_raw();
        agg.calculate_d().unwrap();

        let path = temp_path("raw_omits");
        save(&agg, &path, true).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!(!content.contains("D_distribution"));
    }
}
