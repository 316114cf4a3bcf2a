//! Parallel campaign driver: partitions the enumeration into chunks, runs a fixed pool of worker
//! threads over a shared work queue via `thread::scope` + `mpsc`, merges partials on the calling
//! thread, and checkpoints periodically.
//!
//! Unlike the project's own multi-role data-provider/decider rebalancing (needed there because
//! generating a batch is itself an expensive incremental operation), chunk generation here is
//! `O(1)` closed-form index arithmetic (see [`crate::enumerator`]), so every worker is a uniform
//! simulate-and-report thread; no producer/consumer split is necessary.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread;

use crate::aggregator::Aggregator;
use crate::checkpoint;
use crate::config::Config;
use crate::encoder::decode;
use crate::enumerator::{EnumerationMode, Enumerator};
use crate::error::CtmResult;
use crate::filters::{CycleTwo, Escapee, RuntimeFilter};
use crate::reporter::Reporter;
use crate::simulator::{self, SimulationOutcome};

/// Runs one campaign end to end: resumes from an existing checkpoint if present, simulates the
/// remaining machines across a worker pool, applies the completion rules appropriate for the
/// enumeration mode, and normalises the final distribution. Returns the finished [`Aggregator`].
pub fn run_campaign(config: &Config) -> CtmResult<Aggregator> {
    run_campaign_with_shutdown(config, &AtomicBool::new(false))
}

/// As [`run_campaign`], but cooperatively stops early if `shutdown` is set to `true` from another
/// thread. Whatever has been merged so far is still checkpointed before returning.
pub fn run_campaign_with_shutdown(config: &Config, shutdown: &AtomicBool) -> CtmResult<Aggregator> {
    let mode = if config.use_reduced_enum() {
        EnumerationMode::Reduced
    } else {
        EnumerationMode::Raw
    };
    let enumerator = Enumerator::new(config.n_states(), mode);

    let mut aggregator = if checkpoint::exists(config.checkpoint_file()) {
        match checkpoint::load(config.checkpoint_file(), config.n_states()) {
            Ok(resumed) => resumed,
            Err(_) => Aggregator::new(config.n_states()),
        }
    } else {
        Aggregator::new(config.n_states())
    };
    let already_processed = aggregator.total_processed_raw() as u128;

    let limit = config.limit();
    let skip = already_processed;
    let mut chunks = enumerator.chunks(config.batch_size(), skip);
    if let Some(limit) = limit {
        chunks = cap_chunks_to_limit(chunks, limit.saturating_sub(already_processed.min(limit)));
    }

    let queue: Mutex<VecDeque<Range<u128>>> = Mutex::new(chunks.into_iter().collect());
    let (result_tx, result_rx) = mpsc::channel::<Aggregator>();
    let n_states = config.n_states();
    let blank = config.blank_symbol();
    let max_steps = config.max_steps();
    let workers = config.worker_count();
    let checkpoint_interval = config.checkpoint_interval().max(1);

    thread::scope(|scope| {
        for _ in 0..workers {
            let queue = &queue;
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                loop {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    let chunk = {
                        let mut q = queue.lock().expect("work queue poisoned");
                        q.pop_front()
                    };
                    let Some(chunk) = chunk else { break };
                    let mut partial = Aggregator::new(n_states);
                    for index in chunk {
                        let outcome = simulate_one(index, n_states, blank, max_steps);
                        partial.record_one(&outcome);
                    }
                    if result_tx.send(partial).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut reporter = Reporter::new_default(enumerator.size());
        let mut last_checkpoint_quotient = already_processed / checkpoint_interval as u128;
        while let Ok(partial) = result_rx.recv() {
            aggregator.merge_batch(&partial);

            let quotient = aggregator.total_processed_raw() as u128 / checkpoint_interval as u128;
            if quotient > last_checkpoint_quotient {
                last_checkpoint_quotient = quotient;
                let _ = checkpoint::save(&aggregator, config.checkpoint_file(), true);
            }
            if reporter.is_due_progress() {
                println!("{}", reporter.report_with_aggregator(&aggregator));
            }
        }
    });

    let total_for_campaign = limit.unwrap_or(enumerator.size());
    match mode {
        EnumerationMode::Raw => aggregator.finalize_raw(),
        EnumerationMode::Reduced => aggregator.apply_completion_rules(total_for_campaign as u64),
    }
    aggregator.calculate_d()?;
    checkpoint::save(&aggregator, config.output_file(), false)?;
    checkpoint::save(&aggregator, config.checkpoint_file(), true)?;
    Ok(aggregator)
}

fn cap_chunks_to_limit(chunks: Vec<Range<u128>>, remaining: u128) -> Vec<Range<u128>> {
    let mut out = Vec::new();
    let mut budget = remaining;
    for chunk in chunks {
        if budget == 0 {
            break;
        }
        let len = chunk.end - chunk.start;
        if len <= budget {
            budget -= len;
            out.push(chunk);
        } else {
            out.push(chunk.start..chunk.start + budget);
            budget = 0;
        }
    }
    out
}

fn simulate_one(
    index: u128,
    n_states: usize,
    blank: crate::encoder::Symbol,
    max_steps: u64,
) -> SimulationOutcome {
    let table = match decode(index, n_states) {
        Ok(table) => table,
        Err(_) => return SimulationOutcome::Filtered("no_halt_transition"),
    };
    if table.has_no_halt_transition() {
        return SimulationOutcome::Filtered("no_halt_transition");
    }
    let filters: Vec<Box<dyn RuntimeFilter>> = vec![
        Box::new(Escapee::new(n_states as u8, blank)),
        Box::new(CycleTwo::new()),
    ];
    simulator::run(&table, blank, max_steps, filters)
}
