//! Pre-run and runtime filters that let the simulator stop early on machines that provably
//! cannot halt, or are very likely not to.
//!
//! Runtime filters are small stateful objects, one per simulation run, consulted through the
//! shared [`RuntimeFilter`] trait — this generalises the project's own small composable
//! boolean-predicate helpers (see the pre-decider checks) to filters that need to remember
//! something between steps.

use hashbrown::HashSet;
use std::collections::VecDeque;

use crate::encoder::Symbol;
use crate::tape::Tape;

/// A view of the simulator's observable state, passed to filters after each step. Filters read
/// this; they never mutate it.
pub struct TapeView<'a> {
    pub tape: &'a Tape,
    pub state: u8,
}

pub trait RuntimeFilter {
    /// Called once per step, after the step has been applied. Returns true to stop the run.
    fn observe(&mut self, view: &TapeView) -> bool;

    fn name(&self) -> &'static str;
}

/// Fires when the head has crossed more than `n_states` consecutive *fresh* blank cells since
/// the last time it read a non-blank or revisited cell.
pub struct Escapee {
    n_states: u8,
    blank: Symbol,
    seen_positions: HashSet<i64>,
    blank_run: u32,
}

impl Escapee {
    pub fn new(n_states: u8, blank: Symbol) -> Self {
        let mut seen_positions = HashSet::new();
        // The starting head position is seeded as already-seen, matching the accepted
        // semantics: the first step's move is not counted toward blank_run.
        seen_positions.insert(0);
        Self {
            n_states,
            blank,
            seen_positions,
            blank_run: 0,
        }
    }
}

impl RuntimeFilter for Escapee {
    fn observe(&mut self, view: &TapeView) -> bool {
        let pos = view.tape.head();
        let is_blank = view.tape.read(pos) == self.blank;
        let is_new = !self.seen_positions.contains(&pos);
        if is_blank && is_new {
            self.blank_run += 1;
            self.seen_positions.insert(pos);
        } else {
            self.blank_run = 0;
        }
        self.blank_run > self.n_states as u32
    }

    fn name(&self) -> &'static str {
        "escapee"
    }
}

type Configuration = (u8, i64, Vec<(i64, u8)>);

/// Fires on a period-2 configuration repeat: the first and third entries of a sliding window of
/// the last three `(state, head, written-cells snapshot)` triples are equal.
pub struct CycleTwo {
    window: VecDeque<Configuration>,
}

impl CycleTwo {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(3),
        }
    }
}

impl Default for CycleTwo {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeFilter for CycleTwo {
    fn observe(&mut self, view: &TapeView) -> bool {
        let config = (view.state, view.tape.head(), view.tape.written_cells_snapshot());
        if self.window.len() == 3 {
            self.window.pop_front();
        }
        self.window.push_back(config);
        if self.window.len() == 3 {
            self.window[0] == self.window[2]
        } else {
            false
        }
    }

    fn name(&self) -> &'static str {
        "cycle_two"
    }
}
