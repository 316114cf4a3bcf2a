//! Runs one decoded machine on a blank tape up to a step budget, with pluggable runtime filters.

use crate::encoder::{Symbol, TransitionLookup};
use crate::filters::{RuntimeFilter, TapeView};
use crate::tape::Tape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationOutcome {
    /// The machine reached the halt state; carries the extracted output string.
    Halted(String),
    /// The step budget was exhausted without halting or filtering.
    Timeout,
    /// A pre-run or runtime filter fired; carries its symbolic name.
    Filtered(&'static str),
}

/// Runs `table` on a tape initialised to `blank` everywhere, for at most `max_steps` steps,
/// evaluating `filters` in order after every step. The simulator is total: exactly one of
/// `Halted`/`Timeout`/`Filtered` is always returned.
pub fn run(
    table: &impl TransitionLookup,
    blank: Symbol,
    max_steps: u64,
    mut filters: Vec<Box<dyn RuntimeFilter>>,
) -> SimulationOutcome {
    let mut tape = Tape::new(blank);
    let mut state: u8 = 1;
    let mut steps: u64 = 0;

    loop {
        if state == 0 {
            return SimulationOutcome::Halted(tape.extract_output());
        }
        if steps >= max_steps {
            return SimulationOutcome::Timeout;
        }

        let sym = tape.read_head();
        let transition = match table.lookup(state, sym) {
            Some(t) => t,
            None => {
                // Absence of an entry is an implicit halt with no write.
                state = 0;
                return SimulationOutcome::Halted(tape.extract_output());
            }
        };

        let delta = match transition.mv {
            crate::encoder::Move::Left => -1,
            crate::encoder::Move::Right => 1,
            crate::encoder::Move::None => 0,
        };
        tape.write_and_move(transition.write_symbol, delta);
        state = transition.next_state;
        steps += 1;

        if state == 0 {
            return SimulationOutcome::Halted(tape.extract_output());
        }

        let view = TapeView { tape: &tape, state };
        for filter in filters.iter_mut() {
            if filter.observe(&view) {
                return SimulationOutcome::Filtered(filter.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{Move, Transition, TransitionTable};

    #[test]
    fn immediate_halt_machine() {
        let table =
            TransitionTable::from_transitions(1, vec![Transition::halt(1), Transition::halt(1)])
                .unwrap();
        let outcome = run(&table, 0, 1, vec![]);
        assert_eq!(outcome, SimulationOutcome::Halted("1".to_string()));
    }

    #[test]
    fn zero_step_budget_times_out() {
        let table =
            TransitionTable::from_transitions(1, vec![Transition::halt(1), Transition::halt(1)])
                .unwrap();
        let outcome = run(&table, 0, 0, vec![]);
        assert_eq!(outcome, SimulationOutcome::Timeout);
    }

    #[test]
    fn empty_table_implicit_halt_with_no_write() {
        use crate::encoder::PartialTable;
        let table = PartialTable::new(1);
        let outcome = run(&table, 0, 1, vec![]);
        assert_eq!(outcome, SimulationOutcome::Halted(String::new()));
    }

    #[test]
    fn period_one_self_loop_times_out_without_filters() {
        let table = TransitionTable::from_transitions(
            1,
            vec![
                Transition::step(1, 0, Move::Right),
                Transition::step(1, 1, Move::Right),
            ],
        )
        .unwrap();
        let outcome = run(&table, 0, 5, vec![]);
        assert_eq!(outcome, SimulationOutcome::Timeout);
    }

    #[test]
    fn totality_over_small_sample() {
        use crate::encoder::decode;
        for i in 0..200u128 {
            let table = decode(i, 2).unwrap();
            let outcome = run(&table, 0, 20, vec![]);
            match outcome {
                SimulationOutcome::Halted(_)
                | SimulationOutcome::Timeout
                | SimulationOutcome::Filtered(_) => {}
            }
        }
    }
}
