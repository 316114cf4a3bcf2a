//! Bijective encoding between non-negative integers and `(n, 2)` transition tables.
//!
//! A table has `2n` transitions, one per `(state, symbol)` cell with `state` in `1..=n` and
//! `symbol` in `[0, 1]`. The table is encoded as a base-`b` numeral with `2n` digits, MSB first,
//! where `b = 4n + 2`. See [`encode`]/[`decode`].

use crate::error::{CtmError, CtmResult};

pub const SYMBOLS: [Symbol; 2] = [0, 1];

/// A tape symbol: `0` or `1`.
pub type Symbol = u8;

/// `0` is the distinguished halt state; `1` is the initial state; `2..=n` are other states.
pub type State = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left,
    Right,
    /// Only legal on a transition into the halt state.
    None,
}

impl Move {
    fn index(self) -> u32 {
        match self {
            Move::Left => 0,
            Move::Right => 1,
            Move::None => panic!("Move::None has no digit index"),
        }
    }

    fn from_index(idx: u32) -> Move {
        match idx {
            0 => Move::Left,
            1 => Move::Right,
            _ => unreachable!("move digit index must be 0 or 1"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next_state: State,
    pub write_symbol: Symbol,
    pub mv: Move,
}

impl Transition {
    pub fn halt(write_symbol: Symbol) -> Self {
        Self {
            next_state: 0,
            write_symbol,
            mv: Move::None,
        }
    }

    pub fn step(next_state: State, write_symbol: Symbol, mv: Move) -> Self {
        Self {
            next_state,
            write_symbol,
            mv,
        }
    }

    pub fn is_halt(&self) -> bool {
        self.next_state == 0
    }
}

/// A total function from `{1..=n} x {0,1}` to [`Transition`]. Stored row-major: `transitions[(state - 1) * 2 + symbol]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    n_states: usize,
    transitions: Vec<Transition>,
}

impl TransitionTable {
    pub fn from_transitions(n_states: usize, transitions: Vec<Transition>) -> CtmResult<Self> {
        if transitions.len() != 2 * n_states {
            return Err(CtmError::InvalidTable(format!(
                "expected {} transitions for n_states={n_states}, got {}",
                2 * n_states,
                transitions.len()
            )));
        }
        for t in &transitions {
            if t.is_halt() && t.mv != Move::None {
                return Err(CtmError::InvalidTable(
                    "halt transition must use Move::None".to_string(),
                ));
            }
            if !t.is_halt() && t.mv == Move::None {
                return Err(CtmError::InvalidTable(
                    "active-state transition must not use Move::None".to_string(),
                ));
            }
            if !t.is_halt() && (t.next_state as usize) > n_states {
                return Err(CtmError::InvalidTable(format!(
                    "next_state {} exceeds n_states {n_states}",
                    t.next_state
                )));
            }
        }
        Ok(Self {
            n_states,
            transitions,
        })
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Fetches the transition for `(state, symbol)`, `state` in `1..=n_states`.
    pub fn get(&self, state: State, symbol: Symbol) -> Transition {
        self.transitions[(state as usize - 1) * 2 + symbol as usize]
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// True iff no transition in the table targets the halt state — such a machine can never halt.
    pub fn has_no_halt_transition(&self) -> bool {
        !self.transitions.iter().any(Transition::is_halt)
    }
}

/// Anything the simulator can look a `(state, symbol)` cell up in. [`TransitionTable`] is total
/// by construction and always returns `Some`; [`PartialTable`] models the "absence of an entry"
/// case from the data model, used directly by tests that exercise the implicit-halt path
/// without going through the encoder (which enforces totality).
pub trait TransitionLookup {
    fn n_states(&self) -> usize;
    fn lookup(&self, state: State, symbol: Symbol) -> Option<Transition>;
}

impl TransitionLookup for TransitionTable {
    fn n_states(&self) -> usize {
        self.n_states
    }

    fn lookup(&self, state: State, symbol: Symbol) -> Option<Transition> {
        Some(self.get(state, symbol))
    }
}

/// A possibly-incomplete transition table: missing `(state, symbol)` cells are implicit halts.
#[derive(Debug, Clone, Default)]
pub struct PartialTable {
    n_states: usize,
    entries: hashbrown::HashMap<(State, Symbol), Transition>,
}

impl PartialTable {
    pub fn new(n_states: usize) -> Self {
        Self {
            n_states,
            entries: hashbrown::HashMap::new(),
        }
    }

    pub fn insert(mut self, state: State, symbol: Symbol, transition: Transition) -> Self {
        self.entries.insert((state, symbol), transition);
        self
    }
}

impl TransitionLookup for PartialTable {
    fn n_states(&self) -> usize {
        self.n_states
    }

    fn lookup(&self, state: State, symbol: Symbol) -> Option<Transition> {
        self.entries.get(&(state, symbol)).copied()
    }
}

/// `b = 4n + 2`, the numeral base used by the bijection.
pub fn base(n_states: usize) -> u128 {
    4 * n_states as u128 + 2
}

/// `b^(2n)`, the size of the raw enumeration for `n` states.
pub fn raw_space_size(n_states: usize) -> u128 {
    base(n_states).pow(2 * n_states as u32)
}

fn digit_code(t: Transition) -> u32 {
    if t.is_halt() {
        t.write_symbol as u32
    } else {
        let write_idx = t.write_symbol as u32;
        2 + (t.next_state as u32 - 1) * 4 + write_idx * 2 + t.mv.index()
    }
}

fn digit_from_code(code: u32) -> Transition {
    if code < 2 {
        Transition::halt(code as Symbol)
    } else {
        let rest = code - 2;
        let next_state = (rest / 4) + 1;
        let rest = rest % 4;
        let write_idx = rest / 2;
        let move_idx = rest % 2;
        Transition::step(next_state as State, write_idx as Symbol, Move::from_index(move_idx))
    }
}

/// Encodes a table to its canonical TM index. Row-major digit order: state `1..=n` outer,
/// symbol `[0, 1]` inner, folded MSB-first via `N <- N*b + code`.
pub fn encode(table: &TransitionTable) -> u128 {
    let b = base(table.n_states());
    let mut n: u128 = 0;
    for t in table.transitions() {
        n = n * b + digit_code(t) as u128;
    }
    n
}

/// Decodes a TM index back into a table. Fails with `IndexOutOfRange` if `index >= b^(2n)`.
pub fn decode(index: u128, n_states: usize) -> CtmResult<TransitionTable> {
    let b = base(n_states);
    let limit = raw_space_size(n_states);
    if index >= limit {
        return Err(CtmError::IndexOutOfRange { index, limit });
    }
    let digit_count = 2 * n_states;
    let mut digits = vec![0u32; digit_count];
    let mut remaining = index;
    for slot in digits.iter_mut().rev() {
        *slot = (remaining % b) as u32;
        remaining /= b;
    }
    let transitions = digits.into_iter().map(digit_from_code).collect();
    TransitionTable::from_transitions(n_states, transitions)
}

/// Human-readable rendering: one `write,move,next` triple per `(state, symbol)` cell in
/// row-major order, halt transitions rendered as `write,H,-`.
pub fn to_text_format(table: &TransitionTable) -> String {
    let mut parts = Vec::with_capacity(table.n_states() * 2);
    for state in 1..=table.n_states() as State {
        for symbol in SYMBOLS {
            let t = table.get(state, symbol);
            if t.is_halt() {
                parts.push(format!("{},H,-", t.write_symbol));
            } else {
                let mv = match t.mv {
                    Move::Left => "L",
                    Move::Right => "R",
                    Move::None => unreachable!(),
                };
                parts.push(format!("{},{},{}", t.write_symbol, mv, t.next_state));
            }
        }
    }
    parts.join(" ")
}

/// Parses the text format produced by [`to_text_format`].
pub fn from_text_format(text: &str, n_states: usize) -> CtmResult<TransitionTable> {
    let mut transitions = Vec::with_capacity(n_states * 2);
    for cell in text.split_whitespace() {
        let fields: Vec<&str> = cell.split(',').collect();
        if fields.len() != 3 {
            return Err(CtmError::InvalidTable(format!("malformed cell: {cell}")));
        }
        let write: Symbol = fields[0]
            .parse()
            .map_err(|_| CtmError::InvalidTable(format!("bad write symbol in: {cell}")))?;
        if fields[1] == "H" {
            transitions.push(Transition::halt(write));
        } else {
            let next_state: State = fields[2]
                .parse()
                .map_err(|_| CtmError::InvalidTable(format!("bad next state in: {cell}")))?;
            let mv = match fields[1] {
                "L" => Move::Left,
                "R" => Move::Right,
                _ => return Err(CtmError::InvalidTable(format!("bad move in: {cell}"))),
            };
            transitions.push(Transition::step(next_state, write, mv));
        }
    }
    TransitionTable::from_transitions(n_states, transitions)
}
