//! Problem generation: arithmetic facts from the selected tables, plus
//! distractor choices for multiple-choice rounds.
//!
//! Everything here is pure and driven by an explicit LCG seed so sessions
//! are reproducible in tests.

use serde::{Deserialize, Serialize};

/// Tables used when the player has nothing selected.
pub const ALL_TABLES: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// Number of options shown in a multiple-choice round.
pub const CHOICE_COUNT: usize = 4;

/// Tables below this value never pair with 11 or 12.
const LARGE_TABLE: u32 = 11;

// ── RNG ───────────────────────────────────────────────────────────────

pub fn next_rng(seed: u64) -> u64 {
    seed.wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407)
}

/// Uniform value in `0..max`. `max` of zero yields zero.
pub fn rng_range(seed: &mut u64, max: u32) -> u32 {
    *seed = next_rng(*seed);
    if max == 0 {
        return 0;
    }
    ((*seed >> 33) % max as u64) as u32
}

/// Fisher–Yates shuffle in place.
pub fn shuffle<T>(items: &mut [T], seed: &mut u64) {
    for i in (1..items.len()).rev() {
        let j = rng_range(seed, (i + 1) as u32) as usize;
        items.swap(i, j);
    }
}

// ── Operation ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Multiply,
    Divide,
    Add,
    Subtract,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Multiply,
        Operation::Divide,
        Operation::Add,
        Operation::Subtract,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Multiply => "×",
            Operation::Divide => "÷",
            Operation::Add => "+",
            Operation::Subtract => "-",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Multiply => "Multiplication",
            Operation::Divide => "Division",
            Operation::Add => "Addition",
            Operation::Subtract => "Subtraction",
        }
    }

    /// Identifier used in URLs and saved settings.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Add => "add",
            Operation::Subtract => "subtract",
        }
    }

    pub fn parse(s: &str) -> Option<Operation> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn index(self) -> usize {
        match self {
            Operation::Multiply => 0,
            Operation::Divide => 1,
            Operation::Add => 2,
            Operation::Subtract => 3,
        }
    }
}

// ── Problem ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    pub a: u32,
    pub b: u32,
    pub answer: u32,
    pub operation: Operation,
    pub display: String,
}

impl Problem {
    /// The display text without the trailing `?`, e.g. `"6 × 7 = "`.
    pub fn prompt(&self) -> &str {
        self.display.trim_end_matches('?')
    }

    /// Number of digits the keypad must collect before auto-submitting.
    pub fn answer_digits(&self) -> usize {
        self.answer.to_string().len()
    }
}

/// Pick one operation at random from a mixed selection.
pub fn pick_operation(ops: &[Operation], seed: &mut u64) -> Operation {
    if ops.is_empty() {
        return Operation::Multiply;
    }
    ops[rng_range(seed, ops.len() as u32) as usize]
}

/// Generate a problem for `operation` drawing the table from `tables`.
///
/// Table values outside 1..=12 are clamped into range, so a divisor of zero
/// can never be produced.
pub fn generate_problem(operation: Operation, tables: &[u32], seed: &mut u64) -> Problem {
    let tables = if tables.is_empty() { &ALL_TABLES[..] } else { tables };

    let a = tables[rng_range(seed, tables.len() as u32) as usize].clamp(1, 12);
    let b = if a < LARGE_TABLE {
        rng_range(seed, 10) + 1
    } else {
        rng_range(seed, 12) + 1
    };

    let swap = rng_range(seed, 2) == 1;
    let (first, second) = if swap { (b, a) } else { (a, b) };

    match operation {
        Operation::Multiply => Problem {
            a: first,
            b: second,
            answer: first * second,
            operation,
            display: format!("{first} × {second} = ?"),
        },
        // Dividend is derived from the quotient so the result is exact.
        Operation::Divide => {
            let product = a * b;
            Problem {
                a: product,
                b: a,
                answer: b,
                operation,
                display: format!("{product} ÷ {a} = ?"),
            }
        }
        Operation::Add => Problem {
            a: first,
            b: second,
            answer: first + second,
            operation,
            display: format!("{first} + {second} = ?"),
        },
        // Minuend is derived from the difference so the result is positive.
        Operation::Subtract => {
            let sum = a + b;
            Problem {
                a: sum,
                b: a,
                answer: b,
                operation,
                display: format!("{sum} - {a} = ?"),
            }
        }
    }
}

/// Build the four shuffled options for a multiple-choice round.
///
/// Distractors model common slips (off by one, off by a few, place value).
/// Small answers leave too few positive candidates, so the set is topped up
/// with the next unused values above the answer.
pub fn generate_choices(correct: u32, seed: &mut u64) -> Vec<u32> {
    let c = correct as i64;
    let mut candidates = vec![
        c + 1,
        c - 1,
        c + rng_range(seed, 4) as i64 + 2,
        c - rng_range(seed, 4) as i64 - 2,
    ];
    if correct >= 10 {
        candidates.push(c + 10);
        candidates.push(c - 10);
    }

    let mut distractors: Vec<u32> = Vec::with_capacity(candidates.len());
    for d in candidates {
        if d > 0 && d != c && !distractors.contains(&(d as u32)) {
            distractors.push(d as u32);
        }
    }
    shuffle(&mut distractors, seed);
    distractors.truncate(CHOICE_COUNT - 1);

    let mut filler = correct.max(1) + 1;
    while distractors.len() < CHOICE_COUNT - 1 {
        if filler != correct && !distractors.contains(&filler) {
            distractors.push(filler);
        }
        filler += 1;
    }

    distractors.push(correct);
    shuffle(&mut distractors, seed);
    distractors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_is_deterministic() {
        let mut a = 7;
        let mut b = 7;
        for _ in 0..20 {
            assert_eq!(rng_range(&mut a, 100), rng_range(&mut b, 100));
        }
    }

    #[test]
    fn rng_range_zero_max() {
        let mut seed = 1;
        assert_eq!(rng_range(&mut seed, 0), 0);
    }

    #[test]
    fn multiply_uses_selected_table() {
        let mut seed = 99;
        for _ in 0..200 {
            let p = generate_problem(Operation::Multiply, &[7], &mut seed);
            assert!(p.a == 7 || p.b == 7, "{:?}", p);
            assert_eq!(p.answer, p.a * p.b);
            assert!(p.display.contains('×'));
        }
    }

    #[test]
    fn small_tables_never_reach_eleven() {
        let mut seed = 3;
        for _ in 0..500 {
            let p = generate_problem(Operation::Multiply, &[2, 5, 10], &mut seed);
            assert!(p.a <= 10 && p.b <= 10, "{:?}", p);
        }
    }

    #[test]
    fn large_tables_can_reach_twelve() {
        let mut seed = 5;
        let mut saw_twelve = false;
        for _ in 0..500 {
            let p = generate_problem(Operation::Multiply, &[11], &mut seed);
            if p.a == 12 || p.b == 12 {
                saw_twelve = true;
            }
        }
        assert!(saw_twelve);
    }

    #[test]
    fn divide_is_exact_and_divisor_is_table() {
        let mut seed = 11;
        for _ in 0..300 {
            let p = generate_problem(Operation::Divide, &[3, 9], &mut seed);
            assert!(p.b == 3 || p.b == 9);
            assert_eq!(p.a % p.b, 0);
            assert_eq!(p.a / p.b, p.answer);
            assert_eq!(p.display, format!("{} ÷ {} = ?", p.a, p.b));
        }
    }

    #[test]
    fn subtract_result_is_positive() {
        let mut seed = 13;
        for _ in 0..300 {
            let p = generate_problem(Operation::Subtract, &ALL_TABLES, &mut seed);
            assert!(p.a > p.b);
            assert_eq!(p.a - p.b, p.answer);
        }
    }

    #[test]
    fn empty_tables_fall_back_to_all() {
        let mut seed = 17;
        let p = generate_problem(Operation::Add, &[], &mut seed);
        assert!(p.answer >= 2 && p.answer <= 24);
    }

    #[test]
    fn zero_table_is_clamped() {
        let mut seed = 19;
        let p = generate_problem(Operation::Divide, &[0], &mut seed);
        assert_eq!(p.b, 1);
        assert!(p.answer >= 1);
    }

    #[test]
    fn prompt_strips_question_mark() {
        let mut seed = 23;
        let p = generate_problem(Operation::Multiply, &[4], &mut seed);
        assert!(p.prompt().ends_with("= "));
    }

    #[test]
    fn choices_for_one_are_topped_up() {
        let mut seed = 29;
        let choices = generate_choices(1, &mut seed);
        assert_eq!(choices.len(), CHOICE_COUNT);
        assert!(choices.contains(&1));
        assert!(choices.iter().all(|&c| c > 0));
    }

    #[test]
    fn choices_include_place_value_slips_for_large_answers() {
        // Over many draws the ±10 distractors must appear at least once.
        let mut seed = 31;
        let mut saw_ten_off = false;
        for _ in 0..100 {
            let choices = generate_choices(56, &mut seed);
            if choices.contains(&66) || choices.contains(&46) {
                saw_ten_off = true;
            }
        }
        assert!(saw_ten_off);
    }

    #[test]
    fn operation_parse_roundtrip() {
        for op in Operation::ALL {
            assert_eq!(Operation::parse(op.as_str()), Some(op));
        }
        assert_eq!(Operation::parse(" Divide "), Some(Operation::Divide));
        assert_eq!(Operation::parse("modulo"), None);
    }

    #[test]
    fn pick_operation_stays_in_selection() {
        let mut seed = 37;
        let ops = [Operation::Add, Operation::Subtract];
        for _ in 0..50 {
            assert!(ops.contains(&pick_operation(&ops, &mut seed)));
        }
        assert_eq!(pick_operation(&[], &mut seed), Operation::Multiply);
    }
}
