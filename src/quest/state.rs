//! Math Quest state.

use std::cell::Cell;
use std::collections::BTreeMap;

use super::catalog::{BlockDef, Difficulty, Mode, User};
use super::problem::{Operation, Problem, ALL_TABLES};
use crate::storage::{HighScore, Settings, Summary, UserStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    UserSelect,
    Home,
    Game,
    Report,
    Collection,
    Stats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Wrong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Playing,
    Finished,
}

// ── Mission setup ─────────────────────────────────────────────────────

/// Operations, tables and mode chosen on the home screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Setup {
    /// Always non-empty, in `Operation::ALL` order.
    pub ops: Vec<Operation>,
    /// Always non-empty, ascending, within 1..=12.
    pub tables: Vec<u32>,
    pub mode: Mode,
}

impl Default for Setup {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl Setup {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut setup = Self {
            ops: Vec::new(),
            tables: Vec::new(),
            mode: settings.mode,
        };
        setup.set_ops(&settings.ops);
        setup.set_tables(&settings.tables);
        setup
    }

    pub fn to_settings(&self) -> Settings {
        Settings {
            ops: self.ops.clone(),
            tables: self.tables.clone(),
            mode: self.mode,
        }
    }

    /// Replace the operation set, keeping multiplication if nothing valid is given.
    pub fn set_ops(&mut self, ops: &[Operation]) {
        self.ops = Operation::ALL
            .iter()
            .copied()
            .filter(|op| ops.contains(op))
            .collect();
        if self.ops.is_empty() {
            self.ops.push(Operation::Multiply);
        }
    }

    /// Replace the table set, falling back to every table if nothing valid is given.
    pub fn set_tables(&mut self, tables: &[u32]) {
        self.tables = ALL_TABLES
            .iter()
            .copied()
            .filter(|t| tables.contains(t))
            .collect();
        if self.tables.is_empty() {
            self.tables = ALL_TABLES.to_vec();
        }
    }

    /// Returns false when the toggle would leave no operation selected.
    pub fn toggle_op(&mut self, op: Operation) -> bool {
        if self.ops.contains(&op) {
            if self.ops.len() == 1 {
                return false;
            }
            self.ops.retain(|&o| o != op);
        } else {
            let mut ops = self.ops.clone();
            ops.push(op);
            self.set_ops(&ops);
        }
        true
    }

    /// Returns false when the toggle would leave no table selected or the
    /// table is out of range.
    pub fn toggle_table(&mut self, table: u32) -> bool {
        if !ALL_TABLES.contains(&table) {
            return false;
        }
        if self.tables.contains(&table) {
            if self.tables.len() == 1 {
                return false;
            }
            self.tables.retain(|&t| t != table);
        } else {
            let mut tables = self.tables.clone();
            tables.push(table);
            self.set_tables(&tables);
        }
        true
    }

    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.tables = difficulty.tables();
    }

    /// The preset whose table range matches the current selection, if any.
    pub fn difficulty(&self) -> Option<Difficulty> {
        Difficulty::ALL
            .iter()
            .copied()
            .find(|d| d.tables() == self.tables)
    }

    pub fn ops_label(&self) -> String {
        match self.ops.as_slice() {
            [op] => op.name().to_string(),
            ops => {
                let symbols: Vec<&str> = ops.iter().map(|op| op.symbol()).collect();
                format!("Mixed ({})", symbols.join(" "))
            }
        }
    }

    pub fn tables_label(&self) -> String {
        if self.tables.len() == ALL_TABLES.len() {
            return "all".to_string();
        }
        let tables: Vec<String> = self.tables.iter().map(|t| t.to_string()).collect();
        tables.join(",")
    }

    /// Summary stored with each finished game.
    pub fn details(&self) -> String {
        format!("{} · Tables {}", self.ops_label(), self.tables_label())
    }
}

// ── Session ───────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Session {
    pub mode: Mode,
    pub setup: Setup,
    pub problem: Problem,
    /// Keypad digits typed so far.
    pub input: String,
    /// Present on multiple-choice questions.
    pub choices: Option<Vec<u32>>,
    /// 1-based question number.
    pub question: u32,
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub correct: u32,
    pub wrong: u32,
    /// Remaining time-attack ticks. Unused in practice mode.
    pub ticks_left: u32,
    pub feedback: Option<Feedback>,
    pub feedback_ticks: u32,
    /// Index into `choices` picked on a multiple-choice question.
    pub picked: Option<usize>,
    pub phase: SessionPhase,
    pub rewards: Vec<&'static BlockDef>,
    pub chosen_reward: Option<usize>,
}

impl Session {
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    pub fn accepts_input(&self) -> bool {
        self.phase == SessionPhase::Playing && self.feedback.is_none()
    }
}

// ── Cached profile data ───────────────────────────────────────────────

/// Storage snapshot shown on the home, collection and stats screens.
#[derive(Clone, Debug, Default)]
pub struct ProfileView {
    pub stats: UserStats,
    pub block_counts: BTreeMap<String, u32>,
    pub today: Summary,
    pub overall: Summary,
    pub high_scores: Vec<HighScore>,
}

pub struct QuestState {
    pub screen: Screen,
    pub user: Option<&'static User>,
    pub setup: Setup,
    pub session: Option<Session>,
    pub rng_seed: u64,
    pub profile: ProfileView,
    pub stats_scroll: u16,
    /// Largest useful `stats_scroll`, written by the renderer each frame.
    pub stats_max_scroll: Cell<u16>,
    /// One-line message shown under the current screen (e.g. a failed save).
    pub notice: Option<String>,
}

impl QuestState {
    pub fn new(seed: u64) -> Self {
        Self {
            screen: Screen::UserSelect,
            user: None,
            setup: Setup::default(),
            session: None,
            rng_seed: seed,
            profile: ProfileView::default(),
            stats_scroll: 0,
            stats_max_scroll: Cell::new(u16::MAX),
            notice: None,
        }
    }
}
