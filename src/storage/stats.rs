//! Per-user progress counters and history aggregation.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::records::GameRecord;
use crate::quest::problem::Operation;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub total_missions: u32,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub today_missions: u32,
    #[serde(rename = "todayXP")]
    pub today_xp: u64,
    /// Local date the today-counters belong to, `YYYY-MM-DD`.
    pub today_date: String,
    /// Collected block type → count.
    pub blocks: BTreeMap<String, u32>,
}

impl UserStats {
    /// Zero the today-counters if they belong to another date.
    /// Returns true when a rollover happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        let key = today.format(DATE_FORMAT).to_string();
        if self.today_date == key {
            return false;
        }
        self.today_missions = 0;
        self.today_xp = 0;
        self.today_date = key;
        true
    }

    pub fn record_game(&mut self, score: u32) {
        self.total_missions += 1;
        self.total_xp += score as u64;
        self.today_missions += 1;
        self.today_xp += score as u64;
    }

    pub fn record_block(&mut self, kind: &str) {
        *self.blocks.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn distinct_blocks(&self) -> usize {
        self.blocks.values().filter(|&&n| n > 0).count()
    }
}

/// Aggregate over a set of finished games.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub total_score: u64,
    pub games: Vec<GameRecord>,
    pub breakdown: BTreeMap<Operation, u32>,
}

pub fn summarize(games: Vec<GameRecord>) -> Summary {
    Summary {
        count: games.len(),
        total_score: games.iter().map(|g| g.score as u64).sum(),
        breakdown: breakdown(&games),
        games,
    }
}

/// Count how many games exercised each operation.
pub fn breakdown(games: &[GameRecord]) -> BTreeMap<Operation, u32> {
    let mut counts = BTreeMap::new();
    for game in games {
        let ops = if game.ops.is_empty() {
            ops_from_details(&game.details)
        } else {
            game.ops.clone()
        };
        for op in Operation::ALL {
            if ops.contains(&op) {
                *counts.entry(op).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Recover operations from a free-text summary written by older builds.
fn ops_from_details(details: &str) -> Vec<Operation> {
    let mixed = details.contains("Mixed");
    Operation::ALL
        .iter()
        .copied()
        .filter(|op| details.contains(op.name()) || (mixed && details.contains(op.symbol())))
        .collect()
}

/// The player's calendar date for a stored timestamp.
pub fn local_date(date: &DateTime<Utc>) -> NaiveDate {
    date.with_timezone(&Local).date_naive()
}
