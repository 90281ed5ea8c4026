//! Persisted record shapes. JSON field names stay camelCase so data written
//! by earlier builds of the game keeps loading.
//!
//! Ids are opaque strings. New records get a v4 UUID, but older saves may
//! carry any string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quest::catalog::Mode;
use crate::quest::problem::{Operation, ALL_TABLES};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScore {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub score: u32,
    pub date: DateTime<Utc>,
    pub mode: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub score: u32,
    pub date: DateTime<Utc>,
    pub mode: String,
    #[serde(default)]
    pub details: String,
    /// Operations played. Older records only carry `details`.
    #[serde(default)]
    pub ops: Vec<Operation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedBlock {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub date: DateTime<Utc>,
}

/// Last mission setup chosen on the home screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ops: Vec<Operation>,
    pub tables: Vec<u32>,
    pub mode: Mode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ops: vec![Operation::Multiply],
            tables: ALL_TABLES.to_vec(),
            mode: Mode::TimeAttack,
        }
    }
}
