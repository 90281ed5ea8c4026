//! Persistent player data: current profile, history, high scores,
//! collected blocks, per-user stats and the last mission setup.
//!
//! Every collection lives under one JSON array key shared by all profiles;
//! reads filter by the current user. An unreadable key loads as empty so it
//! never blocks play, but it is not overwritten: saves to it fail with
//! [`StorageError::Corrupt`]. Single array elements this build cannot read
//! are carried through saves unchanged.

pub mod backend;
pub mod records;
pub mod stats;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quest::catalog::{find_block, find_user, Mode, User};
use crate::quest::problem::{next_rng, Operation};

pub use backend::{MemoryStorage, StoreKind};
pub use records::{CollectedBlock, GameRecord, HighScore, Settings};
pub use stats::{Summary, UserStats};

pub const CURRENT_USER_KEY: &str = "math-craft-current-user";
pub const HIGH_SCORES_KEY: &str = "math-craft-high-scores";
pub const HISTORY_KEY: &str = "math-craft-history";
pub const INVENTORY_KEY: &str = "math-craft-inventory";
pub const STATS_KEY: &str = "math-craft-stats";
pub const SETTINGS_KEY: &str = "math-craft-settings";

/// Per-user caps.
pub const HIGH_SCORE_LIMIT: usize = 10;
pub const HISTORY_LIMIT: usize = 500;
pub const INVENTORY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("failed to write {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("value for {key} is {len} bytes, over the {limit} byte limit")]
    TooLarge { key: String, len: usize, limit: usize },

    #[error("stored {key} is unreadable, not overwriting it: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("unknown block type: {0}")]
    UnknownBlock(String),

    #[error("no user is signed in")]
    NoCurrentUser,
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub trait KeyValueStore {
    fn name(&self) -> &'static str;
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Whether `value` can be stored under `key` in one piece.
    fn fits(&self, _key: &str, _value: &str) -> bool {
        true
    }
}

/// One element of a stored array. Elements this build cannot read stay as
/// raw JSON and are written back as they were.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Slot<T> {
    Known(T),
    Unknown(serde_json::Value),
}

impl<T> Slot<T> {
    fn known(&self) -> Option<&T> {
        match self {
            Slot::Known(v) => Some(v),
            Slot::Unknown(_) => None,
        }
    }

    fn into_known(self) -> Option<T> {
        match self {
            Slot::Known(v) => Some(v),
            Slot::Unknown(_) => None,
        }
    }
}

pub struct Store {
    backend: Box<dyn KeyValueStore>,
    id_seed: u64,
}

impl Store {
    pub fn new(backend: Box<dyn KeyValueStore>, seed: u64) -> Self {
        Self {
            backend,
            id_seed: seed,
        }
    }

    pub fn in_memory(seed: u64) -> Self {
        Self::new(Box::new(MemoryStorage::default()), seed)
    }

    /// Open the requested backend, falling back to memory when the browser
    /// refuses it.
    pub fn open(kind: StoreKind, seed: u64) -> Self {
        match backend::open(kind) {
            Ok(backend) => Self::new(backend, seed),
            Err(e) => {
                log::warn!(
                    "[STORAGE] {} unavailable, progress will not persist: {e}",
                    kind.as_str()
                );
                Self::in_memory(seed)
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn next_id(&mut self) -> String {
        self.id_seed = next_rng(self.id_seed);
        let hi = self.id_seed;
        self.id_seed = next_rng(self.id_seed);
        let lo = self.id_seed;
        let bytes = (((hi as u128) << 64) | lo as u128).to_be_bytes();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("[STORAGE] read failed key:{key} error:{e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("[STORAGE] ignoring unreadable value key:{key} error:{e}");
                None
            }
        }
    }

    /// The readable elements of an array key.
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.load_slots(key) {
            Ok(slots) => slots.into_iter().filter_map(Slot::into_known).collect(),
            Err(e) => {
                log::warn!("[STORAGE] {e}");
                Vec::new()
            }
        }
    }

    /// Every element of an array key, for a read-modify-write.
    fn load_slots<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<Slot<T>>> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(Vec::new());
        };
        let slots: Vec<Slot<T>> =
            serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        let unknown = slots.iter().filter(|s| s.known().is_none()).count();
        if unknown > 0 {
            log::warn!("[STORAGE] keeping unreadable entries key:{key} count:{unknown}");
        }
        Ok(slots)
    }

    /// Write an array key, dropping entries picked by `evict` (oldest first)
    /// until the backend can hold it.
    fn write_slots<T: Serialize>(
        &mut self,
        key: &str,
        slots: &mut Vec<Slot<T>>,
        evict: impl Fn(&[Slot<T>]) -> Option<usize>,
    ) -> Result<()> {
        let mut dropped = 0;
        loop {
            let json = serde_json::to_string(&*slots)?;
            if !self.backend.fits(key, &json) {
                if let Some(i) = evict(slots) {
                    slots.remove(i);
                    dropped += 1;
                    continue;
                }
            }
            if dropped > 0 {
                log::info!(
                    "[STORAGE] trimmed to fit backend:{} key:{key} dropped:{dropped}",
                    self.backend.name()
                );
            }
            return self.backend.set(key, &json);
        }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.backend.set(key, &json)
    }

    // ── Current user ──────────────────────────────────────────────────

    pub fn current_user(&self) -> Option<&'static User> {
        match self.backend.get(CURRENT_USER_KEY) {
            Ok(Some(id)) => find_user(id.trim()),
            Ok(None) => None,
            Err(e) => {
                log::warn!("[STORAGE] read failed key:{CURRENT_USER_KEY} error:{e}");
                None
            }
        }
    }

    pub fn set_current_user(&mut self, user_id: &str) -> Result<&'static User> {
        let user =
            find_user(user_id).ok_or_else(|| StorageError::UnknownUser(user_id.to_string()))?;
        self.backend.set(CURRENT_USER_KEY, user.id)?;
        log::info!("[STORAGE] signed in user:{}", user.id);
        Ok(user)
    }

    pub fn clear_current_user(&mut self) -> Result<()> {
        self.backend.remove(CURRENT_USER_KEY)
    }

    fn require_user(&self) -> Result<&'static User> {
        self.current_user().ok_or(StorageError::NoCurrentUser)
    }

    // ── Inventory ─────────────────────────────────────────────────────

    /// Blocks owned by the current user, oldest first.
    pub fn inventory(&self) -> Vec<CollectedBlock> {
        let Some(user) = self.current_user() else {
            return Vec::new();
        };
        self.read_list::<CollectedBlock>(INVENTORY_KEY)
            .into_iter()
            .filter(|b| b.user_id == user.id)
            .collect()
    }

    pub fn add_to_inventory(
        &mut self,
        block_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<CollectedBlock>> {
        let user = self.require_user()?;
        let def =
            find_block(block_type).ok_or_else(|| StorageError::UnknownBlock(block_type.into()))?;
        let mut all: Vec<Slot<CollectedBlock>> = self.load_slots(INVENTORY_KEY)?;
        all.push(Slot::Known(CollectedBlock {
            id: self.next_id(),
            user_id: user.id.to_string(),
            kind: def.kind.to_string(),
            name: def.name.to_string(),
            date: now,
        }));
        // Newest entries survive the cap.
        all.reverse();
        cap_per_user(&mut all, INVENTORY_LIMIT, |b| &b.user_id);
        all.reverse();
        self.write_slots(INVENTORY_KEY, &mut all, |slots| {
            slots
                .iter()
                .position(|s| s.known().is_some_and(|b| b.user_id == user.id))
                .filter(|&i| i + 1 < slots.len())
        })?;
        Ok(self.inventory())
    }

    // ── High scores ───────────────────────────────────────────────────

    /// The current user's best scores, highest first.
    pub fn high_scores(&self) -> Vec<HighScore> {
        let Some(user) = self.current_user() else {
            return Vec::new();
        };
        let mut scores: Vec<HighScore> = self
            .read_list::<HighScore>(HIGH_SCORES_KEY)
            .into_iter()
            .filter(|s| s.user_id == user.id)
            .collect();
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores
    }

    pub fn save_high_score(
        &mut self,
        score: u32,
        mode: Mode,
        now: DateTime<Utc>,
    ) -> Result<Vec<HighScore>> {
        let user = self.require_user()?;
        let mut all: Vec<Slot<HighScore>> = self.load_slots(HIGH_SCORES_KEY)?;
        all.push(Slot::Known(HighScore {
            id: self.next_id(),
            user_id: user.id.to_string(),
            name: user.name.to_string(),
            score,
            date: now,
            mode: mode.as_str().to_string(),
        }));
        // Unreadable entries sort last.
        all.sort_by_key(|s| std::cmp::Reverse(s.known().map(|h| h.score)));
        cap_per_user(&mut all, HIGH_SCORE_LIMIT, |s| &s.user_id);
        self.write_slots(HIGH_SCORES_KEY, &mut all, |slots| {
            slots
                .iter()
                .rposition(|s| s.known().is_some_and(|h| h.user_id == user.id))
        })?;
        Ok(self.high_scores())
    }

    // ── History ───────────────────────────────────────────────────────

    /// The current user's finished games, newest first.
    pub fn history(&self) -> Vec<GameRecord> {
        let Some(user) = self.current_user() else {
            return Vec::new();
        };
        self.read_list::<GameRecord>(HISTORY_KEY)
            .into_iter()
            .filter(|g| g.user_id == user.id)
            .collect()
    }

    pub fn save_game_to_history(
        &mut self,
        score: u32,
        mode: Mode,
        details: &str,
        ops: &[Operation],
        now: DateTime<Utc>,
    ) -> Result<GameRecord> {
        let user = self.require_user()?;
        let record = GameRecord {
            id: self.next_id(),
            user_id: user.id.to_string(),
            score,
            date: now,
            mode: mode.as_str().to_string(),
            details: details.to_string(),
            ops: ops.to_vec(),
        };
        let mut all: Vec<Slot<GameRecord>> = self.load_slots(HISTORY_KEY)?;
        all.insert(0, Slot::Known(record.clone()));
        cap_per_user(&mut all, HISTORY_LIMIT, |g| &g.user_id);
        self.write_slots(HISTORY_KEY, &mut all, |slots| {
            slots
                .iter()
                .rposition(|s| s.known().is_some_and(|g| g.user_id == user.id))
                .filter(|&i| i > 0)
        })?;
        Ok(record)
    }

    pub fn today_stats(&self, today: NaiveDate) -> Summary {
        let games = self
            .history()
            .into_iter()
            .filter(|g| stats::local_date(&g.date) == today)
            .collect();
        stats::summarize(games)
    }

    pub fn overall_stats(&self) -> Summary {
        stats::summarize(self.history())
    }

    // ── User stats ────────────────────────────────────────────────────

    fn load_stats(&self) -> Result<BTreeMap<String, Slot<UserStats>>> {
        let Some(raw) = self.backend.get(STATS_KEY)? else {
            return Ok(BTreeMap::new());
        };
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            key: STATS_KEY.to_string(),
            reason: e.to_string(),
        })
    }

    fn stored_stats(&self, user: &User) -> UserStats {
        match self.load_stats() {
            Ok(mut all) => all
                .remove(user.id)
                .and_then(Slot::into_known)
                .unwrap_or_default(),
            Err(e) => {
                log::warn!("[STORAGE] {e}");
                UserStats::default()
            }
        }
    }

    /// The current user's counters with the day rollover applied. A
    /// rollover is written back so it happens once per day.
    pub fn user_stats(&mut self, today: NaiveDate) -> UserStats {
        let Some(user) = self.current_user() else {
            return UserStats::default();
        };
        let mut stats = self.stored_stats(user);
        if stats.roll_over(today) {
            log::debug!("[STORAGE] day rollover user:{} date:{}", user.id, stats.today_date);
            if let Err(e) = self.update_stats(today, |_| {}) {
                log::warn!("[STORAGE] failed to persist rollover: {e}");
            }
        }
        stats
    }

    /// Apply `change` to the current user's counters after any rollover.
    /// Other profiles' entries are written back as loaded.
    fn update_stats(
        &mut self,
        today: NaiveDate,
        change: impl FnOnce(&mut UserStats),
    ) -> Result<UserStats> {
        let user = self.require_user()?;
        let mut all = self.load_stats()?;
        let slot = all
            .entry(user.id.to_string())
            .or_insert_with(|| Slot::Known(UserStats::default()));
        let Slot::Known(stats) = slot else {
            return Err(StorageError::Corrupt {
                key: STATS_KEY.to_string(),
                reason: format!("entry for {} is unreadable", user.id),
            });
        };
        stats.roll_over(today);
        change(stats);
        let snapshot = stats.clone();
        self.write_json(STATS_KEY, &all)?;
        Ok(snapshot)
    }

    pub fn record_game_complete(&mut self, score: u32, today: NaiveDate) -> Result<UserStats> {
        let stats = self.update_stats(today, |s| s.record_game(score))?;
        log::info!(
            "[STORAGE] mission complete score:{score} missions:{} xp:{}",
            stats.total_missions,
            stats.total_xp
        );
        Ok(stats)
    }

    pub fn record_block_collected(
        &mut self,
        block_type: &str,
        today: NaiveDate,
    ) -> Result<UserStats> {
        let def =
            find_block(block_type).ok_or_else(|| StorageError::UnknownBlock(block_type.into()))?;
        self.update_stats(today, |s| s.record_block(def.kind))
    }

    pub fn block_counts(&self) -> BTreeMap<String, u32> {
        let Some(user) = self.current_user() else {
            return BTreeMap::new();
        };
        self.stored_stats(user).blocks
    }

    // ── Settings ──────────────────────────────────────────────────────

    pub fn load_settings(&self) -> Option<Settings> {
        self.read_json(SETTINGS_KEY)
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        self.write_json(SETTINGS_KEY, settings)
    }
}

/// Keep the first `limit` readable entries of each user, preserving order.
/// Unreadable entries are always kept.
fn cap_per_user<T>(items: &mut Vec<Slot<T>>, limit: usize, user_of: impl Fn(&T) -> &String) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    items.retain(|slot| {
        let Some(item) = slot.known() else {
            return true;
        };
        let n = seen.entry(user_of(item).clone()).or_insert(0);
        *n += 1;
        *n <= limit
    });
}
