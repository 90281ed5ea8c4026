//! Launch options read from the page URL, e.g.
//! `?ops=multiply,divide&tables=2,5,10&mode=practice&store=cookie&log=debug`.
//!
//! Every value is optional. Bad entries are reported and skipped; the rest of
//! the query still applies.

use log::LevelFilter;
use thiserror::Error;

use crate::quest::catalog::{Difficulty, Mode};
use crate::quest::problem::Operation;
use crate::quest::state::Setup;
use crate::storage::StoreKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error("table `{0}` is not a number from 1 to 12")]
    BadTable(String),

    #[error("unknown mode `{0}`")]
    UnknownMode(String),

    #[error("unknown difficulty `{0}`")]
    UnknownDifficulty(String),

    #[error("unknown store `{0}`")]
    UnknownStore(String),

    #[error("unknown log level `{0}`")]
    UnknownLogLevel(String),

    #[error("`{0}` is not valid percent-encoded UTF-8")]
    BadEncoding(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Overrides the saved operations when present.
    pub ops: Option<Vec<Operation>>,
    /// Overrides the saved tables when present (`tables` wins over `diff`).
    pub tables: Option<Vec<u32>>,
    pub mode: Option<Mode>,
    pub store: StoreKind,
    pub log_level: LevelFilter,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ops: None,
            tables: None,
            mode: None,
            store: StoreKind::Local,
            log_level: LevelFilter::Info,
        }
    }
}

impl GameConfig {
    /// Parse a `location.search` string. Returns the config built from the
    /// valid entries plus one error per rejected value.
    pub fn from_query(query: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Self::default();
        let mut errors = Vec::new();
        let mut difficulty = None;

        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, raw)) = pair.split_once('=') else {
                continue;
            };
            let value = match decode_value(raw) {
                Ok(v) => v,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            match key {
                "ops" => {
                    let ops = parse_list(&value, parse_op, &mut errors);
                    if !ops.is_empty() {
                        config.ops = Some(ops);
                    }
                }
                "tables" => {
                    let tables = parse_list(&value, parse_table, &mut errors);
                    if !tables.is_empty() {
                        config.tables = Some(tables);
                    }
                }
                "mode" => match Mode::parse(&value) {
                    Some(mode) => config.mode = Some(mode),
                    None => errors.push(ConfigError::UnknownMode(value)),
                },
                "diff" | "difficulty" => match Difficulty::parse(&value) {
                    Some(d) => difficulty = Some(d),
                    None => errors.push(ConfigError::UnknownDifficulty(value)),
                },
                "store" => match StoreKind::parse(&value) {
                    Some(kind) => config.store = kind,
                    None => errors.push(ConfigError::UnknownStore(value)),
                },
                "log" => match value.parse::<LevelFilter>() {
                    Ok(level) => config.log_level = level,
                    Err(_) => errors.push(ConfigError::UnknownLogLevel(value)),
                },
                _ => {}
            }
        }

        if config.tables.is_none() {
            config.tables = difficulty.map(Difficulty::tables);
        }
        (config, errors)
    }

    /// Overlay the URL choices on a setup restored from storage.
    pub fn apply_to(&self, setup: &mut Setup) {
        if let Some(ops) = &self.ops {
            setup.set_ops(ops);
        }
        if let Some(tables) = &self.tables {
            setup.set_tables(tables);
        }
        if let Some(mode) = self.mode {
            setup.mode = mode;
        }
    }
}

/// Form-style decoding: `+` is a space, then `%XX` escapes.
fn decode_value(raw: &str) -> Result<String, ConfigError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|v| v.into_owned())
        .map_err(|_| ConfigError::BadEncoding(raw.to_string()))
}

fn parse_op(s: &str) -> Result<Operation, ConfigError> {
    Operation::parse(s).ok_or_else(|| ConfigError::UnknownOperation(s.into()))
}

fn parse_table(s: &str) -> Result<u32, ConfigError> {
    match s.parse::<u32>() {
        Ok(t) if (1..=12).contains(&t) => Ok(t),
        _ => Err(ConfigError::BadTable(s.into())),
    }
}

fn parse_list<T: PartialEq>(
    value: &str,
    parse: impl Fn(&str) -> Result<T, ConfigError>,
    errors: &mut Vec<ConfigError>,
) -> Vec<T> {
    let mut out = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match parse(item) {
            Ok(v) if !out.contains(&v) => out.push(v),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_gives_defaults() {
        let (config, errors) = GameConfig::from_query("");
        assert_eq!(config, GameConfig::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn full_query() {
        let (config, errors) = GameConfig::from_query(
            "?ops=multiply,divide&tables=2%2C5,10&mode=practice&store=cookie&log=debug",
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            config.ops,
            Some(vec![Operation::Multiply, Operation::Divide])
        );
        assert_eq!(config.tables, Some(vec![2, 5, 10]));
        assert_eq!(config.mode, Some(Mode::Practice));
        assert_eq!(config.store, StoreKind::Cookie);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn bad_entries_are_reported_and_skipped() {
        let (config, errors) =
            GameConfig::from_query("ops=add,power&tables=0,3,x,13&mode=zen&store=disk");
        assert_eq!(config.ops, Some(vec![Operation::Add]));
        assert_eq!(config.tables, Some(vec![3]));
        assert_eq!(config.mode, None);
        assert_eq!(config.store, StoreKind::Local);
        assert_eq!(
            errors,
            vec![
                ConfigError::UnknownOperation("power".into()),
                ConfigError::BadTable("0".into()),
                ConfigError::BadTable("x".into()),
                ConfigError::BadTable("13".into()),
                ConfigError::UnknownMode("zen".into()),
                ConfigError::UnknownStore("disk".into()),
            ]
        );
    }

    #[test]
    fn percent_escapes_are_decoded() {
        let (config, errors) = GameConfig::from_query("?mode=time%2Dattack&ops=%61dd%2C%4Dultiply");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(config.mode, Some(Mode::TimeAttack));
        assert_eq!(config.ops, Some(vec![Operation::Add, Operation::Multiply]));

        let (config, _) = GameConfig::from_query("tables=2+%2C+5");
        assert_eq!(config.tables, Some(vec![2, 5]));
    }

    #[test]
    fn invalid_utf8_escape_is_reported() {
        let (config, errors) = GameConfig::from_query("ops=%FF&mode=practice");
        assert_eq!(config.ops, None);
        assert_eq!(config.mode, Some(Mode::Practice));
        assert_eq!(errors, vec![ConfigError::BadEncoding("%FF".into())]);
    }

    #[test]
    fn difficulty_fills_tables_unless_given() {
        let (config, _) = GameConfig::from_query("diff=cadet");
        assert_eq!(config.tables, Some(vec![1, 2, 3, 4, 5]));

        let (config, _) = GameConfig::from_query("tables=7&diff=pilot");
        assert_eq!(config.tables, Some(vec![7]));
    }

    #[test]
    fn apply_overrides_only_given_fields() {
        let (config, _) = GameConfig::from_query("ops=subtract");
        let mut setup = Setup::default();
        setup.set_tables(&[4]);
        setup.mode = Mode::Practice;
        config.apply_to(&mut setup);
        assert_eq!(setup.ops, vec![Operation::Subtract]);
        assert_eq!(setup.tables, vec![4]);
        assert_eq!(setup.mode, Mode::Practice);
    }

    #[test]
    fn error_messages_read_well() {
        assert_eq!(
            ConfigError::BadTable("13".into()).to_string(),
            "table `13` is not a number from 1 to 12"
        );
    }
}
