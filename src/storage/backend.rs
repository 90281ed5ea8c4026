//! Key-value backends: browser localStorage, document cookies, and an
//! in-memory map for native runs and tests.

use std::collections::HashMap;

use super::{KeyValueStore, Result, StorageError};

/// One year, matching how long the browser keeps progress cookies.
pub const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;
/// Browsers cap a single cookie near 4KB including the name.
pub const COOKIE_VALUE_LIMIT: usize = 4000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    Local,
    Cookie,
    Memory,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Local => "local",
            StoreKind::Cookie => "cookie",
            StoreKind::Memory => "memory",
        }
    }

    pub fn parse(s: &str) -> Option<StoreKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "localstorage" => Some(StoreKind::Local),
            "cookie" | "cookies" => Some(StoreKind::Cookie),
            "memory" | "none" => Some(StoreKind::Memory),
            _ => None,
        }
    }
}

pub fn open(kind: StoreKind) -> Result<Box<dyn KeyValueStore>> {
    match kind {
        StoreKind::Memory => Ok(Box::new(MemoryStorage::default())),
        #[cfg(target_arch = "wasm32")]
        StoreKind::Local => Ok(Box::new(LocalStorage::open()?)),
        #[cfg(target_arch = "wasm32")]
        StoreKind::Cookie => Ok(Box::new(CookieStorage::open()?)),
        #[cfg(not(target_arch = "wasm32"))]
        StoreKind::Local | StoreKind::Cookie => Err(StorageError::Unavailable(format!(
            "{} storage needs a browser",
            kind.as_str()
        ))),
    }
}

// ── Memory ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ── localStorage ──────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn open() -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".into()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })
    }
}

// ── Cookies ───────────────────────────────────────────────────────────

/// Find the raw (still URI-encoded) value of `name` in a `document.cookie` header.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

pub fn cookie_assignment(name: &str, encoded_value: &str, max_age_secs: u64) -> String {
    format!("{name}={encoded_value}; max-age={max_age_secs}; path=/; SameSite=Lax")
}

pub fn encode_cookie_value(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Also accepts values written with JS `encodeURIComponent`.
pub fn decode_cookie_value(key: &str, raw: &str) -> Result<String> {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .map_err(|e| StorageError::Unavailable(format!("cookie {key} is not UTF-8: {e}")))
}

/// Whether `value` stored under `key` stays within one cookie once encoded.
pub fn cookie_fits(key: &str, value: &str) -> bool {
    key.len() + encode_cookie_value(value).len() <= COOKIE_VALUE_LIMIT
}

#[cfg(target_arch = "wasm32")]
pub struct CookieStorage {
    document: web_sys::Document,
}

#[cfg(target_arch = "wasm32")]
impl CookieStorage {
    pub fn open() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| StorageError::Unavailable("no document".into()))?;
        Ok(Self { document })
    }

    fn header(&self) -> Result<String> {
        js_sys::Reflect::get(&self.document, &"cookie".into())
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .as_string()
            .ok_or_else(|| StorageError::Unavailable("document.cookie is not a string".into()))
    }

    fn assign(&self, key: &str, assignment: &str) -> Result<()> {
        js_sys::Reflect::set(&self.document, &"cookie".into(), &assignment.into())
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })?;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for CookieStorage {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let header = self.header()?;
        find_cookie(&header, key)
            .map(|raw| decode_cookie_value(key, raw))
            .transpose()
    }

    fn fits(&self, key: &str, value: &str) -> bool {
        cookie_fits(key, value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let encoded = encode_cookie_value(value);
        if key.len() + encoded.len() > COOKIE_VALUE_LIMIT {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                len: encoded.len(),
                limit: COOKIE_VALUE_LIMIT,
            });
        }
        self.assign(key, &cookie_assignment(key, &encoded, COOKIE_MAX_AGE_SECS))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.assign(key, &cookie_assignment(key, "", 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_roundtrip() {
        let mut store = MemoryStorage::default();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn find_cookie_matches_exact_name() {
        let header = "theme=dark; math-craft-current-user=jake; math-craft-current-user-x=1";
        assert_eq!(find_cookie(header, "math-craft-current-user"), Some("jake"));
        assert_eq!(find_cookie(header, "theme"), Some("dark"));
        assert_eq!(find_cookie(header, "math-craft"), None);
        assert_eq!(find_cookie("", "theme"), None);
    }

    #[test]
    fn find_cookie_keeps_equals_in_value() {
        assert_eq!(find_cookie("a=b=c", "a"), Some("b=c"));
    }

    #[test]
    fn cookie_assignment_format() {
        assert_eq!(
            cookie_assignment("k", "%5B%5D", 60),
            "k=%5B%5D; max-age=60; path=/; SameSite=Lax"
        );
    }

    #[test]
    fn cookie_value_roundtrip() {
        let json = r#"[{"id":"a b","details":"Mixed (× ÷) · Tables 2,5"}]"#;
        let encoded = encode_cookie_value(json);
        assert!(!encoded.contains(';') && !encoded.contains(' '), "{encoded}");
        assert_eq!(decode_cookie_value("k", &encoded).unwrap(), json);
        // encodeURIComponent leaves `(`, `)` and `!` alone
        assert_eq!(decode_cookie_value("k", "(a)!%2C").unwrap(), "(a)!,");
    }

    #[test]
    fn cookie_fits_counts_encoded_bytes() {
        let key = "math-craft-history";
        let plain = "a".repeat(COOKIE_VALUE_LIMIT - key.len());
        assert!(cookie_fits(key, &plain));
        assert!(!cookie_fits(key, &format!("{plain}a")));
        // each `"` becomes `%22`
        let quotes = "\"".repeat((COOKIE_VALUE_LIMIT - key.len()) / 3 + 1);
        assert!(!cookie_fits(key, &quotes));
    }

    #[test]
    fn store_kind_parse() {
        assert_eq!(StoreKind::parse("Cookie"), Some(StoreKind::Cookie));
        assert_eq!(StoreKind::parse("localStorage"), Some(StoreKind::Local));
        assert_eq!(StoreKind::parse("disk"), None);
    }

    #[test]
    fn native_open_falls_back_only_for_memory() {
        assert!(open(StoreKind::Memory).is_ok());
        assert!(matches!(
            open(StoreKind::Local),
            Err(StorageError::Unavailable(_))
        ));
    }
}
