//! Local key-value store holding the persisted account state.
//!
//! The handoff flow never talks to a concrete storage backend. It receives a
//! [`KeyValueStore`] and reads or writes JSON records under a small set of
//! well-known keys:
//!
//! - [`StoreKey::User`] (`user`): the account record. Only the `token` field is
//!   owned by the handoff; every other field belongs to whoever wrote it first.
//! - [`StoreKey::ClientPackage`] (`clientPackage`): `{ "name": <package> }`,
//!   written only when the inbound URL names a client package.
//!
//! Three backends are provided: [`MemoryStore`] for tests and embedding,
//! [`FileStore`] for desktop deep-link handlers, and [`CookieStore`] which maps
//! records onto the browser cookie jar for the HTTP service.

mod cookie;
mod file;
mod memory;

pub use self::cookie::{CookieOptions, CookieStore, MAX_COOKIE_BYTES};
pub use self::file::FileStore;
pub use self::memory::MemoryStore;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Well-known keys of the local store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    User,
    ClientPackage,
}

impl StoreKey {
    pub const ALL: [Self; 2] = [Self::User, Self::ClientPackage];

    /// Name used by the backends (file object key, cookie name).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ClientPackage => "clientPackage",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid encoding for record {key}")]
    Encoding { key: StoreKey },
    #[error("store file {} does not hold a json object", .path.display())]
    Corrupted { path: PathBuf },
    #[error("record {key} exceeds the storage quota ({size} bytes)")]
    QuotaExceeded { key: StoreKey, size: usize },
    #[error("record {key} cannot be encoded for storage")]
    InvalidValue { key: StoreKey },
}

/// Get/set capability over the local store.
pub trait KeyValueStore {
    /// Returns the raw record stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read or the stored record
    /// cannot be decoded.
    fn get(&self, key: StoreKey) -> Result<Option<Value>, StoreError>;

    /// Stores `value` under `key`, replacing any previous record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be encoded or written.
    fn set(&mut self, key: StoreKey, value: &Value) -> Result<(), StoreError>;

    /// Removes the record stored under `key`. Removing a missing record is not
    /// an error.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError>;
}

/// Reads and decodes a typed record. A stored `null` counts as absent.
///
/// # Errors
/// Returns an error if the backend fails or the record has the wrong shape.
pub fn get_data<T, S>(store: &S, key: StoreKey) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Encodes and stores a typed record.
///
/// # Errors
/// Returns an error if the record cannot be encoded or written.
pub fn set_data<T, S>(store: &mut S, key: StoreKey, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let value = serde_json::to_value(value)?;
    store.set(key, &value)
}

/// The persisted account record.
///
/// Fields other than `token` are carried through untouched so a handoff never
/// drops data written by a previous session.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(Map<String, Value>);

impl UserRecord {
    const TOKEN_FIELD: &'static str = "token";

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.0.get(Self::TOKEN_FIELD).and_then(Value::as_str)
    }

    pub fn set_token(&mut self, token: &str) {
        self.0
            .insert(Self::TOKEN_FIELD.to_string(), Value::String(token.to_string()));
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// The token is a bearer credential; keep it out of logs.
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.0 {
            if name == Self::TOKEN_FIELD {
                map.entry(name, &"[REDACTED]");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

/// Identifier of the client application that started the handoff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPackage {
    pub name: String,
}
