//! Cookie jar backend for the HTTP service.
//!
//! Each record lives in a cookie named after its [`StoreKey`]; the value is the
//! record's JSON encoded as unpadded base64url so it never needs quoting. Writes
//! are collected as `Set-Cookie` headers for the response and are visible to
//! later reads in the same request.
//!
//! The cookies are readable by the frontend on purpose: they stand in for the
//! page's local storage, which the frontend reads directly.

use super::{KeyValueStore, StoreError, StoreKey};
use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Largest `name=value` pair browsers are required to keep.
pub const MAX_COOKIE_BYTES: usize = 4096;

const DEFAULT_MAX_AGE_SECONDS: u64 = 60 * 60 * 24 * 365;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    /// Add the `Secure` attribute; enable when the frontend is served over HTTPS.
    pub secure: bool,
    pub max_age_seconds: u64,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            secure: false,
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }
}

#[derive(Debug)]
pub struct CookieStore {
    options: CookieOptions,
    values: BTreeMap<StoreKey, String>,
    pending: BTreeMap<StoreKey, HeaderValue>,
}

impl CookieStore {
    /// Builds a store from the request's `Cookie` headers. Cookies that do not
    /// belong to a [`StoreKey`] are ignored.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, options: CookieOptions) -> Self {
        let mut values = BTreeMap::new();

        for header in headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for pair in header.split(';') {
                let mut parts = pair.trim().splitn(2, '=');
                let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                    continue;
                };
                if let Some(key) = StoreKey::from_name(name.trim()) {
                    // First occurrence wins, matching how browsers order cookies
                    // by path specificity.
                    values
                        .entry(key)
                        .or_insert_with(|| value.trim().to_string());
                }
            }
        }

        Self {
            options,
            values,
            pending: BTreeMap::new(),
        }
    }

    /// `Set-Cookie` values for every record written or removed so far.
    pub fn set_cookie_headers(&self) -> impl Iterator<Item = &HeaderValue> {
        self.pending.values()
    }

    #[must_use]
    pub fn into_set_cookie_headers(self) -> Vec<HeaderValue> {
        self.pending.into_values().collect()
    }

    fn cookie(&self, key: StoreKey, value: &str, max_age: u64) -> Result<HeaderValue, StoreError> {
        let mut cookie = format!(
            "{}={value}; Path=/; SameSite=Lax; Max-Age={max_age}",
            key.as_str()
        );
        if self.options.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|_| StoreError::InvalidValue { key })
    }
}

impl KeyValueStore for CookieStore {
    fn get(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        let Some(raw) = self.values.get(&key) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let bytes = Base64UrlUnpadded::decode_vec(raw).map_err(|_| StoreError::Encoding { key })?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn set(&mut self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_vec(value)?;
        let encoded = Base64UrlUnpadded::encode_string(&json);

        let size = key.as_str().len() + 1 + encoded.len();
        if size > MAX_COOKIE_BYTES {
            return Err(StoreError::QuotaExceeded { key, size });
        }

        let cookie = self.cookie(key, &encoded, self.options.max_age_seconds)?;
        debug!("Storing record {key} in cookie ({size} bytes)");
        self.pending.insert(key, cookie);
        self.values.insert(key, encoded);
        Ok(())
    }

    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
        let cookie = self.cookie(key, "", 0)?;
        self.pending.insert(key, cookie);
        self.values.remove(&key);
        Ok(())
    }
}
