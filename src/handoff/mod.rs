//! Account handoff: moves an authenticated session into this app through a URL
//! that carries a short-lived `token` and an optional client `package`.
//!
//! ## Flow
//!
//! 1. **Client package** (best effort): when `package` is present, persist
//!    `{ name }` as the client package record and tag the returned
//!    [`ClientContext`] with it. Failures here never change the outcome.
//! 2. **Account token**: a missing `token` fails the handoff. Otherwise the
//!    user record is read (empty if absent), its `token` field overwritten and
//!    the record written back. Other fields of the record are kept.
//! 3. **Navigate**: passkey management on success; on any failure the error is
//!    logged and the user is sent to login instead.
//!
//! A page activates the flow once. [`AccountHandoff`] moves from
//! [`HandoffState::Pending`] to [`HandoffState::Redirected`] on the first
//! activation and ignores any later one.

mod desktop;
mod navigation;
pub mod params;

pub use self::desktop::{desktop_redirect, open_desktop};
pub use self::navigation::{Destination, NavigationRecorder, Navigator, Routes};

use crate::{
    client::ClientContext,
    store::{ClientPackage, KeyValueStore, StoreError, StoreKey, UserRecord, get_data, set_data},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("token not found")]
    MissingToken,
    #[error("failed to store account data: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandoffState {
    Pending,
    Redirected(Destination),
}

/// Result of a single activation.
#[derive(Debug)]
pub struct HandoffOutcome {
    pub destination: Destination,
    /// Context to thread into every request issued on behalf of this handoff.
    pub client: ClientContext,
    /// Why the handoff fell back to login, if it did.
    pub error: Option<HandoffError>,
}

impl HandoffOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct AccountHandoff {
    state: HandoffState,
}

impl Default for AccountHandoff {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountHandoff {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: HandoffState::Pending,
        }
    }

    #[must_use]
    pub fn state(&self) -> &HandoffState {
        &self.state
    }

    /// Runs the handoff for the page's `query` string.
    ///
    /// Returns `None` when the page was already redirected; the store and
    /// navigator are left untouched in that case.
    #[instrument(skip_all)]
    pub fn activate<S, N>(
        &mut self,
        query: &str,
        store: &mut S,
        navigator: &mut N,
    ) -> Option<HandoffOutcome>
    where
        S: KeyValueStore + ?Sized,
        N: Navigator + ?Sized,
    {
        if let HandoffState::Redirected(destination) = &self.state {
            debug!("Handoff already redirected to {destination:?}, ignoring activation");
            return None;
        }

        let client = extract_client_package(query, store);

        let (destination, error) = match extract_account_token(query, store) {
            Ok(()) => (Destination::PasskeySetup, None),
            Err(err) => {
                error!("Failed to store handed-off account data: {err}");
                (Destination::Login, Some(err))
            }
        };

        navigator.navigate(&destination);
        self.state = HandoffState::Redirected(destination.clone());

        Some(HandoffOutcome {
            destination,
            client,
            error,
        })
    }
}

fn extract_client_package<S>(query: &str, store: &mut S) -> ClientContext
where
    S: KeyValueStore + ?Sized,
{
    let Some(package) = params::client_package(query) else {
        return ClientContext::default();
    };

    let record = ClientPackage {
        name: package.clone(),
    };
    if let Err(err) = set_data(store, StoreKey::ClientPackage, &record) {
        warn!("Failed to store client package {package}: {err}");
    }

    ClientContext::default().with_client_package(package)
}

fn extract_account_token<S>(query: &str, store: &mut S) -> Result<(), HandoffError>
where
    S: KeyValueStore + ?Sized,
{
    let token = params::account_token(query)?;

    let mut user: UserRecord = get_data(&*store, StoreKey::User)?.unwrap_or_default();
    user.set_token(token.expose_secret());
    set_data(store, StoreKey::User, &user)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::{Value, json};
    use std::{
        io,
        sync::{Arc, Mutex, PoisonError},
    };
    use tracing::Level;
    use tracing_subscriber::fmt::MakeWriter;

    /// Writer collecting formatted log output into a shared buffer.
    #[derive(Clone, Default)]
    struct CapturedLogs {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&buffer).into_owned()
        }

        fn lines_at(&self, level: &str) -> usize {
            self.contents()
                .lines()
                .filter(|line| line.split_whitespace().next() == Some(level))
                .count()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn run_logged(
        query: &str,
        store: &mut dyn KeyValueStore,
    ) -> (HandoffOutcome, NavigationRecorder, CapturedLogs) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(Level::TRACE)
            .finish();

        let (outcome, navigator) =
            tracing::subscriber::with_default(subscriber, || run(query, store));
        (outcome, navigator, logs)
    }

    /// Memory store that refuses writes to selected keys.
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        read_only: Vec<StoreKey>,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
            if self.read_only.contains(&key) {
                return Err(StoreError::QuotaExceeded { key, size: 0 });
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    fn run(query: &str, store: &mut dyn KeyValueStore) -> (HandoffOutcome, NavigationRecorder) {
        let mut handoff = AccountHandoff::new();
        let mut navigator = NavigationRecorder::new();
        let outcome = handoff.activate(query, store, &mut navigator);
        assert!(matches!(handoff.state(), HandoffState::Redirected(_)));
        match outcome {
            Some(outcome) => (outcome, navigator),
            None => panic!("first activation must produce an outcome"),
        }
    }

    #[test]
    fn token_only_persists_user_and_redirects_to_passkeys() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        let (outcome, navigator) = run("?token=abc123", &mut store);

        assert!(outcome.is_success());
        assert_eq!(outcome.destination, Destination::PasskeySetup);
        assert_eq!(navigator.destination(), Some(&Destination::PasskeySetup));
        assert_eq!(navigator.calls(), 1);
        assert_eq!(store.get(StoreKey::User)?, Some(json!({"token": "abc123"})));
        assert!(!store.contains(StoreKey::ClientPackage));
        assert_eq!(outcome.client.client_package(), None);
        Ok(())
    }

    #[test]
    fn token_and_package_tag_the_client() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        let (outcome, navigator) = run("?token=abc123&package=com.example.app", &mut store);

        assert!(outcome.is_success());
        assert_eq!(navigator.destination(), Some(&Destination::PasskeySetup));
        assert_eq!(store.get(StoreKey::User)?, Some(json!({"token": "abc123"})));
        assert_eq!(
            store.get(StoreKey::ClientPackage)?,
            Some(json!({"name": "com.example.app"}))
        );
        assert_eq!(outcome.client.client_package(), Some("com.example.app"));
        assert_eq!(
            outcome.client.headers(),
            vec![("X-Client-Package".to_string(), "com.example.app".to_string())]
        );
        Ok(())
    }

    #[test]
    fn missing_token_falls_back_to_login() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        let (outcome, navigator) = run("", &mut store);

        assert!(matches!(outcome.error, Some(HandoffError::MissingToken)));
        assert_eq!(outcome.destination, Destination::Login);
        assert_eq!(navigator.destination(), Some(&Destination::Login));
        assert_eq!(navigator.calls(), 1);
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn missing_token_leaves_existing_user_untouched() -> Result<(), StoreError> {
        let existing = json!({"email": "ana@example.com", "token": "previous"});
        let mut store = MemoryStore::new();
        store.set(StoreKey::User, &existing)?;

        let (outcome, _) = run("?package=com.example.app", &mut store);

        assert!(matches!(outcome.error, Some(HandoffError::MissingToken)));
        assert_eq!(store.get(StoreKey::User)?, Some(existing));
        // The package step runs before the token step and is independent of it.
        assert_eq!(
            store.get(StoreKey::ClientPackage)?,
            Some(json!({"name": "com.example.app"}))
        );
        assert_eq!(outcome.client.client_package(), Some("com.example.app"));
        Ok(())
    }

    #[test]
    fn existing_user_fields_are_preserved() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        store.set(
            StoreKey::User,
            &json!({"email": "ana@example.com", "id": 7, "token": "stale"}),
        )?;

        let (outcome, _) = run("token=fresh", &mut store);

        assert!(outcome.is_success());
        assert_eq!(
            store.get(StoreKey::User)?,
            Some(json!({"email": "ana@example.com", "id": 7, "token": "fresh"}))
        );
        Ok(())
    }

    #[test]
    fn repeated_runs_are_idempotent() -> Result<(), StoreError> {
        let mut once = MemoryStore::new();
        run("token=abc123&package=pkg", &mut once);

        let mut twice = MemoryStore::new();
        run("token=abc123&package=pkg", &mut twice);
        run("token=abc123&package=pkg", &mut twice);

        for key in StoreKey::ALL {
            assert_eq!(once.get(key)?, twice.get(key)?);
        }
        Ok(())
    }

    #[test]
    fn second_activation_is_ignored() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        let mut handoff = AccountHandoff::new();
        let mut navigator = NavigationRecorder::new();

        assert!(handoff.activate("token=first", &mut store, &mut navigator).is_some());
        assert!(handoff.activate("token=second", &mut store, &mut navigator).is_none());

        assert_eq!(navigator.calls(), 1);
        assert_eq!(
            handoff.state(),
            &HandoffState::Redirected(Destination::PasskeySetup)
        );
        assert_eq!(store.get(StoreKey::User)?, Some(json!({"token": "first"})));
        Ok(())
    }

    #[test]
    fn user_write_failure_falls_back_to_login() -> Result<(), StoreError> {
        let mut store = FailingStore {
            read_only: vec![StoreKey::User],
            ..FailingStore::default()
        };

        let (outcome, navigator) = run("token=abc123&package=pkg", &mut store);

        assert!(matches!(
            outcome.error,
            Some(HandoffError::Store(StoreError::QuotaExceeded { .. }))
        ));
        assert_eq!(navigator.destination(), Some(&Destination::Login));
        assert_eq!(store.get(StoreKey::User)?, None);
        Ok(())
    }

    #[test]
    fn corrupted_user_record_falls_back_to_login() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        store.set(StoreKey::User, &json!(["not", "an", "object"]))?;

        let (outcome, navigator) = run("token=abc123", &mut store);

        assert!(matches!(
            outcome.error,
            Some(HandoffError::Store(StoreError::Json(_)))
        ));
        assert_eq!(navigator.destination(), Some(&Destination::Login));
        Ok(())
    }

    #[test]
    fn package_write_failure_is_not_fatal() -> Result<(), StoreError> {
        let mut store = FailingStore {
            read_only: vec![StoreKey::ClientPackage],
            ..FailingStore::default()
        };

        let (outcome, navigator) = run("token=abc123&package=pkg", &mut store);

        assert!(outcome.is_success());
        assert_eq!(navigator.destination(), Some(&Destination::PasskeySetup));
        assert_eq!(outcome.client.client_package(), Some("pkg"));
        assert_eq!(store.get(StoreKey::User)?, Some(json!({"token": "abc123"})));
        assert_eq!(store.get(StoreKey::ClientPackage)?, None);
        Ok(())
    }

    #[test]
    fn whitespace_package_is_recorded_and_tagged() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        let (outcome, _) = run("token=abc&package=%20", &mut store);

        assert!(outcome.is_success());
        assert_eq!(store.get(StoreKey::ClientPackage)?, Some(json!({"name": " "})));
        assert_eq!(outcome.client.client_package(), Some(" "));
        assert_eq!(
            outcome.client.headers(),
            vec![("X-Client-Package".to_string(), " ".to_string())]
        );
        Ok(())
    }

    #[test]
    fn missing_token_logs_one_error() {
        let mut store = MemoryStore::new();
        let (outcome, _, logs) = run_logged("package=com.example.app", &mut store);

        assert!(matches!(outcome.error, Some(HandoffError::MissingToken)));
        assert_eq!(logs.lines_at("ERROR"), 1);
        assert!(logs.contents().contains("token not found"));
    }

    #[test]
    fn successful_handoff_logs_no_error() {
        let mut store = MemoryStore::new();
        let (outcome, _, logs) = run_logged("token=abc123", &mut store);

        assert!(outcome.is_success());
        assert_eq!(logs.lines_at("ERROR"), 0);
    }

    #[test]
    fn storage_failure_log_omits_token() {
        let mut store = FailingStore {
            read_only: vec![StoreKey::User],
            ..FailingStore::default()
        };
        let (outcome, _, logs) = run_logged("token=s3cr3t-handoff-token", &mut store);

        assert!(matches!(outcome.error, Some(HandoffError::Store(_))));
        assert_eq!(logs.lines_at("ERROR"), 1);
        assert!(!logs.contents().contains("s3cr3t-handoff-token"));
    }
}
