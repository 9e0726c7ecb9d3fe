use crate::store::{ClientPackage, KeyValueStore, StoreError, StoreKey, get_data};

/// Header naming the client application on whose behalf a request is made.
pub const CLIENT_PACKAGE_HEADER: &str = "X-Client-Package";

/// Request-scoped client identity.
///
/// Every outbound request receives the context explicitly, so two handoffs for
/// different clients never share header state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientContext {
    client_package: Option<String>,
}

impl ClientContext {
    #[must_use]
    pub fn new(client_package: Option<String>) -> Self {
        Self {
            client_package: client_package.filter(|package| !package.is_empty()),
        }
    }

    #[must_use]
    pub fn with_client_package(self, client_package: impl Into<String>) -> Self {
        Self::new(Some(client_package.into()))
    }

    /// Restores the context from the persisted client package record.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the record is malformed.
    pub fn from_store<S>(store: &S) -> Result<Self, StoreError>
    where
        S: KeyValueStore + ?Sized,
    {
        let package: Option<ClientPackage> = get_data(store, StoreKey::ClientPackage)?;
        Ok(Self::new(package.map(|package| package.name)))
    }

    #[must_use]
    pub fn client_package(&self) -> Option<&str> {
        self.client_package.as_deref()
    }

    /// Headers to attach to each request made within this context.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        self.client_package
            .iter()
            .map(|package| (CLIENT_PACKAGE_HEADER.to_string(), package.clone()))
            .collect()
    }
}
