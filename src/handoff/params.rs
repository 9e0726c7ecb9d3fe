//! Query-string parameters carried by a handoff URL.

use super::HandoffError;
use secrecy::SecretString;
use url::form_urlencoded;

pub const TOKEN_PARAM: &str = "token";
pub const PACKAGE_PARAM: &str = "package";

/// First value of `name` in `query`. Empty values count as absent.
fn query_param(query: &str, name: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Identifier of the client application that started the handoff.
#[must_use]
pub fn client_package(query: &str) -> Option<String> {
    query_param(query, PACKAGE_PARAM)
}

/// The short-lived account token.
///
/// # Errors
/// Returns [`HandoffError::MissingToken`] if the query has no usable `token`.
pub fn account_token(query: &str) -> Result<SecretString, HandoffError> {
    query_param(query, TOKEN_PARAM)
        .map(SecretString::from)
        .ok_or(HandoffError::MissingToken)
}
