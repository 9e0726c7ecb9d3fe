//! Account handoff page. The browser cookie jar plays the part of local
//! storage and navigation is a `303 See Other` redirect.

use crate::{
    config::HandoffConfig,
    handoff::{AccountHandoff, NavigationRecorder},
    store::CookieStore,
};
use axum::{
    extract::{Extension, RawQuery},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, LOCATION, SET_COOKIE},
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error};

#[utoipa::path(
    get,
    path = "/passkeys/setup",
    params(
        ("token" = Option<String>, Query, description = "Short-lived account token"),
        ("package" = Option<String>, Query, description = "Client package that started the handoff"),
    ),
    responses(
        (status = 303, description = "Redirect to passkey management, or to login when the handoff fails")
    ),
    tag = "handoff"
)]
pub async fn account_handoff(
    config: Extension<Arc<HandoffConfig>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    let query = query.unwrap_or_default();
    let mut store = CookieStore::from_headers(&headers, config.cookies.clone());
    let mut navigator = NavigationRecorder::new();

    // Every request is a fresh page activation.
    let outcome = AccountHandoff::new().activate(&query, &mut store, &mut navigator);

    if let Some(package) = outcome
        .as_ref()
        .and_then(|outcome| outcome.client.client_package())
    {
        debug!("Handoff tagged with client package {package}");
    }
    let Some(destination) = navigator.into_destination() else {
        error!("Handoff finished without a destination");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let location = destination.location(&config.routes);
    let Ok(location) = HeaderValue::from_str(&location) else {
        error!("Invalid redirect location: {location}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let mut response_headers = HeaderMap::new();
    response_headers.insert(LOCATION, location);
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    for cookie in store.into_set_cookie_headers() {
        response_headers.append(SET_COOKIE, cookie);
    }

    (StatusCode::SEE_OTHER, response_headers).into_response()
}
