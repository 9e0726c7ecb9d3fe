use crate::{
    config::HandoffConfig,
    handoff::{NavigationRecorder, open_desktop},
};
use axum::{
    extract::{Extension, RawQuery},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, LOCATION},
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

#[utoipa::path(
    get,
    path = "/desktop-redirect",
    responses(
        (status = 303, description = "Redirect to the desktop app, carrying the query string")
    ),
    tag = "handoff"
)]
/// Hand the current query over to the desktop app.
pub async fn desktop_redirect(
    config: Extension<Arc<HandoffConfig>>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let mut navigator = NavigationRecorder::new();
    let destination = open_desktop(&config.routes, query.as_deref(), &mut navigator);

    let location = destination.location(&config.routes);
    let Ok(location) = HeaderValue::from_str(&location) else {
        error!("Invalid desktop redirect location");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, location);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    (StatusCode::SEE_OTHER, headers).into_response()
}
