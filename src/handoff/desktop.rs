//! Desktop redirect: hands the current page's query over to the desktop app
//! through its URL scheme.

use super::{Destination, Navigator, Routes};
use tracing::debug;
use url::Url;

/// Returns `desktop_url` with its query replaced by `query`, verbatim. An
/// empty query removes the `?` entirely.
#[must_use]
pub fn desktop_redirect(desktop_url: &Url, query: Option<&str>) -> Url {
    let query = query
        .map(|query| query.strip_prefix('?').unwrap_or(query))
        .filter(|query| !query.is_empty());

    let mut target = desktop_url.clone();
    target.set_query(query);
    target
}

/// Navigates to the desktop app, carrying the current query along.
pub fn open_desktop<N>(routes: &Routes, query: Option<&str>, navigator: &mut N) -> Destination
where
    N: Navigator + ?Sized,
{
    let target = desktop_redirect(routes.desktop_url(), query);
    debug!("Redirecting to desktop app at {}", target.scheme());

    let destination = Destination::External(target);
    navigator.navigate(&destination);
    destination
}
