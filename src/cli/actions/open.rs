use crate::{
    handoff::{AccountHandoff, NavigationRecorder, Routes},
    store::FileStore,
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub url: String,
    pub store: PathBuf,
    pub routes: Routes,
}

/// Execute the open action and print where the user goes next.
///
/// A failed handoff still exits successfully: the fallback to login is the
/// expected outcome, not a process failure.
/// # Errors
/// Returns an error if the URL cannot be parsed.
pub fn execute(args: &Args) -> Result<()> {
    let location = run(args)?;
    println!("{location}");
    Ok(())
}

/// Runs the handoff and returns the resolved location.
/// # Errors
/// Returns an error if the URL cannot be parsed.
pub fn run(args: &Args) -> Result<String> {
    let url = Url::parse(args.url.trim()).context("invalid handoff url")?;
    let query = url.query().unwrap_or_default();

    let mut store = FileStore::new(&args.store);
    let mut navigator = NavigationRecorder::new();
    let outcome = AccountHandoff::new().activate(query, &mut store, &mut navigator);

    if let Some(package) = outcome
        .as_ref()
        .and_then(|outcome| outcome.client.client_package())
    {
        info!("Handoff requested by client package {package}");
    }

    let destination = navigator
        .into_destination()
        .context("handoff finished without a destination")?;

    Ok(destination.location(&args.routes))
}
