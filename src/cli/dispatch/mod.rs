use crate::{
    cli::{
        actions::{Action, open, serve},
        commands::{self, routes as route_args},
    },
    config::HandoffConfig,
    handoff::Routes,
    store::CookieOptions,
};
use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

/// # Errors
/// Returns an error if required arguments are missing or fail validation.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((commands::serve::NAME, sub_m)) => {
            let port = sub_m
                .get_one::<u16>(commands::serve::ARG_PORT)
                .copied()
                .unwrap_or(8080);
            let cookies = CookieOptions {
                secure: sub_m.get_flag(commands::serve::ARG_COOKIE_SECURE),
                max_age_seconds: sub_m
                    .get_one::<u64>(commands::serve::ARG_COOKIE_MAX_AGE)
                    .copied()
                    .unwrap_or(CookieOptions::default().max_age_seconds),
            };

            Ok(Action::Serve(serve::Args {
                port,
                config: HandoffConfig::new(routes(sub_m)?, cookies),
            }))
        }
        Some((commands::open::NAME, sub_m)) => {
            let url = sub_m
                .get_one::<String>(commands::open::ARG_URL)
                .cloned()
                .context("missing required argument: <url>")?;
            let store = sub_m
                .get_one::<String>(commands::open::ARG_STORE)
                .map(PathBuf::from)
                .context("missing required argument: --store")?;

            Ok(Action::Open(open::Args {
                url,
                store,
                routes: routes(sub_m)?,
            }))
        }
        Some((name, _)) => Err(anyhow!("unknown command: {name}")),
        None => Err(anyhow!("missing command")),
    }
}

fn routes(matches: &clap::ArgMatches) -> Result<Routes> {
    let value = |name: &str| {
        matches
            .get_one::<String>(name)
            .cloned()
            .with_context(|| format!("missing required argument: --{name}"))
    };

    Routes::new(
        &value(route_args::ARG_SUCCESS_PATH)?,
        &value(route_args::ARG_FAILURE_PATH)?,
        &value(route_args::ARG_DESKTOP_URL)?,
    )
    .context("invalid navigation routes")
}
