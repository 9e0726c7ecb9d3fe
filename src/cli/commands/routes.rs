use crate::config::{DEFAULT_DESKTOP_URL, DEFAULT_FAILURE_PATH, DEFAULT_SUCCESS_PATH};
use clap::{Arg, Command};

pub const ARG_SUCCESS_PATH: &str = "success-path";
pub const ARG_FAILURE_PATH: &str = "failure-path";
pub const ARG_DESKTOP_URL: &str = "desktop-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SUCCESS_PATH)
                .long("success-path")
                .help("In-app path reached after a successful handoff")
                .default_value(DEFAULT_SUCCESS_PATH)
                .env("HANDOFF_SUCCESS_PATH"),
        )
        .arg(
            Arg::new(ARG_FAILURE_PATH)
                .long("failure-path")
                .help("In-app path reached when the handoff fails")
                .default_value(DEFAULT_FAILURE_PATH)
                .env("HANDOFF_FAILURE_PATH"),
        )
        .arg(
            Arg::new(ARG_DESKTOP_URL)
                .long("desktop-url")
                .help("Desktop app URL that receives the query on desktop redirects")
                .default_value(DEFAULT_DESKTOP_URL)
                .env("HANDOFF_DESKTOP_URL"),
        )
}
