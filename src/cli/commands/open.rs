use super::routes;
use clap::{Arg, Command};

pub const NAME: &str = "open";
pub const ARG_URL: &str = "url";
pub const ARG_STORE: &str = "store";

#[must_use]
pub fn command() -> Command {
    let command = Command::new(NAME)
        .about("Run the account handoff for a URL against a local JSON store")
        .arg(
            Arg::new(ARG_URL)
                .help("Handoff URL carrying `token` and optionally `package`")
                .required(true),
        )
        .arg(
            Arg::new(ARG_STORE)
                .short('s')
                .long("store")
                .help("Path of the JSON file used as local storage")
                .env("HANDOFF_STORE")
                .required(true),
        );

    routes::with_args(command)
}
