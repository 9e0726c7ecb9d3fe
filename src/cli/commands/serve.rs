use super::routes;
use clap::{Arg, ArgAction, Command};

pub const NAME: &str = "serve";
pub const ARG_PORT: &str = "port";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";
pub const ARG_COOKIE_MAX_AGE: &str = "cookie-max-age";

#[must_use]
pub fn command() -> Command {
    let command = Command::new(NAME)
        .about("Serve the handoff pages over HTTP")
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("HANDOFF_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long("cookie-secure")
                .help("Mark stored cookies Secure (frontend served over HTTPS)")
                .env("HANDOFF_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_COOKIE_MAX_AGE)
                .long("cookie-max-age")
                .help("Lifetime in seconds of the stored cookies")
                .default_value("31536000")
                .env("HANDOFF_COOKIE_MAX_AGE")
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    routes::with_args(command)
}
