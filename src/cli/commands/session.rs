use clap::{Arg, Command};

pub const ARG_SESSION_SIGNING_KEY: &str = "session-signing-key";
pub const ARG_SESSION_TTL: &str = "session-ttl";

/// Session token arguments.
///
/// The signing key is process-wide state: it is read once at startup and every
/// issued token is bound to it, so rotating it invalidates outstanding
/// sessions.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SIGNING_KEY)
                .long(ARG_SESSION_SIGNING_KEY)
                .help("Secret key used to sign session tokens (HS256)")
                .env("BELEZO_SESSION_SIGNING_KEY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session token lifetime in seconds")
                .default_value("28800")
                .env("BELEZO_SESSION_TTL")
                .value_parser(clap::value_parser!(i64)),
        )
}
