use clap::{Arg, Command};

pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_PROVIDER_API_KEY: &str = "provider-api-key";
pub const ARG_PROVIDER_NAME: &str = "provider-name";

/// External identity provider arguments.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long(ARG_PROVIDER_URL)
                .help("Base URL of the identity provider's token verification API")
                .default_value("https://identitytoolkit.googleapis.com")
                .env("BELEZO_PROVIDER_URL"),
        )
        .arg(
            Arg::new(ARG_PROVIDER_API_KEY)
                .long(ARG_PROVIDER_API_KEY)
                .help("API key passed to the identity provider on verification calls")
                .env("BELEZO_PROVIDER_API_KEY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_NAME)
                .long(ARG_PROVIDER_NAME)
                .help("Provider label recorded in verified claims")
                .default_value("firebase")
                .env("BELEZO_PROVIDER_NAME"),
        )
}
