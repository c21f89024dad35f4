pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        frontend_url: String,
        signing_key: SecretString,
        session_ttl_seconds: i64,
        provider_url: String,
        provider_api_key: SecretString,
        provider_name: String,
    },
}
