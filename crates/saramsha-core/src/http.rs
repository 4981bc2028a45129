//! Shared HTTP client.

use once_cell::sync::OnceCell;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("saramsha/", env!("CARGO_PKG_VERSION"));

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// Build a new client with the crate's connect timeout and user agent.
///
/// No overall request timeout is set: uploads of long recordings and slow
/// generations are bounded by cancellation instead.
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
}

/// Process-wide client for connection pooling. Built on first use.
pub fn shared_client() -> reqwest::Result<&'static reqwest::Client> {
    HTTP_CLIENT.get_or_try_init(build_client)
}
