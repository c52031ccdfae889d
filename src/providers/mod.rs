// =============================================================================
// Market Data Providers
// =============================================================================
//
// Outbound HTTP: daily price history and headline retrieval. Providers own
// the wire formats and normalisation quirks; nothing downstream of this
// module knows what the upstream JSON looks like.

pub mod history;
pub mod news;

pub use history::{ChartClient, MarketHistory, SymbolMeta};
pub use news::{NewsItem, NewsMode, NewsProvider, NewsQuery};

use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Some upstream endpoints reject requests without a browser user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Shared reqwest client configuration for every provider.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
}
