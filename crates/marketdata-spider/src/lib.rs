/// Analyst-consensus financial statements scraped from [Naver Finance], decoded, unpivoted and
/// reconciled against the latest stored snapshot.
///
/// [Naver Finance]: https://finance.naver.com/
pub mod consensus;

/// Error types shared by the spiders.
pub mod error;

/// Daily trading data for every stock listed on the Korea Exchange ([KRX]).
///
/// [KRX]: http://marketdata.krx.co.kr/
pub mod krx;

/// Console prompts used to pick record dates and download ranges.
pub mod prompt;

pub(crate) mod tui;

/// Shortcut for required API elements.
pub mod http {
    pub use deadpool_postgres::Pool as PgPool;
    pub use dotenv::var;
    pub use reqwest::Client as HttpClient;
}

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Build the HTTP client shared by every spider; the user agent can be overridden with the
/// `USER_AGENT` environment variable.
pub fn std_client_build() -> Result<http::HttpClient, reqwest::Error> {
    let user_agent = http::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
    reqwest::ClientBuilder::new()
        .user_agent(user_agent)
        .timeout(std::time::Duration::from_secs(30))
        .build()
}

pub(crate) fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:?}", time.elapsed())
}
