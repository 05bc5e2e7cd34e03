use chrono::{Local, NaiveDate};
use deadpool_postgres::{ManagerConfig, RecyclingMethod};
use dotenv::var;
use marketdata_spider::consensus::{self, MemoryStore, NaverFetcher, PgStore, Report, Request};
use marketdata_spider::krx::{latest_trading_day, market_data};
use marketdata_spider::{http::PgPool, prompt, std_client_build};
use tracing::{debug, info, trace, warn};

/// Build the postgres connection pool from `MARKETDATA_URL`.
fn connect() -> anyhow::Result<PgPool> {
    trace!("creating postgres connection pool config");
    let mut pg_config = deadpool_postgres::Config::new();
    pg_config.url = Some(var("MARKETDATA_URL")?);
    pg_config.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    trace!("creating marketdata connection pool");
    let pool = pg_config.create_pool(
        Some(deadpool_postgres::Runtime::Tokio1),
        tokio_postgres::NoTls,
    )?;
    debug!("marketdata connection pool established");

    Ok(pool)
}

/// Scrape the consensus of every ticker, appending only what changed since the last snapshot.
pub(crate) async fn consensus(
    request: Request,
    update_date: Option<NaiveDate>,
    tickers: Option<Vec<String>>,
    dry_run: bool,
    tui: bool,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let today = Local::now().date_naive();
    let http_client = std_client_build()?;

    // tickers listed on the latest trading day, unless given
    let tickers = match tickers {
        Some(tickers) => tickers,
        None => {
            let (date, listed) = latest_trading_day(&http_client, today).await?;
            info!("{} tickers listed on {date}", listed.len());
            listed.into_iter().map(|row| row.ticker).collect()
        }
    };

    let update_date = match update_date {
        Some(date) => date,
        None => prompt::select_update_date(today)?,
    };

    let fetcher = NaverFetcher::new(http_client);
    let report = match dry_run {
        true => {
            warn!("dry run: reconciling against an empty in-memory store");
            let store = MemoryStore::new();
            consensus::scrape(&fetcher, &store, &tickers, request, update_date, tui).await?
        }
        false => {
            let store = PgStore::new(connect()?);
            store.init().await?;
            consensus::scrape(&fetcher, &store, &tickers, request, update_date, tui).await?
        }
    };

    if tui {
        print_report(&report, tickers.len());
    }
    debug!("consensus spider finished, time elapsed: {:?}", time.elapsed());

    Ok(())
}

fn print_report(report: &Report, total: usize) {
    println!(
        "consensus scraped for {} of {total} tickers, {} records appended",
        report.scraped, report.appended
    );
    if !report.failed.is_empty() {
        println!("consensus not available:");
        for (ticker, err) in &report.failed {
            println!("  {ticker}: {err}");
        }
    }
}

/// Download the KRX market data over a date range, asking for the bounds when not given.
pub(crate) async fn krx(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    tui: bool,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let today = Local::now().date_naive();

    let pool = connect()?;
    market_data::init(&pool).await?;

    let start = match start {
        Some(date) => date,
        None => prompt::select_start_date(market_data::latest_stored_date(&pool).await?)?,
    };
    let end = match end {
        Some(date) => date,
        None => prompt::select_end_date(today)?,
    };

    let http_client = std_client_build()?;
    let sanity_check = market_data::scrape(&pool, &http_client, start, end, tui).await?;
    if !sanity_check.is_empty() {
        warn!("stored row counts differ from the download on {sanity_check:?}");
    }

    debug!("krx spider finished, time elapsed: {:?}", time.elapsed());
    Ok(())
}
