//! Each ticker passes through, in order:
//!
//! 1. [`Fetcher`]: download the raw consensus table,
//! 2. [`decode_columns`]: read period, accounting standard & forecast flag out of each header,
//! 3. [`normalize`]: unpivot into [`ConsensusRecord`]s, coded and rescaled,
//! 4. [`reconcile`]: keep only facts that moved since the latest stored snapshot,
//! 5. [`Store`]: append them.
mod sql;

pub mod codes;
pub mod decode;
pub mod naver;
pub mod normalize;
pub mod reconcile;
pub mod record;
pub mod store;

pub use decode::decode_columns;
pub use naver::{Fetcher, NaverFetcher, Period, StatementVariant};
pub use normalize::{normalize, Normalized};
pub use reconcile::reconcile;
pub use record::*;
pub use store::{MemoryStore, PgStore, Store};

use crate::error::ConsensusError;
use crate::tui::BatchProgress;
use chrono::NaiveDate;
use tracing::{debug, error, info, trace};

/// Which consensus table to request for every ticker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Request {
    pub period: Period,
    pub variant: StatementVariant,
}

/// Outcome of one ticker's pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickerSummary {
    pub normalized: usize,
    pub dropped: usize,
    pub appended: u64,
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct Report {
    pub scraped: usize,
    pub appended: u64,
    /// Tickers whose pass was aborted, with the reason.
    pub failed: Vec<(String, ConsensusError)>,
}

/// Fetch, decode, normalize and reconcile one ticker, appending the facts that changed.
pub async fn run_ticker<F, S>(
    fetcher: &F,
    store: &S,
    ticker: &str,
    request: Request,
    update_date: NaiveDate,
) -> Result<TickerSummary, ConsensusError>
where
    F: Fetcher + Sync,
    S: Store + Sync,
{
    let time = std::time::Instant::now();

    trace!("[{ticker}] fetching consensus table ...");
    let table = fetcher
        .fetch(ticker, request.period, request.variant)
        .await?;

    let facets = decode_columns(&table.headers)?;
    let Normalized { records, dropped } = normalize(&table, &facets, ticker, update_date);
    let normalized = records.len();

    trace!("[{ticker}] fetching prior snapshot ...");
    let prior = store.prior_snapshot(ticker).await?;
    let changed = reconcile(prior, records, update_date);

    let appended = store.append(&changed).await?;
    debug!(
        "[{ticker}] {normalized} records normalized, {appended} appended, {}",
        crate::time_elapsed(time)
    );

    Ok(TickerSummary {
        normalized,
        dropped: dropped.len(),
        appended,
    })
}

/// Run every ticker in turn. A ticker that fails is logged and recorded in the report; the
/// batch carries on with the next one.
pub async fn scrape<F, S>(
    fetcher: &F,
    store: &S,
    tickers: &[String],
    request: Request,
    update_date: NaiveDate,
    tui: bool,
) -> anyhow::Result<Report>
where
    F: Fetcher + Sync,
    S: Store + Sync,
{
    let time = std::time::Instant::now();
    let progress = BatchProgress::new(tickers.len(), tui)?;
    let mut report = Report::default();

    info!(
        "scraping Naver Finance consensus for {} tickers, update_date {update_date} ...",
        tickers.len()
    );
    for ticker in tickers {
        match run_ticker(fetcher, store, ticker, request, update_date).await {
            Ok(summary) => {
                report.scraped += 1;
                report.appended += summary.appended;
                progress.succeed();
            }
            Err(err) => {
                error!("[{ticker}] consensus run aborted, error({err})");
                report.failed.push((ticker.clone(), err));
                progress.fail();
            }
        }
    }
    progress.finish();

    info!(
        "consensus scraped for {} of {} tickers, {} records appended, {}",
        report.scraped,
        tickers.len(),
        report.appended,
        crate::time_elapsed(time)
    );

    Ok(report)
}
