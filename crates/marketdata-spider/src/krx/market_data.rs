use super::sql;
use crate::error::{FetchError, StoreError};
use crate::http::*;
use crate::tui::BatchProgress;
use chrono::{Days, NaiveDate};
use colored::Colorize;
use encoding_rs::EUC_KR;
use futures::{stream, StreamExt};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, error, info, trace, warn};

const OTP_URL: &str = "http://marketdata.krx.co.kr/contents/COM/GenerateOTP.jspx";
const DOWNLOAD_URL: &str = "http://file.krx.co.kr/download.jspx";

/// How far back [`latest_trading_day`] looks before giving up.
const TRADING_DAY_LOOKBACK: u64 = 14;

const REQUIRED_COLUMNS: [&str; 2] = ["종목코드", "종목명"];

// scrape
// -------------------------------------------------------------------------------------------------

/// Create `krx.market_data` if it does not exist yet.
pub async fn init(pool: &PgPool) -> Result<(), StoreError> {
    let pg_client = pool.get().await?;
    pg_client.batch_execute(sql::CREATE_TABLES).await?;
    Ok(())
}

/// Download & store the market data for every date from `start` to `end`, inclusive.
///
/// Dates already in the database are not inserted again; if their stored row count differs
/// from the fresh download they are returned as failing the sanity check.
pub async fn scrape(
    pool: &PgPool,
    http_client: &HttpClient,
    start: NaiveDate,
    end: NaiveDate,
    tui: bool,
) -> anyhow::Result<Vec<NaiveDate>> {
    let time = std::time::Instant::now();

    trace!("fetching stored krx.market_data dates ...");
    let stored = stored_counts(pool).await?;

    let dates: Vec<NaiveDate> = start.iter_days().take_while(|date| *date <= end).collect();
    let progress = BatchProgress::new(dates.len(), tui)?;
    let mut sanity_check = vec![];

    info!("downloading KRX market data from {start} to {end} ...");
    for (i, date) in dates.iter().enumerate() {
        let pct = (i + 1) as f64 / dates.len() as f64 * 100.0;
        let day = date.format("%Y%m%d");

        let data = match download(http_client, *date).await {
            Ok(data) => data,
            Err(err) => {
                error!("{day}: failed to download KRX market data, error({err})");
                progress.fail();
                continue;
            }
        };

        match stored.get(date) {
            Some(count) => {
                info!("{day}:{:6}{pct:10.3}% exists in database", data.len());
                if *count != data.len() as i64 {
                    warn!(
                        "{day}: {count} rows stored, {} downloaded; failed sanity check",
                        data.len()
                    );
                    sanity_check.push(*date);
                }
            }
            None if data.is_empty() => {
                info!("{day}:{:6}{pct:10.3}% no trading day", data.len());
            }
            None => match insert(pool, &data).await {
                Ok(inserted) => {
                    info!("{day}:{:6}{pct:10.3}% downloaded", inserted);
                }
                Err(err) => {
                    error!("{day}: failed to insert KRX market data, error({err})");
                    progress.fail();
                    continue;
                }
            },
        }
        progress.succeed();
    }
    progress.finish();

    debug!("KRX market data downloaded, {}", crate::time_elapsed(time));
    if tui {
        println!("downloading KRX market data ... done");
        match sanity_check.is_empty() {
            true => println!("{}", "sanity check cleared".green()),
            false => println!("{} {:?}", "sanity check failed:".red(), sanity_check),
        }
    }

    Ok(sanity_check)
}

/// Walk back from `today` to the most recent date with market data, returning that date and its
/// data.
pub async fn latest_trading_day(
    http_client: &HttpClient,
    today: NaiveDate,
) -> Result<(NaiveDate, Vec<MarketData>), FetchError> {
    for back in 0..TRADING_DAY_LOOKBACK {
        let date = today - Days::new(back);
        let data = download(http_client, date).await?;
        if !data.is_empty() {
            debug!("latest trading day is {date}");
            return Ok((date, data));
        }
        trace!("{date} is not a trading day");
    }

    Err(FetchError::NoTradingDay {
        from: today,
        days: TRADING_DAY_LOOKBACK as i64,
    })
}

/// Download one day of KRX market data: request a one-time code for the file, then the file.
pub async fn download(
    http_client: &HttpClient,
    data_date: NaiveDate,
) -> Result<Vec<MarketData>, FetchError> {
    let schdate = data_date.format("%Y%m%d").to_string();

    trace!("requesting KRX OTP for {schdate}");
    let response = http_client
        .post(OTP_URL)
        .form(&[
            ("name", "fileDown"),
            ("filetype", "csv"),
            ("url", "MKD/04/0404/04040200/mkd04040200_01"),
            ("market_gubun", "ALL"),
            ("indx_ind_cd", ""),
            ("sect_tp_cd", ""),
            ("schdate", schdate.as_str()),
            ("pagePath", "/contents/MKD/04/0404/04040200/MKD04040200.jsp"),
        ])
        .send()
        .await?;
    let code = ensure_success(response)?.text().await?;

    trace!("downloading KRX market data for {schdate}");
    let response = http_client
        .post(DOWNLOAD_URL)
        .form(&[("code", code.trim())])
        .send()
        .await?;
    let bytes = ensure_success(response)?.bytes().await?;

    let (text, _, had_errors) = EUC_KR.decode(&bytes);
    if had_errors {
        warn!("{schdate}: encoding errors while decoding KRX market data");
    }

    parse_csv(&text, data_date)
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    match response.status().is_success() {
        true => Ok(response),
        false => Err(FetchError::Status {
            status: response.status(),
            url: response.url().to_string(),
        }),
    }
}

/// Parse a decoded KRX market data file; an empty file is a non-trading day.
pub fn parse_csv(text: &str, data_date: NaiveDate) -> Result<Vec<MarketData>, FetchError> {
    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(FetchError::MissingColumn(column));
        }
    }

    reader
        .deserialize::<Row>()
        .map(|row| row?.into_market_data(data_date))
        .collect()
}

/// The most recent trading day stored, if any.
pub async fn latest_stored_date(pool: &PgPool) -> Result<Option<NaiveDate>, StoreError> {
    let pg_client = pool.get().await?;
    let row = pg_client.query_one(sql::SELECT_LATEST_DATE, &[]).await?;
    Ok(row.get(0))
}

async fn stored_counts(pool: &PgPool) -> Result<HashMap<NaiveDate, i64>, StoreError> {
    let pg_client = pool.get().await?;
    let counts = pg_client
        .query(sql::SELECT_DATE_COUNTS, &[])
        .await?
        .into_iter()
        .map(|row| (row.get(0), row.get(1)))
        .collect();
    Ok(counts)
}

async fn insert(pool: &PgPool, data: &[MarketData]) -> Result<u64, StoreError> {
    let mut pg_client = pool.get().await?;
    let query = pg_client.prepare(sql::INSERT_MARKET_DATA).await?;
    let transaction = pg_client.transaction().await?;

    let mut inserted = 0;
    let mut stream = stream::iter(data);
    while let Some(cell) = stream.next().await {
        inserted += transaction
            .execute(
                &query,
                &[
                    &cell.ticker,
                    &cell.company_name,
                    &cell.data_date,
                    &cell.price_close,
                    &cell.price_change,
                    &cell.price_change_pct,
                    &cell.volume,
                    &cell.trading_value,
                    &cell.price_open,
                    &cell.price_high,
                    &cell.price_low,
                    &cell.marketcap,
                    &cell.market_weight_pct,
                    &cell.shares_issued,
                    &cell.foreign_shareholding,
                    &cell.foreign_shareholding_pct,
                ],
            )
            .await?;
    }

    transaction.commit().await?;
    Ok(inserted)
}

// de
// -------------------------------------------------------------------------------------------------

// output

/// One stock's trading data for one day. Percentages are stored as fractions (`1.5%` → `0.015`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketData {
    pub ticker: String,
    pub company_name: String,
    pub data_date: NaiveDate,
    pub price_close: Option<i64>,
    pub price_change: Option<i64>,
    pub price_change_pct: Option<Decimal>,
    pub volume: Option<i64>,
    pub trading_value: Option<i64>,
    pub price_open: Option<i64>,
    pub price_high: Option<i64>,
    pub price_low: Option<i64>,
    pub marketcap: Option<i64>,
    pub market_weight_pct: Option<Decimal>,
    /// Despite the (천주) in the source header, this is a plain share count.
    pub shares_issued: Option<i64>,
    pub foreign_shareholding: Option<i64>,
    pub foreign_shareholding_pct: Option<Decimal>,
}

// input
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "종목코드")]
    ticker: String,
    #[serde(rename = "종목명")]
    company_name: String,
    #[serde(rename = "현재가", default)]
    price_close: String,
    #[serde(rename = "대비", default)]
    price_change: String,
    #[serde(rename = "등락률", default)]
    price_change_pct: String,
    #[serde(rename = "거래량", default)]
    volume: String,
    #[serde(rename = "거래대금", default)]
    trading_value: String,
    #[serde(rename = "시가", default)]
    price_open: String,
    #[serde(rename = "고가", default)]
    price_high: String,
    #[serde(rename = "저가", default)]
    price_low: String,
    #[serde(rename = "시가총액", default)]
    marketcap: String,
    #[serde(rename = "시가총액비중(%)", default)]
    market_weight_pct: String,
    #[serde(rename = "상장주식수(천주)", default)]
    shares_issued: String,
    #[serde(rename = "외국인 보유주식수", default)]
    foreign_shareholding: String,
    #[serde(rename = "외국인 지분율(%)", default)]
    foreign_shareholding_pct: String,
}

impl Row {
    fn into_market_data(self, data_date: NaiveDate) -> Result<MarketData, FetchError> {
        Ok(MarketData {
            ticker: self.ticker,
            company_name: self.company_name,
            data_date,
            price_close: integer("price_close", &self.price_close)?,
            price_change: integer("price_change", &self.price_change)?,
            price_change_pct: percent("price_change_pct", &self.price_change_pct)?,
            volume: integer("volume", &self.volume)?,
            trading_value: integer("trading_value", &self.trading_value)?,
            price_open: integer("price_open", &self.price_open)?,
            price_high: integer("price_high", &self.price_high)?,
            price_low: integer("price_low", &self.price_low)?,
            marketcap: integer("marketcap", &self.marketcap)?,
            market_weight_pct: percent("market_weight_pct", &self.market_weight_pct)?,
            shares_issued: integer("shares_issued", &self.shares_issued)?,
            foreign_shareholding: integer("foreign_shareholding", &self.foreign_shareholding)?,
            foreign_shareholding_pct: percent(
                "foreign_shareholding_pct",
                &self.foreign_shareholding_pct,
            )?,
        })
    }
}

fn decimal(column: &'static str, cell: &str) -> Result<Option<Decimal>, FetchError> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "-" {
        return Ok(None);
    }
    Decimal::from_str(&cell.replace(',', ""))
        .map(Some)
        .map_err(|_| FetchError::InvalidNumber {
            column,
            cell: cell.to_string(),
        })
}

fn integer(column: &'static str, cell: &str) -> Result<Option<i64>, FetchError> {
    let invalid = || FetchError::InvalidNumber {
        column,
        cell: cell.trim().to_string(),
    };
    match decimal(column, cell)? {
        Some(value) if value.fract().is_zero() => {
            i64::try_from(value).map(Some).map_err(|_| invalid())
        }
        Some(_) => Err(invalid()),
        None => Ok(None),
    }
}

fn percent(column: &'static str, cell: &str) -> Result<Option<Decimal>, FetchError> {
    Ok(decimal(column, cell)?.map(|value| value / Decimal::ONE_HUNDRED))
}
