use chrono::NaiveDate;
use thiserror::Error;

/// A column header that cannot be decoded into a [`ColumnFacet`]; fatal for the ticker being
/// processed, since carrying on would tag its values with the wrong period.
///
/// [`ColumnFacet`]: crate::consensus::ColumnFacet
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported fiscal month {month} in column header \"{header}\"")]
    UnsupportedFiscalMonth { header: String, month: u32 },
}

/// A single unpivoted cell that cannot become a record. Only that record is dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("non-numeric value \"{cell}\" for {item} ({period})")]
    Parse {
        item: String,
        period: NaiveDate,
        cell: String,
    },

    #[error("value \"{cell}\" for {item} ({period}) is out of range once rescaled")]
    OutOfRange {
        item: String,
        period: NaiveDate,
        cell: String,
    },

    #[error("unmapped line item \"{item}\"")]
    UnmappedLineItem { item: String },
}

/// Transport and payload failures while downloading from Naver Finance or KRX.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed, error({0})")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("no table found in the response")]
    MissingTable,

    #[error("table has no header rows")]
    MissingHeader,

    #[error("failed to read csv, error({0})")]
    Csv(#[from] csv::Error),

    #[error("column \"{0}\" missing from the download")]
    MissingColumn(&'static str),

    #[error("invalid number \"{cell}\" in column {column}")]
    InvalidNumber { column: &'static str, cell: String },

    #[error("no trading day found in the {days} days up to {from}")]
    NoTradingDay { from: NaiveDate, days: i64 },
}

/// Failures of the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to get a pg client from the pool, error({0})")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("postgres error({0})")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("unexpected {column} value \"{value}\" in stored row")]
    Corrupt { column: &'static str, value: String },
}

/// Everything that aborts one ticker's consensus run; the batch carries on with the next one.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
