use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape Naver Finance consensus financials and append what changed to PostgreSQL.
    Consensus {
        /// Reporting frequency of the consensus table.
        #[arg(short, long, value_enum, default_value_t = CliPeriod::Annual)]
        period: CliPeriod,

        /// Financial statement variant to request.
        #[arg(short, long, value_enum, default_value_t = CliStatement::Main)]
        statement: CliStatement,

        /// Date the snapshot is recorded under (YYYY-MM-DD).
        ///
        /// If not provided, you will be asked to pick today or yesterday.
        #[arg(short, long)]
        update_date: Option<NaiveDate>,

        /// Tickers to scrape.
        ///
        /// If no tickers are provided, every ticker listed on the latest KRX trading day is used.
        #[arg(long, num_args = 1..)]
        tickers: Option<Vec<String>>,

        /// Reconcile against an empty in-memory store instead of the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Download daily KRX market data to PostgreSQL.
    Krx {
        /// First date to download (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date to download (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CliPeriod {
    /// Fiscal years.
    Annual,

    /// Fiscal quarters.
    Quarterly,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CliStatement {
    /// Naver's default statement.
    Main,
    GaapStandalone,
    GaapConsolidated,
    IfrsStandalone,
    IfrsConsolidated,
}

impl From<CliPeriod> for marketdata_spider::consensus::Period {
    fn from(period: CliPeriod) -> Self {
        match period {
            CliPeriod::Annual => Self::Annual,
            CliPeriod::Quarterly => Self::Quarterly,
        }
    }
}

impl From<CliStatement> for marketdata_spider::consensus::StatementVariant {
    fn from(statement: CliStatement) -> Self {
        match statement {
            CliStatement::Main => Self::Main,
            CliStatement::GaapStandalone => Self::GaapStandalone,
            CliStatement::GaapConsolidated => Self::GaapConsolidated,
            CliStatement::IfrsStandalone => Self::IfrsStandalone,
            CliStatement::IfrsConsolidated => Self::IfrsConsolidated,
        }
    }
}
