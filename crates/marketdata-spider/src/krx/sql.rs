//////////////////////////////////////////////////////////////////
// market data
//////////////////////////////////////////////////////////////////

/// `krx.market_data` is the master table for KRX daily trading data; one row per ticker per
/// trading day.
pub(crate) static CREATE_TABLES: &str = "
    CREATE SCHEMA IF NOT EXISTS krx;

    CREATE TABLE IF NOT EXISTS krx.market_data (
        ticker VARCHAR(12) NOT NULL,
        company_name VARCHAR(128) NOT NULL,
        data_date DATE NOT NULL,
        price_close BIGINT,
        price_change BIGINT,
        price_change_pct NUMERIC,
        volume BIGINT,
        trading_value BIGINT,
        price_open BIGINT,
        price_high BIGINT,
        price_low BIGINT,
        marketcap BIGINT,
        market_weight_pct NUMERIC,
        shares_issued BIGINT,
        foreign_shareholding BIGINT,
        foreign_shareholding_pct NUMERIC,
        PRIMARY KEY (ticker, data_date)
    );
";

pub(crate) static INSERT_MARKET_DATA: &str = "
    INSERT INTO krx.market_data (
        ticker,
        company_name,
        data_date,
        price_close,
        price_change,
        price_change_pct,
        volume,
        trading_value,
        price_open,
        price_high,
        price_low,
        marketcap,
        market_weight_pct,
        shares_issued,
        foreign_shareholding,
        foreign_shareholding_pct
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
    ON CONFLICT (ticker, data_date) DO NOTHING
";

/// Row count per stored trading day; used to skip dates already collected, and to sanity
/// check them against a fresh download.
pub(crate) static SELECT_DATE_COUNTS: &str = "
    SELECT data_date, count(*)
    FROM krx.market_data
    GROUP BY data_date
";

pub(crate) static SELECT_LATEST_DATE: &str = "
    SELECT max(data_date) FROM krx.market_data
";
