//////////////////////////////////////////////////////////////////
// tables
//////////////////////////////////////////////////////////////////

/// `naver.consensus_financials` is append-only; each `update_date` adds the facts that moved
/// since the previous snapshot.
pub(crate) static CREATE_TABLES: &str = "
    CREATE SCHEMA IF NOT EXISTS naver;

    CREATE TABLE IF NOT EXISTS naver.accounting_standards (
        code SMALLINT PRIMARY KEY,
        label VARCHAR(16) NOT NULL
    );

    CREATE TABLE IF NOT EXISTS naver.financial_items (
        item VARCHAR(64) PRIMARY KEY,
        code INT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS naver.consensus_financials (
        ticker VARCHAR(12) NOT NULL,
        statement_period DATE NOT NULL,
        financial_item VARCHAR(64) NOT NULL,
        financial_item_code INT NOT NULL,
        value NUMERIC NOT NULL,
        accounting_standard SMALLINT NOT NULL,
        forecast_indicator CHAR(1) NOT NULL,
        update_date DATE NOT NULL,
        PRIMARY KEY (
            ticker,
            statement_period,
            financial_item_code,
            accounting_standard,
            forecast_indicator,
            update_date
        )
    );
";

//////////////////////////////////////////////////////////////////
// lookup tables
//////////////////////////////////////////////////////////////////

pub(crate) static INSERT_ACCOUNTING_STANDARD: &str = "
    INSERT INTO naver.accounting_standards (code, label)
    VALUES ($1, $2)
    ON CONFLICT (code) DO NOTHING
";

pub(crate) static INSERT_FINANCIAL_ITEM: &str = "
    INSERT INTO naver.financial_items (item, code)
    VALUES ($1, $2)
    ON CONFLICT (item) DO NOTHING
";

//////////////////////////////////////////////////////////////////
// consensus
//////////////////////////////////////////////////////////////////

/// Latest stored row per natural key for one ticker.
pub(crate) static SELECT_LATEST_SNAPSHOT: &str = "
    SELECT DISTINCT ON (
        statement_period,
        financial_item_code,
        accounting_standard,
        forecast_indicator
    )
        ticker,
        statement_period,
        financial_item,
        financial_item_code,
        value,
        accounting_standard,
        forecast_indicator,
        update_date
    FROM naver.consensus_financials
    WHERE ticker = $1
    ORDER BY
        statement_period,
        financial_item_code,
        accounting_standard,
        forecast_indicator,
        update_date DESC
";

/// A fact already stored for the same `update_date` is overwritten when its value moved; the
/// row count only includes rows actually written.
pub(crate) static INSERT_CONSENSUS: &str = "
    INSERT INTO naver.consensus_financials (
        ticker,
        statement_period,
        financial_item,
        financial_item_code,
        value,
        accounting_standard,
        forecast_indicator,
        update_date
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (
        ticker,
        statement_period,
        financial_item_code,
        accounting_standard,
        forecast_indicator,
        update_date
    ) DO UPDATE SET
        value = EXCLUDED.value,
        financial_item = EXCLUDED.financial_item
    WHERE (naver.consensus_financials.value, naver.consensus_financials.financial_item)
        IS DISTINCT FROM (EXCLUDED.value, EXCLUDED.financial_item)
";
