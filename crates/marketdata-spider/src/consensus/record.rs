use chrono::NaiveDate;
use rust_decimal::Decimal;

/// The unparsed consensus table: one token list per column header (a column usually spans
/// two header rows), and the body rows as plain cell text. The first cell of every row is the
/// line-item label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

/// What a column header says about the values beneath it.
///
/// The label column, and any column without a `YYYY/MM` token, has no `statement_period` and is
/// not unpivoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnFacet {
    pub statement_period: Option<NaiveDate>,
    pub accounting_standard: Option<AccountingStandard>,
    pub forecast_indicator: ForecastIndicator,
}

impl ColumnFacet {
    /// Whether the column carries values, i.e. it has a statement period.
    pub fn is_data(&self) -> bool {
        self.statement_period.is_some()
    }
}

/// Accounting standard of a consensus column, with the stable codes stored in
/// `naver.accounting_standards`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccountingStandard {
    /// K-IFRS, consolidated.
    IfrsConsolidated,
    /// K-IFRS, separate.
    IfrsSeparate,
    /// K-GAAP, consolidated.
    GaapConsolidated,
    /// K-GAAP, individual.
    GaapIndividual,
}

impl AccountingStandard {
    pub const ALL: [AccountingStandard; 4] = [
        Self::IfrsConsolidated,
        Self::IfrsSeparate,
        Self::GaapConsolidated,
        Self::GaapIndividual,
    ];

    /// Label as printed in the Naver Finance column headers, without brackets.
    pub fn label(&self) -> &'static str {
        match self {
            Self::IfrsConsolidated => "IFRS연결",
            Self::IfrsSeparate => "IFRS별도",
            Self::GaapConsolidated => "GAAP연결",
            Self::GaapIndividual => "GAAP개별",
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            Self::IfrsConsolidated => 1,
            Self::IfrsSeparate => 2,
            Self::GaapConsolidated => 3,
            Self::GaapIndividual => 4,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|std| std.label() == label)
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|std| std.code() == code)
    }
}

/// Realised figures versus analyst estimates (columns marked `(E)`).
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ForecastIndicator {
    #[default]
    Actual,
    Estimated,
}

impl ForecastIndicator {
    /// Single character code stored in postgres.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Actual => "A",
            Self::Estimated => "E",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "A" => Some(Self::Actual),
            "E" => Some(Self::Estimated),
            _ => None,
        }
    }
}

/// One fact of the unpivoted consensus table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusRecord {
    pub ticker: String,
    pub statement_period: NaiveDate,
    pub financial_item_name: String,
    pub financial_item_code: i32,
    pub value: Decimal,
    pub accounting_standard: AccountingStandard,
    pub forecast_indicator: ForecastIndicator,
    pub update_date: NaiveDate,
}

/// Identifies "the same fact slot" across snapshots taken on different dates.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct NaturalKey {
    pub ticker: String,
    pub statement_period: NaiveDate,
    pub financial_item_code: i32,
    pub accounting_standard: AccountingStandard,
    pub forecast_indicator: ForecastIndicator,
}

/// Every field of a record except its `update_date`; two records with equal tuples hold the
/// same fact with the same value.
#[derive(Debug, Hash, PartialEq, Eq)]
pub(crate) struct ValueTuple<'a> {
    ticker: &'a str,
    statement_period: NaiveDate,
    financial_item_name: &'a str,
    financial_item_code: i32,
    value: Decimal,
    accounting_standard: AccountingStandard,
    forecast_indicator: ForecastIndicator,
}

impl ConsensusRecord {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            ticker: self.ticker.clone(),
            statement_period: self.statement_period,
            financial_item_code: self.financial_item_code,
            accounting_standard: self.accounting_standard,
            forecast_indicator: self.forecast_indicator,
        }
    }

    pub(crate) fn value_tuple(&self) -> ValueTuple<'_> {
        ValueTuple {
            ticker: &self.ticker,
            statement_period: self.statement_period,
            financial_item_name: &self.financial_item_name,
            financial_item_code: self.financial_item_code,
            value: self.value,
            accounting_standard: self.accounting_standard,
            forecast_indicator: self.forecast_indicator,
        }
    }
}
