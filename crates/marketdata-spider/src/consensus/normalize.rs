use super::codes;
use super::record::{ColumnFacet, ConsensusRecord, RawTable};
use crate::error::RecordError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{error, trace, warn};

/// Cell contents read as "no value".
const BLANK_CELLS: [&str; 6] = ["", "-", "N/A", "NA", "NaN", "nan"];

/// Output of [`normalize`]: the records, and every record that was dropped on the way.
#[derive(Debug, Default)]
pub struct Normalized {
    pub records: Vec<ConsensusRecord>,
    pub dropped: Vec<RecordError>,
}

/// Unpivot a consensus table into one [`ConsensusRecord`] per (data column, row).
///
/// Blank cells are skipped silently. Non-numeric cells, amounts too large to rescale and labels
/// without a line-item code drop their record, are logged, and are returned in
/// [`Normalized::dropped`]. Monetary values are rescaled from hundreds of millions of won to won.
pub fn normalize(
    table: &RawTable,
    facets: &[ColumnFacet],
    ticker: &str,
    update_date: NaiveDate,
) -> Normalized {
    let mut normalized = Normalized::default();

    for (column, facet) in facets.iter().enumerate().skip(1) {
        let Some(statement_period) = facet.statement_period else {
            continue;
        };
        let Some(accounting_standard) = facet.accounting_standard else {
            warn!("[{ticker}] column {column} ({statement_period}) has no accounting standard, skipping");
            continue;
        };

        for row in &table.rows {
            let Some(label) = row.first() else {
                continue;
            };
            let cell = row.get(column).map(String::as_str).unwrap_or_default();

            let value = match parse_value(cell) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(_) => {
                    let err = RecordError::Parse {
                        item: label.clone(),
                        period: statement_period,
                        cell: cell.to_string(),
                    };
                    error!("[{ticker}] {err}");
                    normalized.dropped.push(err);
                    continue;
                }
            };

            let Some(financial_item_code) = codes::financial_item_code(label) else {
                let err = RecordError::UnmappedLineItem {
                    item: label.clone(),
                };
                warn!("[{ticker}] {err}, dropping");
                normalized.dropped.push(err);
                continue;
            };

            let value = match codes::is_monetary(financial_item_code) {
                true => match value.checked_mul(Decimal::from(codes::SOURCE_UNIT)) {
                    Some(value) => value,
                    None => {
                        let err = RecordError::OutOfRange {
                            item: label.clone(),
                            period: statement_period,
                            cell: cell.to_string(),
                        };
                        error!("[{ticker}] {err}");
                        normalized.dropped.push(err);
                        continue;
                    }
                },
                false => value,
            };

            normalized.records.push(ConsensusRecord {
                ticker: ticker.to_string(),
                statement_period,
                financial_item_name: label.trim().to_string(),
                financial_item_code,
                value,
                accounting_standard,
                forecast_indicator: facet.forecast_indicator,
                update_date,
            });
        }
    }

    trace!(
        "[{ticker}] {} records normalized, {} dropped",
        normalized.records.len(),
        normalized.dropped.len()
    );

    normalized
}

/// Parse a cell as a decimal, accepting thousands separators; `Ok(None)` for blank cells.
fn parse_value(cell: &str) -> Result<Option<Decimal>, rust_decimal::Error> {
    let cell = cell.trim();
    if BLANK_CELLS.contains(&cell) {
        return Ok(None);
    }
    Decimal::from_str(&cell.replace(',', "")).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::record::{AccountingStandard, ForecastIndicator};
    use crate::consensus::decode::decode_columns;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| vec![h.to_string()]).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn run(table: &RawTable) -> Normalized {
        let facets = decode_columns(&table.headers).unwrap();
        normalize(table, &facets, "005930", date(2024, 5, 14))
    }

    #[test]
    fn revenue_estimate_is_scaled() {
        let raw = table(&["주요재무정보", "2024/12(E)(IFRS연결)"], &[&["매출액", "1234"]]);
        let normalized = run(&raw);

        assert!(normalized.dropped.is_empty());
        assert_eq!(
            normalized.records,
            vec![ConsensusRecord {
                ticker: "005930".to_string(),
                statement_period: date(2024, 12, 31),
                financial_item_name: "매출액".to_string(),
                financial_item_code: 1100,
                value: dec!(123400000000),
                accounting_standard: AccountingStandard::IfrsConsolidated,
                forecast_indicator: ForecastIndicator::Estimated,
                update_date: date(2024, 5, 14),
            }]
        );
    }

    #[test]
    fn ratios_are_not_scaled() {
        let raw = table(&["주요재무정보", "2023/12(IFRS연결)"], &[&["ROE(%)", "12.55"]]);
        let normalized = run(&raw);

        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.records[0].financial_item_code, 4163);
        assert_eq!(normalized.records[0].value, dec!(12.55));
        assert_eq!(
            normalized.records[0].forecast_indicator,
            ForecastIndicator::Actual
        );
    }

    #[test]
    fn unpivots_every_column_and_row() {
        let raw = table(
            &["주요재무정보", "2022/12(IFRS연결)", "2023/12(IFRS연결)", "2024/12(E)(IFRS연결)"],
            &[
                &["매출액", "2,796,048", "2,589,355", "3,008,709"],
                &["PER(배)", "9.43", "34.66", "13.82"],
            ],
        );
        let normalized = run(&raw);

        assert_eq!(normalized.records.len(), 6);
        assert_eq!(normalized.records[0].value, dec!(279604800000000));
        assert_eq!(normalized.records[5].value, dec!(13.82));
        assert_eq!(normalized.records[5].statement_period, date(2024, 12, 31));
    }

    #[test]
    fn unmapped_labels_are_dropped() {
        let raw = table(
            &["주요재무정보", "2023/12(IFRS연결)"],
            &[&["신규항목", "10"], &["영업이익", "5"]],
        );
        let normalized = run(&raw);

        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.records[0].financial_item_code, 1300);
        assert_eq!(
            normalized.dropped,
            vec![RecordError::UnmappedLineItem {
                item: "신규항목".to_string()
            }]
        );
    }

    #[test]
    fn blank_cells_are_skipped_and_garbage_is_dropped() {
        let raw = table(
            &["주요재무정보", "2023/12(IFRS연결)", "2024/12(E)(IFRS연결)"],
            &[&["매출액", " ", "abc"], &["자산총계", "", "-"]],
        );
        let normalized = run(&raw);

        assert!(normalized.records.is_empty());
        assert_eq!(
            normalized.dropped,
            vec![RecordError::Parse {
                item: "매출액".to_string(),
                period: date(2024, 12, 31),
                cell: "abc".to_string(),
            }]
        );
    }

    #[test]
    fn amounts_too_large_to_rescale_are_dropped() {
        let raw = table(
            &["주요재무정보", "2024/12(E)(IFRS연결)"],
            &[
                &["매출액", "79228162514264337593543950"],
                &["ROE(%)", "79228162514264337593543950"],
                &["영업이익", "5"],
            ],
        );
        let normalized = run(&raw);

        // ratios are not rescaled, so only the revenue cell overflows
        assert_eq!(normalized.records.len(), 2);
        assert_eq!(normalized.records[1].value, dec!(500000000));
        assert_eq!(
            normalized.dropped,
            vec![RecordError::OutOfRange {
                item: "매출액".to_string(),
                period: date(2024, 12, 31),
                cell: "79228162514264337593543950".to_string(),
            }]
        );
    }

    #[test]
    fn columns_without_standard_are_skipped() {
        let raw = table(&["주요재무정보", "2023/12"], &[&["매출액", "10"]]);
        let normalized = run(&raw);
        assert!(normalized.records.is_empty());
        assert!(normalized.dropped.is_empty());
    }

    #[test]
    fn short_rows_are_blank() {
        let raw = table(
            &["주요재무정보", "2022/12(IFRS연결)", "2023/12(IFRS연결)"],
            &[&["매출액", "1"]],
        );
        assert_eq!(run(&raw).records.len(), 1);
    }
}
