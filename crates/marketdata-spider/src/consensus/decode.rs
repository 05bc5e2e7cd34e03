use super::record::{AccountingStandard, ColumnFacet, ForecastIndicator};
use crate::error::DecodeError;
use chrono::NaiveDate;
use regex::Regex;

lazy_static::lazy_static! {
    static ref STATEMENT_PERIOD: Regex =
        Regex::new(r"(\d{4})/(\d{2})").expect("statement period regex");
    static ref ACCOUNTING_STANDARD: Regex =
        Regex::new(r"\((\D{6})\)").expect("accounting standard regex");
    static ref FORECAST: Regex = Regex::new(r"\(E\)").expect("forecast regex");
}

/// Decode every column header of a consensus table into its [`ColumnFacet`], in order.
///
/// Column headers arrive as token lists (one token per header row, e.g.
/// `["최근 연간 실적", "2024/12(E)(IFRS연결)"]`); the tokens are searched as one string. The
/// first column holds the line-item labels and is always left unset.
pub fn decode_columns(headers: &[Vec<String>]) -> Result<Vec<ColumnFacet>, DecodeError> {
    headers
        .iter()
        .enumerate()
        .map(|(i, tokens)| match i {
            0 => Ok(ColumnFacet::default()),
            _ => decode_header(&tokens.join(" ")),
        })
        .collect()
}

/// Decode a single header string, e.g. `"2024/12(E)(IFRS연결)"`.
pub fn decode_header(header: &str) -> Result<ColumnFacet, DecodeError> {
    let statement_period = match STATEMENT_PERIOD.captures(header) {
        Some(caps) => {
            // both groups are all digits, of fixed width
            let year: i32 = caps[1].parse().unwrap_or_default();
            let month: u32 = caps[2].parse().unwrap_or_default();
            Some(fiscal_month_end(header, year, month)?)
        }
        None => None,
    };

    let accounting_standard = ACCOUNTING_STANDARD
        .captures(header)
        .and_then(|caps| AccountingStandard::from_label(&caps[1]));

    let forecast_indicator = if FORECAST.is_match(header) {
        ForecastIndicator::Estimated
    } else {
        ForecastIndicator::Actual
    };

    Ok(ColumnFacet {
        statement_period,
        accounting_standard,
        forecast_indicator,
    })
}

/// Quarter-end date of a fiscal month: March & December end on the 31st, June & September on
/// the 30th. Any other month is refused.
fn fiscal_month_end(header: &str, year: i32, month: u32) -> Result<NaiveDate, DecodeError> {
    let day = match month {
        3 | 12 => 31,
        6 | 9 => 30,
        _ => 0,
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DecodeError::UnsupportedFiscalMonth {
        header: header.to_string(),
        month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn estimated_ifrs_consolidated() {
        let facet = decode_header("2024/12(E)(IFRS연결)").unwrap();
        assert_eq!(facet.statement_period, Some(date(2024, 12, 31)));
        assert_eq!(
            facet.accounting_standard,
            Some(AccountingStandard::IfrsConsolidated)
        );
        assert_eq!(facet.forecast_indicator, ForecastIndicator::Estimated);
    }

    #[test]
    fn quarter_ends() {
        let cases = [(3, 31), (6, 30), (9, 30), (12, 31)];
        for (month, day) in cases {
            let header = format!("2023/{month:02}(GAAP개별)");
            let facet = decode_header(&header).unwrap();
            assert_eq!(facet.statement_period, Some(date(2023, month, day)));
            assert_eq!(facet.forecast_indicator, ForecastIndicator::Actual);
            assert_eq!(
                facet.accounting_standard,
                Some(AccountingStandard::GaapIndividual)
            );
        }
    }

    #[test]
    fn other_months_are_refused() {
        for month in [1, 2, 4, 5, 7, 8, 10, 11] {
            let header = format!("2023/{month:02}(IFRS별도)");
            assert_eq!(
                decode_header(&header),
                Err(DecodeError::UnsupportedFiscalMonth {
                    header: header.clone(),
                    month
                })
            );
        }
        assert!(decode_header("2023/00").is_err());
        assert!(decode_header("2023/13").is_err());
    }

    #[test]
    fn label_column_is_unset() {
        let headers = vec![
            vec!["주요재무정보".to_string()],
            vec!["최근 연간 실적".to_string(), "2022/12(IFRS연결)".to_string()],
            vec!["최근 연간 실적".to_string(), "2024/12(E)(IFRS연결)".to_string()],
        ];
        let facets = decode_columns(&headers).unwrap();
        assert_eq!(facets.len(), 3);
        assert_eq!(facets[0], ColumnFacet::default());
        assert!(!facets[0].is_data());
        assert_eq!(facets[1].statement_period, Some(date(2022, 12, 31)));
        assert_eq!(facets[1].forecast_indicator, ForecastIndicator::Actual);
        assert_eq!(facets[2].forecast_indicator, ForecastIndicator::Estimated);
    }

    #[test]
    fn headers_without_tokens_are_unset() {
        let facet = decode_header("전년동기").unwrap();
        assert_eq!(facet, ColumnFacet::default());

        // bracketed, but not a known standard
        let facet = decode_header("2021/06(연결재무제표)").unwrap();
        assert_eq!(facet.statement_period, Some(date(2021, 6, 30)));
        assert_eq!(facet.accounting_standard, None);
    }

    #[test]
    fn decode_error_aborts_all_columns() {
        let headers = vec![
            vec!["주요재무정보".to_string()],
            vec!["2022/12(IFRS연결)".to_string()],
            vec!["2023/07(IFRS연결)".to_string()],
        ];
        assert!(decode_columns(&headers).is_err());
    }
}
