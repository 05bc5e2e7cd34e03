use super::record::ConsensusRecord;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Reduce stored records to the latest `update_date` per natural key.
pub fn latest_snapshot(mut records: Vec<ConsensusRecord>) -> Vec<ConsensusRecord> {
    // stable sort, newest first; the first record seen for a key wins
    records.sort_by(|a, b| b.update_date.cmp(&a.update_date));

    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.natural_key()))
        .collect()
}

/// Merge freshly normalized records against the prior snapshot of the same ticker, returning
/// only the new-or-changed facts stamped with `update_date`.
///
/// The prior snapshot and the new records are pooled, and every value tuple (all fields but
/// `update_date`) that occurs more than once is removed entirely, old and new copies alike. Of
/// what remains, the rows stamped `update_date` are the facts to append.
///
/// ```text
///   prior: (2024-12-31, 매출액, 100, 2024-05-13)     new: (2024-12-31, 매출액, 100, 2024-05-14)
///          (2024-12-31, 영업이익, 10, 2024-05-13)         (2024-12-31, 영업이익, 12, 2024-05-14)
///
///   output: (2024-12-31, 영업이익, 12, 2024-05-14)
/// ```
pub fn reconcile(
    prior: Vec<ConsensusRecord>,
    new: Vec<ConsensusRecord>,
    update_date: NaiveDate,
) -> Vec<ConsensusRecord> {
    let working: Vec<ConsensusRecord> = latest_snapshot(prior).into_iter().chain(new).collect();

    let keep: Vec<bool> = {
        let mut occurrences = HashMap::new();
        for record in &working {
            *occurrences.entry(record.value_tuple()).or_insert(0usize) += 1;
        }
        working
            .iter()
            .map(|record| {
                occurrences[&record.value_tuple()] == 1 && record.update_date == update_date
            })
            .collect()
    };

    working
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::record::{AccountingStandard, ForecastIndicator};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(item: &str, code: i32, value: Decimal, update_date: NaiveDate) -> ConsensusRecord {
        ConsensusRecord {
            ticker: "000660".to_string(),
            statement_period: date(2024, 12, 31),
            financial_item_name: item.to_string(),
            financial_item_code: code,
            value,
            accounting_standard: AccountingStandard::IfrsConsolidated,
            forecast_indicator: ForecastIndicator::Estimated,
            update_date,
        }
    }

    fn snapshot(update_date: NaiveDate) -> Vec<ConsensusRecord> {
        vec![
            record("매출액", 1100, dec!(100), update_date),
            record("영업이익", 1300, dec!(10), update_date),
            record("PER(배)", 4501, dec!(9.5), update_date),
        ]
    }

    #[test]
    fn first_run_keeps_everything() {
        let today = date(2024, 5, 14);
        let output = reconcile(vec![], snapshot(today), today);
        assert_eq!(output, snapshot(today));
    }

    #[test]
    fn identical_snapshot_yields_nothing() {
        let yesterday = date(2024, 5, 13);
        let today = date(2024, 5, 14);
        let output = reconcile(snapshot(yesterday), snapshot(today), today);
        assert!(output.is_empty());
    }

    #[test]
    fn one_changed_value_yields_exactly_the_new_record() {
        let yesterday = date(2024, 5, 13);
        let today = date(2024, 5, 14);

        let mut new = snapshot(today);
        new[1].value = dec!(12);

        let output = reconcile(snapshot(yesterday), new, today);
        assert_eq!(output, vec![record("영업이익", 1300, dec!(12), today)]);
    }

    #[test]
    fn equal_values_at_different_scales_match() {
        let yesterday = date(2024, 5, 13);
        let today = date(2024, 5, 14);

        let prior = vec![record("PER(배)", 4501, dec!(9.50), yesterday)];
        let new = vec![record("PER(배)", 4501, dec!(9.5), today)];
        assert!(reconcile(prior, new, today).is_empty());
    }

    #[test]
    fn second_run_after_persisting_is_empty() {
        let today = date(2024, 5, 14);
        let mut stored = vec![];

        let first = reconcile(stored.clone(), snapshot(today), today);
        assert_eq!(first.len(), 3);
        stored.extend(first);

        let second = reconcile(stored, snapshot(today), today);
        assert!(second.is_empty());
    }

    #[test]
    fn revision_back_to_an_older_value_is_kept() {
        let today = date(2024, 5, 14);
        let prior = vec![
            record("매출액", 1100, dec!(100), date(2024, 5, 1)),
            record("매출액", 1100, dec!(120), date(2024, 5, 8)),
        ];
        let new = vec![record("매출액", 1100, dec!(100), today)];

        // compared against the latest stored value (120), so 100 is a change
        let output = reconcile(prior, new, today);
        assert_eq!(output, vec![record("매출액", 1100, dec!(100), today)]);
    }

    #[test]
    fn duplicates_within_the_new_set_are_removed() {
        let today = date(2024, 5, 14);
        let new = vec![
            record("매출액", 1100, dec!(100), today),
            record("매출액", 1100, dec!(100), today),
        ];
        assert!(reconcile(vec![], new, today).is_empty());
    }

    #[test]
    fn latest_snapshot_keeps_newest_per_key() {
        let prior = vec![
            record("매출액", 1100, dec!(100), date(2024, 5, 1)),
            record("매출액", 1100, dec!(120), date(2024, 5, 8)),
            record("영업이익", 1300, dec!(10), date(2024, 5, 1)),
        ];
        let latest = latest_snapshot(prior);

        assert_eq!(latest.len(), 2);
        assert!(latest.contains(&record("매출액", 1100, dec!(120), date(2024, 5, 8))));
        assert!(latest.contains(&record("영업이익", 1300, dec!(10), date(2024, 5, 1))));
    }
}
