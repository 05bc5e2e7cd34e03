use chrono::NaiveDate;
use deadpool_postgres::{ManagerConfig, RecyclingMethod};
use dotenv::var;
use marketdata_spider::consensus::{
    AccountingStandard, ConsensusRecord, ForecastIndicator, PgStore, Store,
};
use rust_decimal_macros::dec;

// Round trip through a live database; needs MARKETDATA_URL.

fn pool() -> deadpool_postgres::Pool {
    dotenv::dotenv().ok();
    let mut pg_config = deadpool_postgres::Config::new();
    pg_config.url = Some(var("MARKETDATA_URL").expect("environment variable MARKETDATA_URL"));
    pg_config.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    pg_config
        .create_pool(
            Some(deadpool_postgres::Runtime::Tokio1),
            tokio_postgres::NoTls,
        )
        .unwrap()
}

fn record(value: rust_decimal::Decimal, update_date: NaiveDate) -> ConsensusRecord {
    ConsensusRecord {
        ticker: "TEST01".to_string(),
        statement_period: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
        financial_item_name: "매출액".to_string(),
        financial_item_code: 1100,
        value,
        accounting_standard: AccountingStandard::IfrsConsolidated,
        forecast_indicator: ForecastIndicator::Estimated,
        update_date,
    }
}

#[tokio::test]
#[ignore = "needs a live MARKETDATA_URL"]
async fn append_then_read_latest_snapshot() {
    let pool = pool();
    let store = PgStore::new(pool.clone());
    store.init().await.unwrap();

    let pg_client = pool.get().await.unwrap();
    pg_client
        .execute(
            "DELETE FROM naver.consensus_financials WHERE ticker = 'TEST01'",
            &[],
        )
        .await
        .unwrap();

    let day1 = NaiveDate::from_ymd_opt(2099, 1, 1).unwrap();
    let day2 = NaiveDate::from_ymd_opt(2099, 1, 2).unwrap();
    assert_eq!(store.append(&[record(dec!(100), day1)]).await.unwrap(), 1);
    assert_eq!(store.append(&[record(dec!(100), day1)]).await.unwrap(), 0);
    assert_eq!(store.append(&[record(dec!(120), day2)]).await.unwrap(), 1);

    let prior = store.prior_snapshot("TEST01").await.unwrap();
    assert_eq!(prior, vec![record(dec!(120), day2)]);

    // same-day revision: the stored row ahead of it is collapsed, the value replaced
    let revision = [record(dec!(120), day2), record(dec!(130), day2)];
    assert_eq!(store.append(&revision).await.unwrap(), 1);
    let prior = store.prior_snapshot("TEST01").await.unwrap();
    assert_eq!(prior, vec![record(dec!(130), day2)]);

    pg_client
        .execute(
            "DELETE FROM naver.consensus_financials WHERE ticker = 'TEST01'",
            &[],
        )
        .await
        .unwrap();
}
