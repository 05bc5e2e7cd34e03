mod sql;

/// Daily trading data of every listed stock, downloaded through the KRX one-time-code file
/// service.
pub mod market_data;

pub use market_data::{latest_trading_day, MarketData};
