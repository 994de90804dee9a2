//! API clients for market data and news providers

pub mod coingecko;
pub mod finnhub;

pub use coingecko::CoinGeckoClient;
pub use finnhub::{FinnhubClient, FinnhubNewsArticle};
