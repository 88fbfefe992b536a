pub mod price_fetcher;

pub use price_fetcher::PriceFetcher;
