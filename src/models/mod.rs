pub mod enriched_holding;
pub mod holding;
pub mod quote;
pub mod signal;
pub mod summary;

pub use enriched_holding::EnrichedHolding;
pub use holding::Holding;
pub use quote::Quote;
pub use signal::Signal;
pub use summary::PortfolioSummary;
