pub mod app;
pub mod calc;
pub mod classify;
pub mod portfolio;
pub mod ui;
pub mod utils;

pub use app::{App, CycleOutcome, LoopState};
pub use classify::{Thresholds, classify};
pub use portfolio::{InvalidNumericPolicy, load_portfolio};
pub use utils::SymbolNormalizer;
