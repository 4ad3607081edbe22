//! Core detection pipeline: quote scanning, profit scoring, and
//! publish-suppression bookkeeping.

pub mod cooldown;
pub mod profit_model;
pub mod scanner;

pub use cooldown::{Cooldown, FailureBackoff};
pub use profit_model::{ProfitModelConfig, ScoredRoute};
pub use scanner::{Finding, Scanner};
