pub mod error;
pub mod penalty;
pub mod rates;
pub mod schedule;
pub mod summary;
pub mod types;

#[cfg(feature = "prepayment")]
pub mod prepayment;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use error::AmortisationError;
pub use types::*;

/// Standard result type for all amortisation operations
pub type AmortisationResult<T> = Result<T, AmortisationError>;
