//! Core types for riskmap: property records, the portfolio store, and map viewport geometry.

mod error;
pub mod portfolio;
pub mod record;
pub mod viewport;

pub use error::PortfolioError;
pub use portfolio::{Portfolio, PortfolioSummary};
pub use record::{Peril, PropertyRecord, grade_to_score};
pub use viewport::{MapView, ViewportBounds, fit_records};
