//! Risk scoring.
//!
//! # Modules
//!
//! - `types` - Risk levels, assessments and persisted snapshots
//! - `engine` - Pure additive scoring function

pub mod engine;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::{AllowListLookup, CountryRiskLookup, RiskEngine, UNKNOWN_COUNTRY};
pub use types::{RiskAssessment, RiskLevel, RiskScore};
