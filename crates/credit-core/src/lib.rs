//! # Credit Core
//!
//! Wallet creditworthiness scoring for lending protocol activity.
//!
//! Raw transaction events (deposits, borrows, repays, redemptions and
//! liquidation calls) are normalized into canonical records, grouped by
//! wallet, reduced into behavioral aggregates and scored with a fixed,
//! deterministic rule set. The crate performs no I/O; callers hand it a
//! sequence of [`RawEvent`]s and receive a `wallet -> score` mapping.

pub mod aggregate;
pub mod error;
pub mod literal;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod scoring;

pub use aggregate::*;
pub use error::*;
pub use literal::{parse_literal, LiteralError};
pub use models::*;
pub use normalizer::*;
pub use pipeline::*;
pub use scoring::*;
