//! 2PL Item Response Theory engine for Likert-scale assessments.
//!
//! This crate provides:
//! - Ability (theta) estimation by Newton-Raphson or damped gradient ascent
//! - Standard errors with an optional normal-prior regularization
//! - Derived scores (z-score, percentile, reliability proxy, classical mean)
//! - Maximum-information adaptive item selection with a fixed opening block
//! - A per-test-taker CAT session with count and SE based stopping
//! - Item/test information curves and Monte-Carlo CAT simulation
//!
//! Python bindings are available behind the `python` feature.

pub mod utils;

pub mod cat;
pub mod config;
pub mod error;
pub mod estimation;
pub mod information;
pub mod item;
pub mod response;
pub mod scoring;
pub mod session;
pub mod simulation;

#[cfg(feature = "python")]
pub mod python;

pub use cat::{rank_items, select_next, ItemPool, Stage};
pub use config::EngineConfig;
pub use error::{IrtError, IrtResult};
pub use estimation::{AbilityEstimate, Estimator, EstimatorConfig, UpdateRule};
pub use item::{Item, ItemBank, ItemId, ItemRow, LikertScale};
pub use response::ResponseRecord;
pub use scoring::{ClassicalScore, PopulationNorms, ScoreSummary};
pub use session::{CatDesign, CatSession, SessionState, StopReason, StoppingRule};
