//! Derived scores reported alongside an ability estimate.

use serde::{Deserialize, Serialize};

use crate::error::{IrtError, IrtResult};
use crate::estimation::AbilityEstimate;
use crate::response::ResponseRecord;
use crate::utils::{clip, normal_cdf};

/// Reference population for z-scores and percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationNorms {
    pub mean: f64,
    pub sd: f64,
}

impl Default for PopulationNorms {
    fn default() -> Self {
        Self { mean: 0.0, sd: 1.0 }
    }
}

impl PopulationNorms {
    pub fn validate(&self) -> IrtResult<()> {
        if !self.mean.is_finite() || !(self.sd.is_finite() && self.sd > 0.0) {
            return Err(IrtError::InvalidConfig(format!(
                "population norms need a finite mean and positive sd, got mean={} sd={}",
                self.mean, self.sd
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub theta: f64,
    pub standard_error: f64,
    pub z_score: f64,
    /// `Phi(z) * 100`
    pub percentile: f64,
    /// `1 - SE^2` clipped to `[0, 1]`. A rough proxy, not a reliability coefficient.
    pub reliability: f64,
}

impl ScoreSummary {
    pub fn from_estimate(estimate: &AbilityEstimate, norms: &PopulationNorms) -> Self {
        let z_score = (estimate.theta - norms.mean) / norms.sd;
        Self {
            theta: estimate.theta,
            standard_error: estimate.standard_error,
            z_score,
            percentile: normal_cdf(z_score) * 100.0,
            reliability: clip(1.0 - estimate.standard_error.powi(2), 0.0, 1.0),
        }
    }
}

/// Reverse-coded mean on the raw response scale.
///
/// Independent of theta; never used as a stand-in for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassicalScore {
    pub sum: i64,
    pub mean: f64,
    pub n_items: usize,
}

impl ClassicalScore {
    pub fn compute(responses: &[ResponseRecord]) -> IrtResult<Self> {
        if responses.is_empty() {
            return Err(IrtError::EmptyResponses);
        }
        let sum: i64 = responses
            .iter()
            .map(|r| i64::from(r.scored_response()))
            .sum();
        Ok(Self {
            sum,
            mean: sum as f64 / responses.len() as f64,
            n_items: responses.len(),
        })
    }
}
