//! Ability estimation for the 2PL model (Newton-Raphson / damped gradient).
//!
//! Likert responses are reverse-coded and normalized to `[0, 1]` and used as a
//! continuous proxy for the probability of endorsement in the 2PL likelihood.
//! This is a modeling simplification: a graded model would use category
//! thresholds instead of a single difficulty per item.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IrtError, IrtResult};
use crate::item::{ItemBank, ItemId};
use crate::response::{key_response, ResponseRecord};
use crate::utils::{clip, prob_2pl, test_information, EPSILON};

/// How theta is moved on each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRule {
    /// `theta += S / I`
    #[default]
    Newton,
    /// `theta += damping * S`
    DampedGradient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub max_iter: usize,
    pub tol: f64,
    pub update_rule: UpdateRule,
    /// Step multiplier for [`UpdateRule::DampedGradient`].
    pub damping: f64,
    /// Variance of the normal prior used to regularize the standard error.
    /// `f64::INFINITY` (`inf` in TOML) gives the pure MLE standard error.
    pub prior_variance: f64,
    pub se_min: f64,
    pub se_max: f64,
    pub theta_min: f64,
    pub theta_max: f64,
    /// Information at or below this value skips the update.
    pub flat_information: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iter: 20,
            tol: 1e-3,
            update_rule: UpdateRule::Newton,
            damping: 0.1,
            prior_variance: 4.0,
            se_min: 0.1,
            se_max: 1.5,
            theta_min: -3.0,
            theta_max: 3.0,
            flat_information: 0.01,
        }
    }
}

impl EstimatorConfig {
    pub fn prior_precision(&self) -> f64 {
        1.0 / self.prior_variance
    }

    pub fn validate(&self) -> IrtResult<()> {
        let fail = |msg: String| Err(IrtError::InvalidConfig(msg));
        if self.max_iter == 0 {
            return fail("max_iter must be at least 1".into());
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return fail(format!("tol must be positive, got {}", self.tol));
        }
        if !(self.damping.is_finite() && self.damping > 0.0) {
            return fail(format!("damping must be positive, got {}", self.damping));
        }
        if self.prior_variance.is_nan() || self.prior_variance <= 0.0 {
            return fail(format!(
                "prior_variance must be positive, got {}",
                self.prior_variance
            ));
        }
        if !(self.se_min > 0.0 && self.se_min <= self.se_max && self.se_max.is_finite()) {
            return fail(format!(
                "standard error bounds must satisfy 0 < se_min <= se_max, got [{}, {}]",
                self.se_min, self.se_max
            ));
        }
        if !(self.theta_min.is_finite() && self.theta_max.is_finite())
            || self.theta_min >= self.theta_max
        {
            return fail(format!(
                "theta bounds must satisfy theta_min < theta_max, got [{}, {}]",
                self.theta_min, self.theta_max
            ));
        }
        if self.flat_information.is_nan() || self.flat_information < 0.0 {
            return fail(format!(
                "flat_information must be non-negative, got {}",
                self.flat_information
            ));
        }
        Ok(())
    }
}

/// Result of one estimation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    pub theta: f64,
    pub standard_error: f64,
    /// Test information at `theta` for the administered items.
    pub information: f64,
    pub converged: bool,
    pub iterations: usize,
    pub n_items: usize,
}

/// Stateless 2PL ability estimator.
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> IrtResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate theta from a response history. Item parameters are resolved by id.
    ///
    /// Raw responses are re-checked against the bank's scale and rekeyed from
    /// the bank's items, so records built against another scale or keying
    /// cannot slip through.
    pub fn estimate(
        &self,
        bank: &ItemBank,
        responses: &[ResponseRecord],
    ) -> IrtResult<AbilityEstimate> {
        if responses.is_empty() {
            return Err(IrtError::EmptyResponses);
        }

        let scale = bank.scale();
        let n = responses.len();
        let mut disc = Vec::with_capacity(n);
        let mut diff = Vec::with_capacity(n);
        let mut observed = Vec::with_capacity(n);
        for record in responses {
            let item = bank.require(record.item_id())?;
            disc.push(item.discrimination());
            diff.push(item.difficulty());
            let keyed = key_response(item, record.raw_response(), scale)?;
            observed.push(scale.normalize(keyed));
        }

        Ok(self.solve(&disc, &diff, &observed))
    }

    /// One estimate per prefix of `responses`: theta over the administered sequence.
    pub fn estimate_trace(
        &self,
        bank: &ItemBank,
        responses: &[ResponseRecord],
    ) -> IrtResult<Vec<AbilityEstimate>> {
        if responses.is_empty() {
            return Err(IrtError::EmptyResponses);
        }
        (1..=responses.len())
            .map(|k| self.estimate(bank, &responses[..k]))
            .collect()
    }

    /// Validate raw `(item, response)` pairs and score them in a single pass.
    pub fn score_all(
        &self,
        bank: &ItemBank,
        raw_responses: &[(ItemId, i32)],
    ) -> IrtResult<AbilityEstimate> {
        let records = raw_responses
            .iter()
            .map(|(id, raw)| bank.record_response(id, *raw))
            .collect::<IrtResult<Vec<_>>>()?;
        self.estimate(bank, &records)
    }

    /// Estimate many independent test-takers in parallel.
    pub fn estimate_batch(
        &self,
        bank: &ItemBank,
        sessions: &[Vec<ResponseRecord>],
    ) -> Vec<IrtResult<AbilityEstimate>> {
        sessions
            .par_iter()
            .map(|responses| self.estimate(bank, responses))
            .collect()
    }

    fn solve(&self, disc: &[f64], diff: &[f64], observed: &[f64]) -> AbilityEstimate {
        let cfg = &self.config;
        let mut theta = 0.0;
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..cfg.max_iter {
            iterations = iter + 1;
            let (score, info) = score_and_information(theta, disc, diff, observed);

            if info.abs() <= cfg.flat_information {
                // Theta does not move, so every remaining iteration would skip too.
                warn!(
                    theta,
                    info,
                    iteration = iterations,
                    "likelihood too flat to update theta"
                );
                break;
            }

            let step = match cfg.update_rule {
                UpdateRule::Newton => score / info,
                UpdateRule::DampedGradient => cfg.damping * score,
            };
            theta += step;

            if step.abs() < cfg.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                theta,
                iterations,
                max_iter = cfg.max_iter,
                "theta estimation did not converge; returning last iterate"
            );
        }

        let theta = clip(theta, cfg.theta_min, cfg.theta_max);
        let information = test_information(theta, disc, diff);
        let precision = information + cfg.prior_precision();
        let standard_error = if precision > EPSILON {
            clip(1.0 / precision.sqrt(), cfg.se_min, cfg.se_max)
        } else {
            cfg.se_max
        };

        debug!(
            n_items = disc.len(),
            theta,
            standard_error,
            iterations,
            converged,
            "ability estimated"
        );

        AbilityEstimate {
            theta,
            standard_error,
            information,
            converged,
            iterations,
            n_items: disc.len(),
        }
    }
}

/// Score `S = sum a (x - p)` and information `I = sum a^2 p (1 - p)` at theta.
#[inline]
fn score_and_information(
    theta: f64,
    disc: &[f64],
    diff: &[f64],
    observed: &[f64],
) -> (f64, f64) {
    let mut score = 0.0;
    let mut info = 0.0;
    for j in 0..disc.len() {
        let a = disc[j];
        let p = prob_2pl(theta, a, diff[j]);
        score += a * (observed[j] - p);
        info += a * a * p * (1.0 - p);
    }
    (score, info)
}
