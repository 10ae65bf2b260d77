//! Per-test-taker CAT session: fixed block, adaptive block, stop.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cat::{select_next, ItemPool, Stage};
use crate::error::{IrtError, IrtResult};
use crate::estimation::{AbilityEstimate, Estimator};
use crate::item::{Item, ItemBank, ItemId};
use crate::response::ResponseRecord;
use crate::scoring::{ClassicalScore, PopulationNorms, ScoreSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingRule {
    /// Total items including the fixed block.
    pub max_items: usize,
    /// Items required before `min_sem` may stop the session.
    pub min_items: usize,
    /// Stop once `standard_error <= min_sem`. `None` gives a fixed-length test.
    pub min_sem: Option<f64>,
}

impl Default for StoppingRule {
    fn default() -> Self {
        Self {
            max_items: 10,
            min_items: 5,
            min_sem: None,
        }
    }
}

impl StoppingRule {
    pub fn validate(&self) -> IrtResult<()> {
        if self.max_items == 0 {
            return Err(IrtError::InvalidConfig("max_items must be at least 1".into()));
        }
        if self.min_items > self.max_items {
            return Err(IrtError::InvalidConfig(format!(
                "min_items ({}) exceeds max_items ({})",
                self.min_items, self.max_items
            )));
        }
        if let Some(min_sem) = self.min_sem {
            if !(min_sem.is_finite() && min_sem > 0.0) {
                return Err(IrtError::InvalidConfig(format!(
                    "min_sem must be positive, got {min_sem}"
                )));
            }
        }
        Ok(())
    }
}

/// Test design: the standardized opening block and the stopping rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatDesign {
    pub fixed_items: Vec<ItemId>,
    pub stopping: StoppingRule,
}

impl CatDesign {
    pub fn validate(&self, bank: &ItemBank) -> IrtResult<()> {
        self.stopping.validate()?;
        if self.stopping.max_items < self.fixed_items.len() {
            return Err(IrtError::InvalidConfig(format!(
                "max_items ({}) is shorter than the fixed block ({} items)",
                self.stopping.max_items,
                self.fixed_items.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.fixed_items.len());
        for id in &self.fixed_items {
            bank.require(id)?;
            if !seen.insert(id) {
                return Err(IrtError::DuplicateItem(id.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Fixed,
    Adaptive,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxItems,
    StandardError,
    PoolExhausted,
}

/// State of one test-taker. Sessions share the bank and nothing else.
#[derive(Debug, Clone)]
pub struct CatSession {
    bank: Arc<ItemBank>,
    estimator: Estimator,
    design: CatDesign,
    pool: ItemPool,
    responses: Vec<ResponseRecord>,
    trace: Vec<AbilityEstimate>,
    state: SessionState,
    stop_reason: Option<StopReason>,
}

impl CatSession {
    pub fn new(bank: Arc<ItemBank>, estimator: Estimator, design: CatDesign) -> IrtResult<Self> {
        design.validate(&bank)?;
        let pool = bank.pool();
        let mut session = Self {
            bank,
            estimator,
            state: if design.fixed_items.is_empty() {
                SessionState::Adaptive
            } else {
                SessionState::Fixed
            },
            design,
            pool,
            responses: Vec::new(),
            trace: Vec::new(),
            stop_reason: None,
        };
        if session.pool.is_empty() {
            session.finish(StopReason::PoolExhausted);
        }
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }

    pub fn bank(&self) -> &ItemBank {
        &self.bank
    }

    pub fn pool(&self) -> &ItemPool {
        &self.pool
    }

    pub fn responses(&self) -> &[ResponseRecord] {
        &self.responses
    }

    /// Estimates after each recorded response.
    pub fn trace(&self) -> &[AbilityEstimate] {
        &self.trace
    }

    pub fn current_estimate(&self) -> Option<&AbilityEstimate> {
        self.trace.last()
    }

    /// Current theta; 0 before any response.
    pub fn theta(&self) -> f64 {
        self.current_estimate().map_or(0.0, |est| est.theta)
    }

    pub fn summary(&self, norms: &PopulationNorms) -> Option<ScoreSummary> {
        self.current_estimate()
            .map(|est| ScoreSummary::from_estimate(est, norms))
    }

    pub fn classical_score(&self) -> IrtResult<ClassicalScore> {
        ClassicalScore::compute(&self.responses)
    }

    /// Item to present next, or `None` once the session is done.
    ///
    /// Does not consume the item; calling twice returns the same id.
    pub fn next_item(&mut self) -> Option<ItemId> {
        if self.state == SessionState::Fixed {
            let fixed = select_next(
                &self.pool,
                self.theta(),
                Stage::Fixed,
                &self.design.fixed_items,
            );
            if fixed.is_some() {
                return fixed;
            }
            self.enter_adaptive();
        }
        if self.state == SessionState::Adaptive {
            let adaptive = select_next(&self.pool, self.theta(), Stage::Adaptive, &[]);
            if adaptive.is_none() {
                self.finish(StopReason::PoolExhausted);
            }
            return adaptive;
        }
        None
    }

    /// Record a response, refresh theta and apply the stopping rule.
    pub fn record_response(
        &mut self,
        id: &ItemId,
        raw_response: i32,
    ) -> IrtResult<AbilityEstimate> {
        if self.is_done() {
            return Err(IrtError::SessionFinished);
        }
        if !self.pool.contains(id) {
            self.bank.require(id)?;
            return Err(IrtError::ItemNotAvailable(id.clone()));
        }

        let record = self.bank.record_response(id, raw_response)?;
        self.pool.remove(id);
        self.responses.push(record);

        let estimate = self.estimator.estimate(&self.bank, &self.responses)?;
        self.trace.push(estimate);

        if self.state == SessionState::Fixed
            && !self.design.fixed_items.iter().any(|f| self.pool.contains(f))
        {
            self.enter_adaptive();
        }
        if let Some(reason) = self.should_stop(&estimate) {
            self.finish(reason);
        }
        Ok(estimate)
    }

    /// Drive the session to completion, asking `respond` for each selected item.
    pub fn run<F>(&mut self, mut respond: F) -> IrtResult<AbilityEstimate>
    where
        F: FnMut(&Item) -> i32,
    {
        while let Some(id) = self.next_item() {
            let raw = respond(self.bank.require(&id)?);
            self.record_response(&id, raw)?;
        }
        self.current_estimate()
            .copied()
            .ok_or(IrtError::EmptyResponses)
    }

    fn should_stop(&self, estimate: &AbilityEstimate) -> Option<StopReason> {
        let rule = &self.design.stopping;
        let administered = self.responses.len();
        if administered >= rule.max_items {
            return Some(StopReason::MaxItems);
        }
        // The fixed block always runs to completion.
        if self.state != SessionState::Adaptive {
            return None;
        }
        if let Some(min_sem) = rule.min_sem {
            if administered >= rule.min_items && estimate.standard_error <= min_sem {
                return Some(StopReason::StandardError);
            }
        }
        if self.pool.is_empty() {
            return Some(StopReason::PoolExhausted);
        }
        None
    }

    fn enter_adaptive(&mut self) {
        info!(
            administered = self.responses.len(),
            "fixed items exhausted; switching to adaptive selection"
        );
        self.state = SessionState::Adaptive;
    }

    fn finish(&mut self, reason: StopReason) {
        info!(
            ?reason,
            administered = self.responses.len(),
            theta = self.theta(),
            "session finished"
        );
        self.state = SessionState::Done;
        self.stop_reason = Some(reason);
    }
}
