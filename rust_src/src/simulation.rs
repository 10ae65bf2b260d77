//! Monte-Carlo simulation of complete CAT sessions.

use std::sync::Arc;

use rand::prelude::*;
use rand_distr::Binomial;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{IrtError, IrtResult};
use crate::estimation::{AbilityEstimate, Estimator};
use crate::item::{Item, ItemBank, LikertScale};
use crate::session::{CatDesign, CatSession, StopReason};
use crate::utils::prob_2pl;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationRun {
    pub true_theta: f64,
    pub estimate: AbilityEstimate,
    pub n_items: usize,
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionalAccuracy {
    pub theta: f64,
    pub bias: f64,
    pub mse: f64,
    pub mean_items: f64,
}

/// Draw a raw Likert response: `1 + Binomial(K - 1, p)`, reflected for
/// reverse-coded items so the keyed response follows the 2PL curve.
pub fn simulate_response<R: Rng + ?Sized>(
    item: &Item,
    theta: f64,
    scale: LikertScale,
    rng: &mut R,
) -> i32 {
    let p = prob_2pl(theta, item.discrimination(), item.difficulty());
    let trials = u64::from(scale.categories - 1);
    let successes = match Binomial::new(trials, p) {
        Ok(dist) => dist.sample(rng),
        Err(_) => (p * trials as f64).round() as u64,
    };
    let keyed = 1 + successes as i32;
    if item.reverse_coded() {
        scale.reflect(keyed)
    } else {
        keyed
    }
}

/// Simulate a single CAT session and return results
pub fn simulate_session(
    bank: &Arc<ItemBank>,
    estimator: &Estimator,
    design: &CatDesign,
    true_theta: f64,
    rng: &mut Pcg64,
) -> IrtResult<SimulationRun> {
    let scale = bank.scale();
    let mut session = CatSession::new(Arc::clone(bank), estimator.clone(), design.clone())?;
    let estimate = session.run(|item| simulate_response(item, true_theta, scale, &mut *rng))?;
    Ok(SimulationRun {
        true_theta,
        estimate,
        n_items: session.responses().len(),
        stop_reason: session.stop_reason(),
    })
}

/// Run `n_replications` sessions per true theta in parallel.
///
/// Each task is seeded from `seed`, its theta index and replication number,
/// so results do not depend on thread scheduling. Output is ordered by theta,
/// then replication.
pub fn simulate_sessions(
    bank: &Arc<ItemBank>,
    estimator: &Estimator,
    design: &CatDesign,
    true_thetas: &[f64],
    n_replications: usize,
    seed: u64,
) -> IrtResult<Vec<SimulationRun>> {
    design.validate(bank)?;

    let tasks: Vec<(usize, usize)> = (0..true_thetas.len())
        .flat_map(|t| (0..n_replications).map(move |r| (t, r)))
        .collect();

    tasks
        .par_iter()
        .map(|&(theta_idx, rep)| {
            let task_seed = seed
                .wrapping_add(theta_idx as u64 * 1000)
                .wrapping_add(rep as u64);
            let mut rng = Pcg64::seed_from_u64(task_seed);
            simulate_session(bank, estimator, design, true_thetas[theta_idx], &mut rng)
        })
        .collect()
}

/// Bias, MSE and mean test length at each true theta.
pub fn conditional_accuracy(
    bank: &Arc<ItemBank>,
    estimator: &Estimator,
    design: &CatDesign,
    eval_thetas: &[f64],
    n_replications: usize,
    seed: u64,
) -> IrtResult<Vec<ConditionalAccuracy>> {
    if n_replications == 0 {
        return Err(IrtError::InvalidConfig(
            "n_replications must be at least 1".into(),
        ));
    }
    let runs = simulate_sessions(bank, estimator, design, eval_thetas, n_replications, seed)?;

    Ok(runs
        .chunks(n_replications)
        .zip(eval_thetas)
        .map(|(group, &theta)| {
            let n = group.len() as f64;
            let mean_est = group.iter().map(|r| r.estimate.theta).sum::<f64>() / n;
            let mse = group
                .iter()
                .map(|r| (r.estimate.theta - theta).powi(2))
                .sum::<f64>()
                / n;
            let mean_items = group.iter().map(|r| r.n_items as f64).sum::<f64>() / n;
            ConditionalAccuracy {
                theta,
                bias: mean_est - theta,
                mse,
                mean_items,
            }
        })
        .collect())
}
