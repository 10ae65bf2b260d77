//! Python bindings (enabled with the `python` feature).

use ndarray::Array1;
use numpy::{PyArray1, PyReadonlyArray1, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::cat::{select_max_info as select_from_pool, ItemPool};
use crate::error::IrtError;
use crate::estimation::{Estimator, EstimatorConfig, UpdateRule};
use crate::item::{Item, ItemBank, ItemId, LikertScale};
use crate::utils::fisher_info_2pl_items;

impl From<IrtError> for PyErr {
    fn from(err: IrtError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Positional ids; `select_max_info` parses them back into indices.
fn positional_id(j: usize) -> ItemId {
    ItemId::new(format!("{j:010}"))
}

fn build_items(
    discrimination: &[f64],
    difficulty: &[f64],
    reverse_coded: Option<&[bool]>,
) -> PyResult<Vec<Item>> {
    if discrimination.len() != difficulty.len()
        || reverse_coded.is_some_and(|r| r.len() != discrimination.len())
    {
        return Err(PyValueError::new_err("item parameter arrays differ in length"));
    }
    (0..discrimination.len())
        .map(|j| {
            let reverse = reverse_coded.is_some_and(|r| r[j]);
            Item::new(positional_id(j), discrimination[j], difficulty[j], reverse)
                .map_err(PyErr::from)
        })
        .collect()
}

/// Compute Fisher information for all items at a given theta
#[pyfunction]
pub fn compute_item_info<'py>(
    py: Python<'py>,
    theta: f64,
    discrimination: PyReadonlyArray1<f64>,
    difficulty: PyReadonlyArray1<f64>,
) -> Bound<'py, PyArray1<f64>> {
    let disc = discrimination.as_array().to_vec();
    let diff = difficulty.as_array().to_vec();
    let info = fisher_info_2pl_items(theta, &disc, &diff);
    Array1::from_vec(info).to_pyarray(py)
}

/// Index of the most informative available item, or None when none are available
#[pyfunction]
pub fn select_max_info(
    theta: f64,
    discrimination: PyReadonlyArray1<f64>,
    difficulty: PyReadonlyArray1<f64>,
    available_mask: PyReadonlyArray1<bool>,
) -> PyResult<Option<usize>> {
    let disc = discrimination.as_array().to_vec();
    let diff = difficulty.as_array().to_vec();
    let available = available_mask.as_array().to_vec();
    if available.len() != disc.len() {
        return Err(PyValueError::new_err("available_mask length differs from item count"));
    }

    let items = build_items(&disc, &diff, None)?;
    let pool = ItemPool::new(
        items
            .into_iter()
            .zip(available)
            .filter_map(|(item, open)| open.then_some(item)),
    );

    Ok(select_from_pool(&pool, theta).and_then(|(id, _)| id.as_str().parse().ok()))
}

/// Estimate theta from Likert responses (coded 1..=n_categories)
///
/// Returns (theta, standard_error, information, converged).
#[pyfunction]
#[pyo3(signature = (
    discrimination,
    difficulty,
    reverse_coded,
    responses,
    n_categories = 5,
    max_iter = 20,
    tol = 1e-3,
    update_rule = "newton",
    prior_variance = 4.0
))]
#[allow(clippy::too_many_arguments)]
pub fn estimate_theta(
    discrimination: PyReadonlyArray1<f64>,
    difficulty: PyReadonlyArray1<f64>,
    reverse_coded: PyReadonlyArray1<bool>,
    responses: PyReadonlyArray1<i32>,
    n_categories: u32,
    max_iter: usize,
    tol: f64,
    update_rule: &str,
    prior_variance: f64,
) -> PyResult<(f64, f64, f64, bool)> {
    let disc = discrimination.as_array().to_vec();
    let diff = difficulty.as_array().to_vec();
    let reverse = reverse_coded.as_array().to_vec();
    let resp = responses.as_array().to_vec();
    if resp.len() != disc.len() {
        return Err(PyValueError::new_err("responses length differs from item count"));
    }

    let update_rule = match update_rule {
        "newton" => UpdateRule::Newton,
        "damped_gradient" => UpdateRule::DampedGradient,
        other => {
            return Err(PyValueError::new_err(format!(
                "unknown update_rule {other:?}; expected \"newton\" or \"damped_gradient\""
            )))
        }
    };
    let estimator = Estimator::new(EstimatorConfig {
        max_iter,
        tol,
        update_rule,
        prior_variance,
        ..EstimatorConfig::default()
    })?;

    let bank = ItemBank::new(
        LikertScale::new(n_categories)?,
        build_items(&disc, &diff, Some(reverse.as_slice()))?,
    )?;
    let raw: Vec<(ItemId, i32)> = resp
        .into_iter()
        .enumerate()
        .map(|(j, r)| (positional_id(j), r))
        .collect();

    let est = estimator.score_all(&bank, &raw)?;
    Ok((est.theta, est.standard_error, est.information, est.converged))
}

/// Register functions with the Python module
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute_item_info, m)?)?;
    m.add_function(wrap_pyfunction!(select_max_info, m)?)?;
    m.add_function(wrap_pyfunction!(estimate_theta, m)?)?;
    Ok(())
}

/// Python module for inrep_rs
#[pymodule]
fn inrep_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    register(m)
}
