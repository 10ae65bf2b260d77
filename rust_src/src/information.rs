//! Item and test information curves over a theta grid.

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

use crate::item::Item;
use crate::utils::fisher_info_2pl;

/// Evenly spaced grid of `n_points` from `min` to `max` inclusive.
pub fn theta_grid(min: f64, max: f64, n_points: usize) -> Array1<f64> {
    Array1::linspace(min, max, n_points)
}

/// Information of every item at every grid point, shape `(n_items, n_theta)`.
pub fn item_information_curves(items: &[Item], theta_grid: &Array1<f64>) -> Array2<f64> {
    let n_theta = theta_grid.len();
    let rows: Vec<Vec<f64>> = items
        .par_iter()
        .map(|item| {
            theta_grid
                .iter()
                .map(|&theta| fisher_info_2pl(theta, item.discrimination(), item.difficulty()))
                .collect()
        })
        .collect();

    let mut result = Array2::zeros((items.len(), n_theta));
    for (j, row) in rows.iter().enumerate() {
        for (q, &val) in row.iter().enumerate() {
            result[[j, q]] = val;
        }
    }
    result
}

/// Test information function: column sums of [`item_information_curves`].
pub fn test_information_curve(items: &[Item], theta_grid: &Array1<f64>) -> Array1<f64> {
    if items.is_empty() {
        return Array1::zeros(theta_grid.len());
    }
    item_information_curves(items, theta_grid).sum_axis(Axis(0))
}

/// Conditional standard error `1 / sqrt(I(theta))` along the grid.
pub fn standard_error_curve(items: &[Item], theta_grid: &Array1<f64>) -> Array1<f64> {
    test_information_curve(items, theta_grid).mapv(|info| {
        if info > 0.0 {
            1.0 / info.sqrt()
        } else {
            f64::INFINITY
        }
    })
}
