//! Shared numeric helpers for the 2PL model.

pub const EPSILON: f64 = 1e-10;

/// Numerically stable logistic function.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

#[inline]
pub fn clip(x: f64, min: f64, max: f64) -> f64 {
    x.max(min).min(max)
}

/// 2PL response probability `1 / (1 + exp(-a (theta - b)))`.
#[inline]
pub fn prob_2pl(theta: f64, discrimination: f64, difficulty: f64) -> f64 {
    sigmoid(discrimination * (theta - difficulty))
}

/// Fisher information of a single 2PL item: `a^2 p (1 - p)`.
#[inline]
pub fn fisher_info_2pl(theta: f64, discrimination: f64, difficulty: f64) -> f64 {
    let p = prob_2pl(theta, discrimination, difficulty);
    discrimination * discrimination * p * (1.0 - p)
}

/// Fisher information for all items at a given theta
pub fn fisher_info_2pl_items(theta: f64, discrimination: &[f64], difficulty: &[f64]) -> Vec<f64> {
    discrimination
        .iter()
        .zip(difficulty)
        .map(|(&a, &b)| fisher_info_2pl(theta, a, b))
        .collect()
}

/// Compute test information at theta
#[inline]
pub fn test_information(theta: f64, discrimination: &[f64], difficulty: &[f64]) -> f64 {
    discrimination
        .iter()
        .zip(difficulty)
        .map(|(&a, &b)| fisher_info_2pl(theta, a, b))
        .sum()
}

/// Standard normal CDF approximation (Abramowitz & Stegun 26.2.17).
pub fn normal_cdf(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.2316419 * x.abs());
    let d = 0.3989423 * (-x * x / 2.0).exp();
    let p =
        d * t * (0.3193815 + t * (-0.3565638 + t * (1.781478 + t * (-1.821256 + t * 1.330274))));
    if x > 0.0 {
        1.0 - p
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_half_at_zero() {
        assert_eq!(sigmoid(0.0), 0.5);
    }

    #[test]
    fn prob_is_half_at_difficulty() {
        for &a in &[0.3, 1.0, 1.7, 4.2] {
            for &b in &[-2.5, -0.4, 0.0, 1.3] {
                assert_eq!(prob_2pl(b, a, b), 0.5);
            }
        }
    }

    #[test]
    fn sigmoid_stable_at_extremes() {
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
    }

    #[test]
    fn information_increases_with_discrimination() {
        let theta = 0.4;
        let b = -0.3;
        let mut prev = 0.0;
        for &a in &[0.2, 0.5, 0.9, 1.3, 1.8] {
            let info = fisher_info_2pl(theta, a, b);
            assert!(info > prev, "a={a}: {info} <= {prev}");
            prev = info;
        }
    }

    #[test]
    fn information_peaks_at_difficulty() {
        let a = 1.5;
        let b = 0.7;
        let peak = fisher_info_2pl(b, a, b);
        assert!((peak - a * a * 0.25).abs() < 1e-12);
        assert!(fisher_info_2pl(b + 0.5, a, b) < peak);
        assert!(fisher_info_2pl(b - 0.5, a, b) < peak);
    }

    #[test]
    fn test_information_sums_items() {
        let disc = [1.0, 2.0, 1.0];
        let diff = [-1.0, 0.0, 1.0];
        let items = fisher_info_2pl_items(0.0, &disc, &diff);
        let total = test_information(0.0, &disc, &diff);
        assert!((items.iter().sum::<f64>() - total).abs() < 1e-12);
        assert!((items[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normal_cdf_reference_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-4);
        assert!((normal_cdf(-1.0) - 0.158655).abs() < 1e-4);
    }

    #[test]
    fn clip_bounds() {
        assert_eq!(clip(5.0, -3.0, 3.0), 3.0);
        assert_eq!(clip(-5.0, -3.0, 3.0), -3.0);
        assert_eq!(clip(0.2, -3.0, 3.0), 0.2);
    }
}
