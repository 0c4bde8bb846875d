//! Numerical kernels behind the spectral transforms.

pub mod fourier;
pub mod smoothing;
pub mod special;

pub use fourier::{FourierFilterError, frequency_band_filter};
pub use smoothing::{SmoothingError, centered_moving_average, savitzky_golay};

/// Compensated (Neumaier) sum.
pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;
    for &value in values {
        let next = sum + value;
        compensation += if sum.abs() >= value.abs() {
            (sum - next) + value
        } else {
            (value - next) + sum
        };
        sum = next;
    }
    sum + compensation
}

/// Arithmetic mean, `None` for an empty slice.
pub fn stable_mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| stable_sum(values) / values.len() as f64)
}

/// `|lhs - rhs|` is at most `abs_tol`, or at most `rel_tol` times the larger
/// magnitude.
pub fn within_tolerance(lhs: f64, rhs: f64, abs_tol: f64, rel_tol: f64) -> bool {
    let difference = (lhs - rhs).abs();
    difference <= abs_tol || difference <= rel_tol * lhs.abs().max(rhs.abs())
}

#[cfg(test)]
mod tests {
    use super::{stable_mean, stable_sum, within_tolerance};

    #[test]
    fn compensated_sum_keeps_small_terms_between_cancelling_large_ones() {
        assert_eq!(stable_sum(&[1.0e16, 1.0, -1.0e16]), 1.0);
        assert_eq!(stable_sum(&[0.1; 10]), 1.0);
        assert_eq!(stable_sum(&[]), 0.0);
    }

    #[test]
    fn mean_of_empty_slice_is_none() {
        assert_eq!(stable_mean(&[]), None);
        assert_eq!(stable_mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn tolerance_accepts_absolute_or_relative_agreement() {
        assert!(within_tolerance(2.0e-5, 2.5e-5, 1.0e-5, 0.0));
        assert!(within_tolerance(1000.0, 1000.2, 0.0, 5.0e-4));
        assert!(!within_tolerance(1.0, 1.1, 1.0e-3, 1.0e-3));
        assert!(!within_tolerance(1.0, f64::NAN, 1.0, 1.0));
    }
}
