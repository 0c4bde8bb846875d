#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimpsonError {
    #[error("simpson integration requires at least 2 points, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("simpson input length mismatch: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("simpson abscissae must increase, index {index} has {current} after {previous}")]
    NonIncreasingAbscissa {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("simpson integration produced a non-finite result")]
    NonFiniteResult,
}

/// Composite Simpson rule on an arbitrary increasing grid.
///
/// Pairs of intervals use the unequal-spacing parabola. For an even number of
/// samples the trailing interval is closed with the three-point correction of
/// Cartwright, so the rule stays third-order on every grid. Two samples fall
/// back to the trapezoid.
pub fn integrate_simpson(x: &[f64], y: &[f64]) -> Result<f64, SimpsonError> {
    validate_input(x, y)?;

    let count = x.len();
    if count == 2 {
        return finite(0.5 * (x[1] - x[0]) * (y[0] + y[1]));
    }

    let paired_end = if count % 2 == 1 { count - 1 } else { count - 2 };
    let mut integral = 0.0;
    let mut index = 0;
    while index + 2 <= paired_end {
        let h0 = x[index + 1] - x[index];
        let h1 = x[index + 2] - x[index + 1];
        let h_sum = h0 + h1;
        let ratio = h0 / h1;
        integral += h_sum / 6.0
            * (y[index] * (2.0 - 1.0 / ratio)
                + y[index + 1] * (h_sum * h_sum / (h0 * h1))
                + y[index + 2] * (2.0 - ratio));
        index += 2;
    }

    if count % 2 == 0 {
        let h0 = x[count - 2] - x[count - 3];
        let h1 = x[count - 1] - x[count - 2];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
        integral += alpha * y[count - 1] + beta * y[count - 2] - eta * y[count - 3];
    }

    finite(integral)
}

fn finite(value: f64) -> Result<f64, SimpsonError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimpsonError::NonFiniteResult)
    }
}

fn validate_input(x: &[f64], y: &[f64]) -> Result<(), SimpsonError> {
    if x.len() != y.len() {
        return Err(SimpsonError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(SimpsonError::InsufficientPoints { actual: x.len() });
    }
    for index in 1..x.len() {
        if x[index] <= x[index - 1] {
            return Err(SimpsonError::NonIncreasingAbscissa {
                index,
                previous: x[index - 1],
                current: x[index],
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{SimpsonError, integrate_simpson};

    #[test]
    fn simpson_is_exact_for_cubics_on_uniform_odd_grids() {
        let x: Vec<f64> = (0..=10).map(|i| f64::from(i) * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|v| v * v * v - 2.0 * v + 1.0).collect();
        let actual = integrate_simpson(&x, &y).expect("integration");
        let expected = 2.0_f64.powi(4) / 4.0 - 2.0_f64.powi(2) + 2.0;
        assert!((actual - expected).abs() <= 1.0e-12, "{actual} vs {expected}");
    }

    #[test]
    fn simpson_handles_even_point_counts_on_irregular_grids() {
        let x = [0.0, 0.1, 0.35, 0.5, 0.8, 1.0];
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let actual = integrate_simpson(&x, &y).expect("integration");
        assert!((actual - 1.0 / 3.0).abs() <= 1.0e-12, "{actual}");
    }

    #[test]
    fn simpson_matches_gaussian_area() {
        let x: Vec<f64> = (0..2001).map(|i| -10.0 + f64::from(i) * 0.01).collect();
        let y: Vec<f64> = x.iter().map(|v| (-v * v / 2.0).exp()).collect();
        let actual = integrate_simpson(&x, &y).expect("integration");
        let expected = (2.0 * std::f64::consts::PI).sqrt();
        assert!((actual - expected).abs() <= 1.0e-9);
    }

    #[test]
    fn two_points_use_the_trapezoid() {
        let actual = integrate_simpson(&[0.0, 2.0], &[1.0, 3.0]).expect("integration");
        assert_eq!(actual, 4.0);
    }

    #[test]
    fn rejects_short_and_unordered_inputs() {
        assert_eq!(
            integrate_simpson(&[1.0], &[1.0]),
            Err(SimpsonError::InsufficientPoints { actual: 1 })
        );
        assert!(matches!(
            integrate_simpson(&[0.0, 1.0, 1.0], &[1.0, 1.0, 1.0]),
            Err(SimpsonError::NonIncreasingAbscissa { index: 2, .. })
        ));
    }
}
