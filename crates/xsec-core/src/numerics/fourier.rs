//! Frequency-domain smoothing: remove a symmetric band of the highest
//! frequencies around the Nyquist bin and keep the real part of the inverse.

use num_complex::Complex64;
use rustfft::FftPlanner;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FourierFilterError {
    #[error("filter width must lie in [0, 1], got {value}")]
    InvalidWidth { value: f64 },
}

/// Zero `2 * floor(width * n/2)` bins centred on bin `n/2`.
///
/// `width == 0` returns the input untouched. Only `width == 1` reaches the DC
/// bin, so any narrower band preserves the sum of the values.
pub fn frequency_band_filter(values: &[f64], width: f64) -> Result<Vec<f64>, FourierFilterError> {
    if !(0.0..=1.0).contains(&width) {
        return Err(FourierFilterError::InvalidWidth { value: width });
    }
    if width == 0.0 || values.is_empty() {
        return Ok(values.to_vec());
    }

    let length = values.len();
    let (start, end) = rejected_band(length, width);

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(length);
    let inverse = planner.plan_fft_inverse(length);

    let mut buffer: Vec<Complex64> = values
        .iter()
        .map(|value| Complex64::new(*value, 0.0))
        .collect();
    forward.process(&mut buffer);
    for bin in &mut buffer[start..end] {
        *bin = Complex64::new(0.0, 0.0);
    }
    inverse.process(&mut buffer);

    let scale = 1.0 / length as f64;
    Ok(buffer.iter().map(|bin| bin.re * scale).collect())
}

fn rejected_band(length: usize, width: f64) -> (usize, usize) {
    let mid = length / 2;
    let half_band = (width * mid as f64) as usize;
    (mid - half_band, (mid + half_band).min(length))
}

#[cfg(test)]
mod tests {
    use super::{FourierFilterError, frequency_band_filter, rejected_band};
    use std::f64::consts::PI;

    #[test]
    fn zero_width_is_an_exact_identity() {
        let values = vec![1.0, -3.5, 2.25, 1.0e-22, 7.0];
        assert_eq!(frequency_band_filter(&values, 0.0).expect("filter"), values);
    }

    #[test]
    fn band_is_centred_on_the_nyquist_bin() {
        assert_eq!(rejected_band(10, 0.4), (3, 7));
        assert_eq!(rejected_band(11, 0.5), (3, 7));
        assert_eq!(rejected_band(10, 1.0), (0, 10));
    }

    #[test]
    fn removes_alternating_noise_but_keeps_slow_signal() {
        let length = 256;
        let slow: Vec<f64> = (0..length)
            .map(|i| (2.0 * PI * i as f64 / length as f64).sin())
            .collect();
        let noisy: Vec<f64> = slow
            .iter()
            .enumerate()
            .map(|(i, value)| value + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();

        let filtered = frequency_band_filter(&noisy, 0.5).expect("filter");
        for (expected, actual) in slow.iter().zip(filtered.iter()) {
            assert!((expected - actual).abs() <= 1.0e-9);
        }
    }

    #[test]
    fn narrow_band_preserves_total_power() {
        let values: Vec<f64> = (0..101).map(|i| ((i as f64) * 0.37).cos().abs()).collect();
        let filtered = frequency_band_filter(&values, 0.8).expect("filter");
        let before: f64 = values.iter().sum();
        let after: f64 = filtered.iter().sum();
        assert!((before - after).abs() <= 1.0e-9);
    }

    #[test]
    fn rejects_out_of_range_width() {
        assert_eq!(
            frequency_band_filter(&[1.0], 1.5),
            Err(FourierFilterError::InvalidWidth { value: 1.5 })
        );
        assert!(frequency_band_filter(&[1.0], f64::NAN).is_err());
    }
}
