//! `Spectrum`-level wrappers around the numeric smoothing kernels.

use super::traits::SpectralTransform;
use crate::domain::{PipelineStage, Spectrum, XsecError, XsecResult};
use crate::numerics::{
    FourierFilterError, SmoothingError, centered_moving_average, frequency_band_filter,
    savitzky_golay,
};

/// FFT band rejection around the Nyquist bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBandFilter {
    width: f64,
}

impl FrequencyBandFilter {
    pub fn new(width: f64) -> XsecResult<Self> {
        if !(0.0..=1.0).contains(&width) {
            return Err(XsecError::configuration(
                "CONFIG.FILTER_WIDTH",
                format!("filter width must lie in [0, 1], got {}", width),
            ));
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_identity(&self) -> bool {
        self.width == 0.0
    }
}

impl SpectralTransform for FrequencyBandFilter {
    fn stage(&self) -> PipelineStage {
        PipelineStage::FrequencyFilter
    }

    fn apply(&self, spectrum: &Spectrum) -> XsecResult<Spectrum> {
        if self.is_identity() {
            return Ok(spectrum.clone());
        }
        let filtered = frequency_band_filter(spectrum.values(), self.width)
            .map_err(|error| match error {
                FourierFilterError::InvalidWidth { .. } => {
                    XsecError::configuration("CONFIG.FILTER_WIDTH", error.to_string())
                }
            })?;
        Ok(spectrum.with_values(filtered)?)
    }
}

/// Centered moving average, optionally restricted to a wavelength band.
///
/// With a band, only the samples in [`Spectrum::interval`] of the band are
/// smoothed (edges clamped within the band); the rest pass through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverage {
    window: usize,
    band_nm: Option<(f64, f64)>,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            band_nm: None,
        }
    }

    pub fn within(window: usize, start_nm: f64, end_nm: f64) -> Self {
        Self {
            window,
            band_nm: Some((start_nm, end_nm)),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl SpectralTransform for MovingAverage {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Smoothing
    }

    fn apply(&self, spectrum: &Spectrum) -> XsecResult<Spectrum> {
        let range = match self.band_nm {
            Some((start, end)) => spectrum.interval(start, end),
            None => 0..spectrum.len(),
        };
        if self.window <= 1 || range.is_empty() {
            return Ok(spectrum.clone());
        }

        let mut values = spectrum.values().to_vec();
        let smoothed = centered_moving_average(&values[range.clone()], self.window);
        values[range].copy_from_slice(&smoothed);
        Ok(spectrum.with_values(values)?)
    }
}

/// Savitzky-Golay smoothing; a no-op unless `window > order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolynomialSmoother {
    window: usize,
    order: usize,
}

impl PolynomialSmoother {
    pub fn new(window: usize, order: usize) -> Self {
        Self { window, order }
    }

    pub fn is_active(&self) -> bool {
        self.window > self.order
    }
}

impl SpectralTransform for PolynomialSmoother {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Smoothing
    }

    fn apply(&self, spectrum: &Spectrum) -> XsecResult<Spectrum> {
        if !self.is_active() {
            return Ok(spectrum.clone());
        }
        let smoothed =
            savitzky_golay(spectrum.values(), self.window, self.order).map_err(|error| {
                match error {
                    SmoothingError::WindowExceedsLength { .. } => {
                        XsecError::configuration("CONFIG.SMOOTHING_WINDOW", error.to_string())
                    }
                    SmoothingError::SingularFit { .. } => {
                        XsecError::numerical("NUMERIC.SMOOTHING_FIT", error.to_string())
                    }
                }
            })?;
        Ok(spectrum.with_values(smoothed)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{FrequencyBandFilter, MovingAverage, PolynomialSmoother};
    use crate::domain::{Spectrum, XsecErrorCategory};
    use crate::modules::SpectralTransform;

    fn ramp(count: usize) -> Spectrum {
        let wavelengths = (0..count).map(|index| 900.0 + index as f64).collect();
        let values = (0..count)
            .map(|index| ((index * 7) % 5) as f64 + 0.25 * index as f64)
            .collect();
        Spectrum::new(wavelengths, values).expect("ramp spectrum")
    }

    #[test]
    fn zero_width_band_filter_returns_input_exactly() {
        let spectrum = ramp(33);
        let filter = FrequencyBandFilter::new(0.0).expect("filter");
        assert_eq!(filter.apply(&spectrum).expect("apply"), spectrum);
    }

    #[test]
    fn band_filter_rejects_width_outside_unit_interval() {
        let error = FrequencyBandFilter::new(1.5).expect_err("invalid width");
        assert_eq!(error.category(), XsecErrorCategory::ConfigurationError);
    }

    #[test]
    fn band_filter_keeps_grid_and_total() {
        let spectrum = ramp(64);
        let filtered = FrequencyBandFilter::new(0.5)
            .expect("filter")
            .apply(&spectrum)
            .expect("apply");

        assert_eq!(filtered.wavelengths(), spectrum.wavelengths());
        assert!((filtered.total() - spectrum.total()).abs() <= 1.0e-9);
        assert_ne!(filtered.values(), spectrum.values());
    }

    #[test]
    fn banded_moving_average_leaves_samples_outside_the_band() {
        let spectrum = ramp(40);
        let smoothed = MovingAverage::within(4, 910.0, 925.0)
            .apply(&spectrum)
            .expect("apply");
        let range = spectrum.interval(910.0, 925.0);

        assert_eq!(range, 10..25);
        assert_eq!(&smoothed.values()[..10], &spectrum.values()[..10]);
        assert_eq!(&smoothed.values()[25..], &spectrum.values()[25..]);
        assert_eq!(smoothed.values()[10], spectrum.values()[10]);
        assert_ne!(&smoothed.values()[12..23], &spectrum.values()[12..23]);
    }

    #[test]
    fn band_outside_the_domain_is_a_no_op() {
        let spectrum = ramp(20);
        let smoothed = MovingAverage::within(6, 2000.0, 2100.0)
            .apply(&spectrum)
            .expect("apply");
        assert_eq!(smoothed, spectrum);
    }

    #[test]
    fn polynomial_smoother_is_skipped_when_window_does_not_exceed_order() {
        let spectrum = ramp(10);
        let smoother = PolynomialSmoother::new(3, 3);
        assert!(!smoother.is_active());
        assert_eq!(smoother.apply(&spectrum).expect("apply"), spectrum);
    }

    #[test]
    fn polynomial_smoother_reports_short_input_as_configuration_error() {
        let spectrum = ramp(8);
        let error = PolynomialSmoother::new(20, 3)
            .apply(&spectrum)
            .expect_err("window longer than data");
        assert_eq!(error.placeholder(), "CONFIG.SMOOTHING_WINDOW");
    }
}
