//! Absorption/reference gain ratio estimated from zero-absorption windows.
//!
//! Two strategies share the [`CalibrationStrategy`] interface:
//! [`LinearCalibration`] draws a line in index space through the point ratios
//! at the two calibration centres, [`CubicCalibration`] fits a cubic in
//! wavelength through four window-averaged ratios. [`BaselineCalibrator`]
//! picks one from the calibration window width.

use crate::common::CalibrationWindow;
use crate::domain::{Spectrum, XsecError, XsecResult};
use crate::numerics::special::{DenseRealMatrix, lu_solve};
use crate::numerics::stable_mean;
use tracing::debug;

pub trait CalibrationStrategy {
    fn name(&self) -> &'static str;

    /// Ratio `absorption / reference` on the absorption grid.
    fn ratio(&self, absorption: &Spectrum, reference: &Spectrum) -> XsecResult<Spectrum>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCalibration {
    centers_nm: (f64, f64),
}

impl LinearCalibration {
    pub fn new(centers_nm: (f64, f64)) -> Self {
        Self { centers_nm }
    }
}

impl CalibrationStrategy for LinearCalibration {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn ratio(&self, absorption: &Spectrum, reference: &Spectrum) -> XsecResult<Spectrum> {
        require_shared_grid(absorption, reference)?;
        let first = center_index(absorption, self.centers_nm.0)?;
        let second = center_index(absorption, self.centers_nm.1)?;
        let y1 = point_ratio(absorption, reference, first)?;
        let y2 = point_ratio(absorption, reference, second)?;

        if first == second {
            return Ok(absorption.map_values(|_, _| y1));
        }

        let slope = (y2 - y1) / (second as f64 - first as f64);
        let values = (0..absorption.len())
            .map(|index| y1 + (index as f64 - first as f64) * slope)
            .collect();
        Ok(absorption.with_values(values)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicCalibration {
    width_nm: f64,
    centers_nm: (f64, f64),
}

impl CubicCalibration {
    pub fn new(width_nm: f64, centers_nm: (f64, f64)) -> Self {
        Self {
            width_nm,
            centers_nm,
        }
    }

    /// `(x, y)` mean wavelength and mean ratio of the first and last fifth
    /// of the `width_px` samples centred on `center`.
    fn window_points(
        &self,
        absorption: &Spectrum,
        reference: &Spectrum,
        center: usize,
        width_px: usize,
    ) -> XsecResult<[(f64, f64); 2]> {
        let start = center.saturating_sub(width_px / 2);
        let end = (center + width_px / 2).min(absorption.len());
        if start >= end {
            return Err(XsecError::configuration(
                "CONFIG.CALIBRATION_WINDOW",
                format!(
                    "calibration window around {:.3} nm is empty (width {} px)",
                    absorption.wavelengths()[center],
                    width_px
                ),
            ));
        }

        let sub_length = ((end - start) / 5).max(1);
        let head = start..start + sub_length;
        let tail = end - sub_length..end;
        Ok([
            averaged_point(absorption, reference, head)?,
            averaged_point(absorption, reference, tail)?,
        ])
    }
}

impl CalibrationStrategy for CubicCalibration {
    fn name(&self) -> &'static str {
        "cubic"
    }

    fn ratio(&self, absorption: &Spectrum, reference: &Spectrum) -> XsecResult<Spectrum> {
        require_shared_grid(absorption, reference)?;
        let spacing = absorption.mean_spacing().ok_or_else(|| {
            XsecError::configuration(
                "CONFIG.CALIBRATION_WINDOW",
                "cubic calibration requires at least two samples",
            )
        })?;
        let width_px = (self.width_nm / spacing).round() as usize;

        let first = center_index(absorption, self.centers_nm.0)?;
        let second = center_index(absorption, self.centers_nm.1)?;
        let [p0, p1] = self.window_points(absorption, reference, first, width_px)?;
        let [p2, p3] = self.window_points(absorption, reference, second, width_px)?;
        let points = [p0, p1, p2, p3];

        for (index, lhs) in points.iter().enumerate() {
            if points[index + 1..].iter().any(|rhs| rhs.0 == lhs.0) {
                return Err(XsecError::configuration(
                    "CONFIG.CALIBRATION_SINGULAR",
                    format!(
                        "calibration points share wavelength {:.6} nm; \
                         widen the windows or separate the centres",
                        lhs.0
                    ),
                ));
            }
        }

        let cubic = CubicThroughPoints::solve(&points)?;
        debug!(
            width_px,
            first_center = first,
            second_center = second,
            "cubic baseline calibrated"
        );
        Ok(absorption.map_values(|wavelength, _| cubic.evaluate(wavelength)))
    }
}

/// Strategy chosen by the calibration window width: `0` is linear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaselineCalibrator {
    Linear(LinearCalibration),
    Cubic(CubicCalibration),
}

impl BaselineCalibrator {
    /// Centres default to the ends of `domain_nm`.
    pub fn select(window: CalibrationWindow, domain_nm: (f64, f64)) -> Self {
        let centers = window.centers_nm.unwrap_or(domain_nm);
        if window.width_nm == 0.0 {
            Self::Linear(LinearCalibration::new(centers))
        } else {
            Self::Cubic(CubicCalibration::new(window.width_nm, centers))
        }
    }

    fn strategy(&self) -> &dyn CalibrationStrategy {
        match self {
            Self::Linear(strategy) => strategy,
            Self::Cubic(strategy) => strategy,
        }
    }
}

impl CalibrationStrategy for BaselineCalibrator {
    fn name(&self) -> &'static str {
        self.strategy().name()
    }

    fn ratio(&self, absorption: &Spectrum, reference: &Spectrum) -> XsecResult<Spectrum> {
        let ratio = self.strategy().ratio(absorption, reference)?;
        if let Some((index, value)) = ratio.first_non_finite() {
            return Err(XsecError::numerical(
                "NUMERIC.CALIBRATION_RATIO",
                format!(
                    "{} baseline ratio is not finite at {:.3} nm: {}",
                    self.name(),
                    ratio.wavelengths()[index],
                    value
                ),
            ));
        }
        Ok(ratio)
    }
}

/// Cubic `c0 + c1 t + c2 t² + c3 t³` in the centred, scaled coordinate
/// `t = (x - shift) / scale`.
struct CubicThroughPoints {
    coefficients: Vec<f64>,
    shift: f64,
    scale: f64,
}

impl CubicThroughPoints {
    fn solve(points: &[(f64, f64); 4]) -> XsecResult<Self> {
        let shift = points.iter().map(|point| point.0).sum::<f64>() / 4.0;
        let scale = points
            .iter()
            .map(|point| (point.0 - shift).abs())
            .fold(0.0_f64, f64::max)
            .max(f64::MIN_POSITIVE);

        let vandermonde = DenseRealMatrix::from_fn(4, 4, |row, column| {
            ((points[row].0 - shift) / scale).powi(column as i32)
        });
        let rhs: Vec<f64> = points.iter().map(|point| point.1).collect();
        let coefficients = lu_solve(&vandermonde, &rhs).map_err(|error| {
            XsecError::configuration(
                "CONFIG.CALIBRATION_SINGULAR",
                format!("calibration system is singular: {}", error),
            )
        })?;

        Ok(Self {
            coefficients,
            shift,
            scale,
        })
    }

    fn evaluate(&self, x: f64) -> f64 {
        let t = (x - self.shift) / self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |accumulator, coefficient| accumulator * t + coefficient)
    }
}

fn require_shared_grid(absorption: &Spectrum, reference: &Spectrum) -> XsecResult<()> {
    if absorption.is_empty() {
        return Err(XsecError::domain(
            "DOMAIN.CALIBRATION_EMPTY",
            "cannot calibrate an empty absorption curve",
        ));
    }
    if absorption.wavelengths() != reference.wavelengths() {
        return Err(XsecError::domain(
            "DOMAIN.GRID_MISMATCH",
            format!(
                "absorption ({} samples) and reference ({} samples) must share one grid",
                absorption.len(),
                reference.len()
            ),
        ));
    }
    Ok(())
}

fn center_index(spectrum: &Spectrum, wavelength: f64) -> XsecResult<usize> {
    spectrum.nearest_index(wavelength).ok_or_else(|| {
        XsecError::domain(
            "DOMAIN.CALIBRATION_EMPTY",
            "cannot locate a calibration centre on an empty grid",
        )
    })
}

fn point_ratio(absorption: &Spectrum, reference: &Spectrum, index: usize) -> XsecResult<f64> {
    let ratio = absorption.values()[index] / reference.values()[index];
    if !ratio.is_finite() {
        return Err(XsecError::numerical(
            "NUMERIC.CALIBRATION_RATIO",
            format!(
                "point ratio at {:.3} nm is not finite",
                absorption.wavelengths()[index]
            ),
        ));
    }
    Ok(ratio)
}

fn averaged_point(
    absorption: &Spectrum,
    reference: &Spectrum,
    range: std::ops::Range<usize>,
) -> XsecResult<(f64, f64)> {
    let empty = || {
        XsecError::configuration(
            "CONFIG.CALIBRATION_WINDOW",
            "calibration averaging window is empty",
        )
    };
    let x = stable_mean(&absorption.wavelengths()[range.clone()]).ok_or_else(empty)?;
    let numerator = stable_mean(&absorption.values()[range.clone()]).ok_or_else(empty)?;
    let denominator = stable_mean(&reference.values()[range]).ok_or_else(empty)?;
    Ok((x, numerator / denominator))
}
