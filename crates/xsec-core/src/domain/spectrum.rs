//! Ordered `(wavelength, value)` samples and the grid helpers shared by every
//! pipeline stage.
//!
//! Wavelengths are in nm, finite and strictly increasing. Values carry no
//! invariant of their own; stages that need finite values check them where
//! the physics requires it. A `Spectrum` is never mutated in place: every
//! transform returns a new one.

use super::errors::XsecError;
use crate::numerics::special::{
    InterpolationError, LinearInterpolationInput, OutOfRange, resample_linear,
};
use crate::numerics::stable_sum;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpectrumError {
    #[error("spectrum length mismatch: wavelengths={wavelengths}, values={values}")]
    LengthMismatch { wavelengths: usize, values: usize },
    #[error("wavelength must be finite at index {index}, got {value}")]
    NonFiniteWavelength { index: usize, value: f64 },
    #[error(
        "wavelengths must be strictly increasing, index {index} has {current} after {previous}"
    )]
    NonIncreasingWavelength {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("cannot normalize spectrum with total power {total}")]
    DegenerateNormalization { total: f64 },
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
}

impl From<SpectrumError> for XsecError {
    fn from(error: SpectrumError) -> Self {
        match error {
            SpectrumError::DegenerateNormalization { .. } => {
                XsecError::numerical("NUMERIC.NORMALIZATION", error.to_string())
            }
            SpectrumError::Interpolation(_) => {
                XsecError::internal("SYS.INTERPOLATION", error.to_string())
            }
            _ => XsecError::load("LOAD.INVALID_SPECTRUM", error.to_string()),
        }
    }
}

/// Behaviour of [`Spectrum::resample_onto`] outside the native domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extrapolation {
    HoldBoundary,
    Zero,
}

impl Extrapolation {
    fn out_of_range(self) -> OutOfRange {
        match self {
            Self::HoldBoundary => OutOfRange::Clamp,
            Self::Zero => OutOfRange::Fill(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    wavelengths: Vec<f64>,
    values: Vec<f64>,
}

impl Spectrum {
    pub fn new(wavelengths: Vec<f64>, values: Vec<f64>) -> Result<Self, SpectrumError> {
        if wavelengths.len() != values.len() {
            return Err(SpectrumError::LengthMismatch {
                wavelengths: wavelengths.len(),
                values: values.len(),
            });
        }
        validate_grid(&wavelengths)?;

        Ok(Self {
            wavelengths,
            values,
        })
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, SpectrumError> {
        let (wavelengths, values) = pairs.iter().copied().unzip();
        Self::new(wavelengths, values)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// `(first, last)` wavelength, or `None` for an empty spectrum.
    pub fn domain(&self) -> Option<(f64, f64)> {
        Some((*self.wavelengths.first()?, *self.wavelengths.last()?))
    }

    /// Same grid, new values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self, SpectrumError> {
        if values.len() != self.len() {
            return Err(SpectrumError::LengthMismatch {
                wavelengths: self.len(),
                values: values.len(),
            });
        }

        Ok(Self {
            wavelengths: self.wavelengths.clone(),
            values,
        })
    }

    pub fn map_values(&self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        let values = self
            .pairs()
            .map(|(wavelength, value)| f(wavelength, value))
            .collect();
        Self {
            wavelengths: self.wavelengths.clone(),
            values,
        }
    }

    /// Index of the sample closest to `wavelength`; the first one wins ties.
    pub fn nearest_index(&self, wavelength: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, candidate) in self.wavelengths.iter().copied().enumerate() {
            let distance = (candidate - wavelength).abs();
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Half-open index range between the samples nearest to `start` and `end`.
    pub fn interval(&self, start: f64, end: f64) -> Range<usize> {
        match (self.nearest_index(start), self.nearest_index(end)) {
            (Some(lower), Some(upper)) if lower < upper => lower..upper,
            _ => 0..0,
        }
    }

    /// Samples with `start <= wavelength <= end`.
    pub fn trim(&self, start: f64, end: f64) -> Self {
        let (wavelengths, values) = self
            .pairs()
            .filter(|(wavelength, _)| *wavelength >= start && *wavelength <= end)
            .unzip();
        Self {
            wavelengths,
            values,
        }
    }

    pub fn resample_onto(
        &self,
        grid: &[f64],
        extrapolation: Extrapolation,
    ) -> Result<Self, SpectrumError> {
        validate_grid(grid)?;
        let values = resample_linear(
            LinearInterpolationInput::new(&self.wavelengths, &self.values),
            grid,
            extrapolation.out_of_range(),
        )?;
        Ok(Self {
            wavelengths: grid.to_vec(),
            values,
        })
    }

    /// Average spacing `(last - first) / (len - 1)`.
    pub fn mean_spacing(&self) -> Option<f64> {
        let (first, last) = self.domain()?;
        (self.len() > 1).then(|| (last - first) / (self.len() - 1) as f64)
    }

    /// Smallest gap between adjacent wavelengths.
    pub fn min_spacing(&self) -> Option<f64> {
        self.wavelengths
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .min_by(f64::total_cmp)
    }

    pub fn total(&self) -> f64 {
        stable_sum(&self.values)
    }

    /// Scale values so they sum to 1.
    pub fn normalize_total(&self) -> Result<Self, SpectrumError> {
        let total = self.total();
        if total == 0.0 || !total.is_finite() {
            return Err(SpectrumError::DegenerateNormalization { total });
        }
        Ok(self.map_values(|_, value| value / total))
    }

    /// `(wavelength, value)` of the largest finite value.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.pairs()
            .filter(|(_, value)| value.is_finite())
            .max_by(|lhs, rhs| lhs.1.total_cmp(&rhs.1))
    }

    /// Index and value of the first non-finite sample value.
    pub fn first_non_finite(&self) -> Option<(usize, f64)> {
        self.values
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
    }
}

fn validate_grid(wavelengths: &[f64]) -> Result<(), SpectrumError> {
    for (index, wavelength) in wavelengths.iter().copied().enumerate() {
        if !wavelength.is_finite() {
            return Err(SpectrumError::NonFiniteWavelength {
                index,
                value: wavelength,
            });
        }
        if index > 0 {
            let previous = wavelengths[index - 1];
            if wavelength <= previous {
                return Err(SpectrumError::NonIncreasingWavelength {
                    index,
                    previous,
                    current: wavelength,
                });
            }
        }
    }

    Ok(())
}
