pub mod errors;
pub mod spectrum;

pub use errors::{XsecError, XsecErrorCategory, XsecResult};
pub use spectrum::{Extrapolation, Spectrum, SpectrumError};

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Stitch,
    FrequencyFilter,
    Smoothing,
    Baseline,
    Absorption,
    Fluorescence,
    McCumber,
    Fuchtbauer,
    Blend,
}

impl PipelineStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stitch => "STITCH",
            Self::FrequencyFilter => "FFT_FILTER",
            Self::Smoothing => "SMOOTHING",
            Self::Baseline => "BASELINE",
            Self::Absorption => "ABSORPTION",
            Self::Fluorescence => "FLUORESCENCE",
            Self::McCumber => "MCCUMBER",
            Self::Fuchtbauer => "FUCHTBAUER",
            Self::Blend => "BLEND",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Raw segments of one measurement channel, in acquisition order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSet {
    label: String,
    segments: Vec<Spectrum>,
}

impl ChannelSet {
    pub fn new(label: impl Into<String>, segments: Vec<Spectrum>) -> XsecResult<Self> {
        let label = label.into();
        if segments.is_empty() {
            return Err(XsecError::load(
                "LOAD.CHANNEL_MISSING",
                format!("channel '{}' has no raw curves", label),
            ));
        }
        if let Some(index) = segments.iter().position(Spectrum::is_empty) {
            return Err(XsecError::load(
                "LOAD.CHANNEL_EMPTY",
                format!("channel '{}' segment {} contains no samples", label, index),
            ));
        }

        Ok(Self { label, segments })
    }

    pub fn single(label: impl Into<String>, spectrum: Spectrum) -> XsecResult<Self> {
        Self::new(label, vec![spectrum])
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn segments(&self) -> &[Spectrum] {
        &self.segments
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FluorescenceChannel {
    Single(ChannelSet),
    TemperaturePair { low: ChannelSet, high: ChannelSet },
}

/// Everything measured for one material, loaded by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChannelSet {
    pub absorption: ChannelSet,
    pub reference: ChannelSet,
    pub fluorescence: Option<FluorescenceChannel>,
}

impl RawChannelSet {
    pub fn new(absorption: ChannelSet, reference: ChannelSet) -> Self {
        Self {
            absorption,
            reference,
            fluorescence: None,
        }
    }

    pub fn with_fluorescence(mut self, fluorescence: FluorescenceChannel) -> Self {
        self.fluorescence = Some(fluorescence);
        self
    }
}

/// Absorption and emission cross sections sharing one wavelength grid (nm, cm²).
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionPair {
    absorption: Spectrum,
    emission: Spectrum,
}

impl CrossSectionPair {
    pub fn new(absorption: Spectrum, emission: Spectrum) -> XsecResult<Self> {
        if absorption.wavelengths() != emission.wavelengths() {
            return Err(XsecError::domain(
                "DOMAIN.PAIR_GRID_MISMATCH",
                format!(
                    "cross-section pair requires a shared grid, \
                     got {} absorption and {} emission samples",
                    absorption.len(),
                    emission.len()
                ),
            ));
        }

        Ok(Self {
            absorption,
            emission,
        })
    }

    pub fn absorption(&self) -> &Spectrum {
        &self.absorption
    }

    pub fn emission(&self) -> &Spectrum {
        &self.emission
    }

    pub fn wavelengths(&self) -> &[f64] {
        self.absorption.wavelengths()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelSet, CrossSectionPair, PipelineStage, Spectrum, XsecErrorCategory};

    #[test]
    fn stage_labels_are_stable() {
        assert_eq!(PipelineStage::Baseline.to_string(), "BASELINE");
        assert_eq!(PipelineStage::Blend.as_str(), "BLEND");
    }

    #[test]
    fn channel_without_segments_is_a_load_error() {
        let error = ChannelSet::new("absorption", Vec::new()).expect_err("empty channel");
        assert_eq!(error.category(), XsecErrorCategory::LoadError);
        assert_eq!(error.placeholder(), "LOAD.CHANNEL_MISSING");
    }

    #[test]
    fn channel_with_empty_segment_is_a_load_error() {
        let segments = vec![
            Spectrum::from_pairs(&[(1.0, 1.0), (2.0, 2.0)]).expect("spectrum"),
            Spectrum::empty(),
        ];
        let error = ChannelSet::new("reference", segments).expect_err("empty segment");
        assert_eq!(error.placeholder(), "LOAD.CHANNEL_EMPTY");
    }

    #[test]
    fn cross_section_pair_rejects_misaligned_grids() {
        let absorption = Spectrum::from_pairs(&[(1.0, 1.0), (2.0, 2.0)]).expect("spectrum");
        let emission = Spectrum::from_pairs(&[(1.0, 1.0), (3.0, 2.0)]).expect("spectrum");
        let error = CrossSectionPair::new(absorption, emission).expect_err("grid mismatch");
        assert_eq!(error.category(), XsecErrorCategory::DomainError);
    }
}
