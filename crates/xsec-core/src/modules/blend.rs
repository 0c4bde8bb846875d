//! Crossfade of the Füchtbauer-Ladenburg and McCumber emission curves.
//!
//! Both curves are resampled onto one uniform grid. The Füchtbauer curve is
//! active above `FL_min`, the McCumber curve below `MC_max`. Points with one
//! active source copy it; runs where both are active are blended with a
//! raised cosine so the departing curve fades out as the arriving one fades in.

use crate::common::{MaterialParameters, ProcessingParameters};
use crate::domain::{Extrapolation, Spectrum, XsecError, XsecResult};
use std::f64::consts::PI;
use std::ops::Range;
use tracing::{debug, warn};

/// Upper bound on the resampled grid, guards against pathological spacings.
pub const MAX_BLEND_SAMPLES: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendSource {
    Fuchtbauer,
    McCumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlendResult {
    pub composite: Spectrum,
    /// Füchtbauer curve on the blend grid.
    pub fuchtbauer: Spectrum,
    /// McCumber curve on the blend grid.
    pub mccumber: Spectrum,
    pub fuchtbauer_weights: Vec<f64>,
    pub mccumber_weights: Vec<f64>,
    /// Grid index ranges where both sources are active.
    pub overlap_runs: Vec<Range<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBlender {
    fl_min_nm: f64,
    mc_max_nm: f64,
}

impl SpectralBlender {
    pub fn new(fl_min_nm: f64, mc_max_nm: f64) -> XsecResult<Self> {
        if !fl_min_nm.is_finite() || !mc_max_nm.is_finite() {
            return Err(XsecError::configuration(
                "CONFIG.BLEND_CUTOFF",
                format!(
                    "blend cut-offs must be finite, got FL_min={} MC_max={}",
                    fl_min_nm, mc_max_nm
                ),
            ));
        }
        Ok(Self {
            fl_min_nm,
            mc_max_nm,
        })
    }

    /// Cut-offs from the material (ZPL ± 10 nm unless set), processing
    /// overrides win.
    pub fn from_parameters(
        material: &MaterialParameters,
        processing: &ProcessingParameters,
    ) -> XsecResult<Self> {
        let (fl_min, mc_max) = material.blend_cutoffs_nm();
        Self::new(
            processing.fl_min_nm.unwrap_or(fl_min),
            processing.mc_max_nm.unwrap_or(mc_max),
        )
    }

    pub fn cutoffs_nm(&self) -> (f64, f64) {
        (self.fl_min_nm, self.mc_max_nm)
    }

    pub fn blend(&self, fuchtbauer: &Spectrum, mccumber: &Spectrum) -> XsecResult<BlendResult> {
        let grid = blend_grid(fuchtbauer, mccumber)?;
        let fuchtbauer = fuchtbauer.resample_onto(&grid, Extrapolation::HoldBoundary)?;
        let mccumber = mccumber.resample_onto(&grid, Extrapolation::HoldBoundary)?;

        let fl_active: Vec<bool> = grid.iter().map(|x| *x > self.fl_min_nm).collect();
        let mc_active: Vec<bool> = grid.iter().map(|x| *x < self.mc_max_nm).collect();
        let (fuchtbauer_weights, mccumber_weights, overlap_runs) =
            if !fl_active.iter().any(|active| *active) {
                (vec![0.0; grid.len()], vec![1.0; grid.len()], Vec::new())
            } else if !mc_active.iter().any(|active| *active) {
                (vec![1.0; grid.len()], vec![0.0; grid.len()], Vec::new())
            } else {
                crossfade_weights(&fl_active, &mc_active)
            };

        let mut gaps = 0_usize;
        let values = fuchtbauer
            .values()
            .iter()
            .zip(mccumber.values())
            .zip(fuchtbauer_weights.iter().zip(&mccumber_weights))
            .map(|((fl, mc), (fl_weight, mc_weight))| {
                match (*fl_weight == 0.0, *mc_weight == 0.0) {
                    (true, true) => {
                        gaps += 1;
                        0.0
                    }
                    (false, true) => *fl,
                    (true, false) => *mc,
                    (false, false) => fl_weight * fl + mc_weight * mc,
                }
            })
            .collect();
        if gaps > 0 {
            warn!(
                gaps,
                fl_min_nm = self.fl_min_nm,
                mc_max_nm = self.mc_max_nm,
                "no emission source active on part of the blend grid, composite set to zero there"
            );
        }
        let composite = Spectrum::new(grid, values)?;
        debug!(
            samples = composite.len(),
            overlap_runs = overlap_runs.len(),
            "blended McCumber and Füchtbauer-Ladenburg emission"
        );

        Ok(BlendResult {
            composite,
            fuchtbauer,
            mccumber,
            fuchtbauer_weights,
            mccumber_weights,
            overlap_runs,
        })
    }
}

/// Uniform grid over the union of both domains; the step never exceeds the
/// smallest native sample spacing of either curve.
pub fn blend_grid(first: &Spectrum, second: &Spectrum) -> XsecResult<Vec<f64>> {
    let (Some((first_start, first_end)), Some((second_start, second_end))) =
        (first.domain(), second.domain())
    else {
        return Err(XsecError::domain(
            "DOMAIN.BLEND_INPUT",
            "both emission curves must contain samples",
        ));
    };
    let (Some(first_step), Some(second_step)) = (first.min_spacing(), second.min_spacing())
    else {
        return Err(XsecError::domain(
            "DOMAIN.BLEND_INPUT",
            format!(
                "both emission curves need at least two samples, got {} and {}",
                first.len(),
                second.len()
            ),
        ));
    };

    let start = first_start.min(second_start);
    let end = first_end.max(second_end);
    let step = first_step.min(second_step);
    let intervals = ((end - start) / step - 1.0e-9).ceil();
    if !intervals.is_finite() || intervals + 1.0 > MAX_BLEND_SAMPLES as f64 {
        return Err(XsecError::domain(
            "DOMAIN.BLEND_GRID",
            format!(
                "blend grid over [{}, {}] nm with step {} nm exceeds {} samples",
                start, end, step, MAX_BLEND_SAMPLES
            ),
        ));
    }

    let intervals = (intervals as usize).max(1);
    let step = (end - start) / intervals as f64;
    let mut grid: Vec<f64> = (0..intervals)
        .map(|index| start + step * index as f64)
        .collect();
    grid.push(end);
    Ok(grid)
}

/// Half-open index ranges of the contiguous `true` runs in `mask`.
pub fn overlap_runs(mask: &[bool]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut previous = false;
    let mut run_start = 0;
    for (index, active) in mask.iter().copied().chain(std::iter::once(false)).enumerate() {
        match (previous, active) {
            (false, true) => run_start = index,
            (true, false) => runs.push(run_start..index),
            _ => {}
        }
        previous = active;
    }
    runs
}

/// `0.5 · (1 + cos(π i / (L − 1)))` for `i` in `0..L`; a single point gets 0.5.
pub fn raised_cosine(length: usize) -> Vec<f64> {
    match length {
        0 => Vec::new(),
        1 => vec![0.5],
        _ => (0..length)
            .map(|index| 0.5 * (1.0 + (PI * index as f64 / (length - 1) as f64).cos()))
            .collect(),
    }
}

fn crossfade_weights(
    fl_active: &[bool],
    mc_active: &[bool],
) -> (Vec<f64>, Vec<f64>, Vec<Range<usize>>) {
    let only = |source: BlendSource, index: usize| match source {
        BlendSource::Fuchtbauer => fl_active[index] && !mc_active[index],
        BlendSource::McCumber => mc_active[index] && !fl_active[index],
    };
    let mut fl_weights: Vec<f64> = (0..fl_active.len())
        .map(|index| if only(BlendSource::Fuchtbauer, index) { 1.0 } else { 0.0 })
        .collect();
    let mut mc_weights: Vec<f64> = (0..mc_active.len())
        .map(|index| if only(BlendSource::McCumber, index) { 1.0 } else { 0.0 })
        .collect();

    let both: Vec<bool> = fl_active
        .iter()
        .zip(mc_active)
        .map(|(fl, mc)| *fl && *mc)
        .collect();
    let runs = overlap_runs(&both);
    for run in &runs {
        let departing = departing_source(run, fl_active.len(), &only);
        for (index, weight) in run.clone().zip(raised_cosine(run.len())) {
            let (fl_weight, mc_weight) = match departing {
                BlendSource::Fuchtbauer => (weight, 1.0 - weight),
                BlendSource::McCumber => (1.0 - weight, weight),
            };
            fl_weights[index] = fl_weight;
            mc_weights[index] = mc_weight;
        }
    }
    (fl_weights, mc_weights, runs)
}

/// The source active alone just before the run departs; failing that, the
/// one active alone just after arrives. McCumber departs by default, as it
/// covers the short-wavelength side.
fn departing_source(
    run: &Range<usize>,
    length: usize,
    only: &impl Fn(BlendSource, usize) -> bool,
) -> BlendSource {
    if run.start > 0 {
        let before = run.start - 1;
        if only(BlendSource::Fuchtbauer, before) {
            return BlendSource::Fuchtbauer;
        }
        if only(BlendSource::McCumber, before) {
            return BlendSource::McCumber;
        }
    }
    if run.end < length && only(BlendSource::McCumber, run.end) {
        return BlendSource::Fuchtbauer;
    }
    BlendSource::McCumber
}

#[cfg(test)]
mod tests {
    use super::{SpectralBlender, blend_grid, overlap_runs, raised_cosine};
    use crate::domain::{Extrapolation, Spectrum};

    fn curve(start: f64, step: f64, count: usize, f: impl Fn(f64) -> f64) -> Spectrum {
        let wavelengths: Vec<f64> = (0..count).map(|index| start + step * index as f64).collect();
        let values = wavelengths.iter().map(|x| f(*x)).collect();
        Spectrum::new(wavelengths, values).expect("curve")
    }

    fn fuchtbauer() -> Spectrum {
        curve(950.0, 0.5, 301, |x| 1.0e-20 * (-0.5 * ((x - 1030.0) / 10.0).powi(2)).exp())
    }

    fn mccumber() -> Spectrum {
        curve(900.0, 0.25, 601, |x| 2.0e-20 * (-0.5 * ((x - 970.0) / 8.0).powi(2)).exp())
    }

    #[test]
    fn overlap_runs_are_found_by_edge_detection() {
        let mask = [true, true, false, false, true, false, true, true, true];
        assert_eq!(overlap_runs(&mask), vec![0..2, 4..5, 6..9]);
        assert!(overlap_runs(&[false, false]).is_empty());
        assert!(overlap_runs(&[]).is_empty());
    }

    #[test]
    fn raised_cosine_runs_from_one_to_zero() {
        let weights = raised_cosine(5);
        assert_eq!(weights[0], 1.0);
        assert!(weights[4].abs() <= 1.0e-16);
        assert!((weights[2] - 0.5).abs() <= 1.0e-15);
        assert!(weights.windows(2).all(|pair| pair[1] <= pair[0]));
        assert_eq!(raised_cosine(1), vec![0.5]);
    }

    #[test]
    fn grid_spans_the_union_with_the_finer_step() {
        let grid = blend_grid(&fuchtbauer(), &mccumber()).expect("grid");
        assert_eq!(grid[0], 900.0);
        assert_eq!(grid[grid.len() - 1], 1100.0);
        assert_eq!(grid.len(), 801);
        assert!(grid.windows(2).all(|pair| (pair[1] - pair[0] - 0.25).abs() <= 1.0e-9));
    }

    #[test]
    fn grid_step_follows_the_finest_gap_of_an_irregular_curve() {
        let stitched = Spectrum::from_pairs(&[
            (900.0, 1.0),
            (910.0, 1.0),
            (910.5, 1.0),
            (920.0, 1.0),
        ])
        .expect("stitched");
        let coarse = curve(900.0, 2.0, 11, |_| 1.0);

        let grid = blend_grid(&stitched, &coarse).expect("grid");
        assert_eq!(grid.len(), 41);
        assert_eq!(grid[grid.len() - 1], 920.0);
        assert!(grid.windows(2).all(|pair| (pair[1] - pair[0] - 0.5).abs() <= 1.0e-9));
    }

    #[test]
    fn composite_equals_mccumber_when_fuchtbauer_never_activates() {
        let blender = SpectralBlender::new(5000.0, 980.0).expect("blender");
        let result = blender.blend(&fuchtbauer(), &mccumber()).expect("blend");

        let grid = result.composite.wavelengths().to_vec();
        let expected = mccumber()
            .resample_onto(&grid, Extrapolation::HoldBoundary)
            .expect("resample");
        assert_eq!(result.composite.values(), expected.values());
    }

    #[test]
    fn composite_equals_fuchtbauer_when_mccumber_never_activates() {
        let blender = SpectralBlender::new(960.0, 100.0).expect("blender");
        let result = blender.blend(&fuchtbauer(), &mccumber()).expect("blend");
        assert_eq!(result.composite.values(), result.fuchtbauer.values());
    }

    #[test]
    fn single_source_points_copy_and_overlap_weights_sum_to_one() {
        let blender = SpectralBlender::new(960.0, 980.0).expect("blender");
        let result = blender.blend(&fuchtbauer(), &mccumber()).expect("blend");
        let grid = result.composite.wavelengths();

        assert_eq!(result.overlap_runs.len(), 1);
        let run = result.overlap_runs[0].clone();
        assert!(grid[run.start] > 960.0 && grid[run.end - 1] < 980.0);

        for (index, x) in grid.iter().enumerate() {
            let composite = result.composite.values()[index];
            if *x <= 960.0 {
                assert_eq!(composite, result.mccumber.values()[index]);
            } else if *x >= 980.0 {
                assert_eq!(composite, result.fuchtbauer.values()[index]);
            } else {
                let total = result.fuchtbauer_weights[index] + result.mccumber_weights[index];
                assert!((total - 1.0).abs() <= 1.0e-15);
            }
        }

        // McCumber departs across the run, Füchtbauer arrives
        assert_eq!(result.mccumber_weights[run.start], 1.0);
        assert!(result.fuchtbauer_weights[run.end - 1] >= 1.0 - 1.0e-15);
        let fl = &result.fuchtbauer_weights[run.clone()];
        assert!(fl.windows(2).all(|pair| pair[1] >= pair[0]));
    }

    #[test]
    fn disjoint_activity_leaves_a_zero_gap() {
        let blender = SpectralBlender::new(1000.0, 980.0).expect("blender");
        let result = blender.blend(&fuchtbauer(), &mccumber()).expect("blend");
        assert!(result.overlap_runs.is_empty());
        let gap = result.composite.nearest_index(990.0).expect("gap");
        assert_eq!(result.composite.values()[gap], 0.0);
    }

    #[test]
    fn single_sample_inputs_are_rejected() {
        let single = Spectrum::from_pairs(&[(1000.0, 1.0)]).expect("single");
        let error = SpectralBlender::new(960.0, 980.0)
            .expect("blender")
            .blend(&single, &mccumber())
            .expect_err("single sample");
        assert_eq!(error.placeholder(), "DOMAIN.BLEND_INPUT");
    }
}
