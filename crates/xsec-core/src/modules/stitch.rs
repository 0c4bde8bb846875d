//! Merge overlapping raw segments of one channel into a single curve.

use crate::domain::{ChannelSet, Extrapolation, PipelineStage, Spectrum, XsecResult};
use tracing::debug;

/// Fold `segments` left to right with [`stitch_pair`].
///
/// One segment passes through unchanged; no segments yield an empty spectrum.
pub fn stitch_segments(segments: &[Spectrum]) -> XsecResult<Spectrum> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(Spectrum::empty());
    };

    let mut accumulated = first.clone();
    for next in rest {
        accumulated = stitch_pair(&accumulated, next)?;
    }
    Ok(accumulated)
}

pub fn stitch_channel(channel: &ChannelSet) -> XsecResult<Spectrum> {
    let stitched = stitch_segments(channel.segments())?;
    debug!(
        stage = %PipelineStage::Stitch,
        channel = channel.label(),
        segments = channel.segments().len(),
        samples = stitched.len(),
        "stitched channel"
    );
    Ok(stitched)
}

/// Join two curves.
///
/// Inside the overlap `[max(starts), min(ends)]` the result carries the mean
/// of both curves on the accumulated curve's samples (on `next`'s samples if
/// the accumulated curve has none there). Outside it, each curve keeps its
/// own samples.
pub fn stitch_pair(accumulated: &Spectrum, next: &Spectrum) -> XsecResult<Spectrum> {
    let (Some((acc_start, acc_end)), Some((next_start, next_end))) =
        (accumulated.domain(), next.domain())
    else {
        return Ok(if accumulated.is_empty() {
            next.clone()
        } else {
            accumulated.clone()
        });
    };

    let start = acc_start.max(next_start);
    let end = acc_end.min(next_end);
    let outside = |wavelength: f64| wavelength < start || wavelength > end;

    let mut samples: Vec<(f64, f64)> = accumulated
        .pairs()
        .chain(next.pairs())
        .filter(|(wavelength, _)| start > end || outside(*wavelength))
        .collect();

    if start <= end {
        let accumulated_overlap = accumulated.trim(start, end);
        let (host, guest) = if accumulated_overlap.is_empty() {
            (next.trim(start, end), accumulated)
        } else {
            (accumulated_overlap, next)
        };
        let guest_values = guest.resample_onto(host.wavelengths(), Extrapolation::HoldBoundary)?;
        samples.extend(
            host.pairs()
                .zip(guest_values.values())
                .map(|((wavelength, value), other)| (wavelength, 0.5 * (value + other))),
        );
        debug!(
            overlap_start = start,
            overlap_end = end,
            overlap_samples = host.len(),
            "averaged segment overlap"
        );
    }

    samples.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0));
    Ok(Spectrum::from_pairs(&samples)?)
}
