use crate::domain::{PipelineStage, Spectrum, XsecResult};

/// A pure `Spectrum -> Spectrum` stage of the processing chain.
pub trait SpectralTransform {
    fn stage(&self) -> PipelineStage;

    fn apply(&self, spectrum: &Spectrum) -> XsecResult<Spectrum>;
}

/// Run `transforms` left to right, each one seeing the previous output.
pub fn apply_chain(
    transforms: &[&dyn SpectralTransform],
    spectrum: &Spectrum,
) -> XsecResult<Spectrum> {
    let mut current = spectrum.clone();
    for transform in transforms {
        tracing::trace!(stage = %transform.stage(), samples = current.len(), "apply transform");
        current = transform.apply(&current)?;
    }
    Ok(current)
}
