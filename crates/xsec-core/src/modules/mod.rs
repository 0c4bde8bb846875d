pub mod absorption;
pub mod baseline;
pub mod blend;
pub mod filters;
pub mod fluorescence;
pub mod fuchtbauer;
pub mod mccumber;
pub mod pipeline;
pub mod serialization;
pub mod stitch;

mod traits;

pub use pipeline::{DerivedSpectra, derive};
pub use traits::{SpectralTransform, apply_chain};
