pub mod integration;
pub mod interpolation;
pub mod linalg;

pub use integration::{SimpsonError, integrate_simpson};
pub use interpolation::{InterpolationError, LinearInterpolationInput, OutOfRange, resample_linear};
pub use linalg::{LuDecomposition, LuError, lu_factorize, lu_solve};

use faer::Mat;

pub type DenseRealMatrix = Mat<f64>;
