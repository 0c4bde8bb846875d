pub mod config;
pub mod constants;

pub use config::{
    CalibrationWindow, FluorescenceSettings, ManifoldLevels, MaterialParameters, MaterialRecord,
    ProcessingParameters, SmoothingBand,
};
