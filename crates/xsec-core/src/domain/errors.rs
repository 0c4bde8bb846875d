use std::error::Error;
use std::fmt::{Display, Formatter};

pub type XsecResult<T> = Result<T, XsecError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XsecErrorCategory {
    LoadError,
    ConfigurationError,
    NumericalError,
    DomainError,
    IoSystemError,
    InternalError,
}

impl XsecErrorCategory {
    /// Process exit status reported by the CLI.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::LoadError => 2,
            Self::ConfigurationError => 3,
            Self::NumericalError => 4,
            Self::DomainError => 5,
            Self::IoSystemError => 6,
            Self::InternalError => 7,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoadError => "LoadError",
            Self::ConfigurationError => "ConfigurationError",
            Self::NumericalError => "NumericalError",
            Self::DomainError => "DomainError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsecError {
    category: XsecErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl XsecError {
    pub fn new(
        category: XsecErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn load(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XsecErrorCategory::LoadError, placeholder, message)
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XsecErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn numerical(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XsecErrorCategory::NumericalError, placeholder, message)
    }

    pub fn domain(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XsecErrorCategory::DomainError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XsecErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(XsecErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> XsecErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for XsecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for XsecError {}

#[cfg(test)]
mod tests {
    use super::{XsecError, XsecErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (XsecErrorCategory::LoadError, 2, "LoadError"),
            (XsecErrorCategory::ConfigurationError, 3, "ConfigurationError"),
            (XsecErrorCategory::NumericalError, 4, "NumericalError"),
            (XsecErrorCategory::DomainError, 5, "DomainError"),
            (XsecErrorCategory::IoSystemError, 6, "IoSystemError"),
            (XsecErrorCategory::InternalError, 7, "InternalError"),
        ];

        for (category, exit_code, label) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), label);
        }
    }

    #[test]
    fn error_renders_diagnostic_and_exit_lines() {
        let error = XsecError::configuration(
            "CONFIG.CALIBRATION_SINGULAR",
            "calibration abscissae are not distinct",
        );

        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [CONFIG.CALIBRATION_SINGULAR] calibration abscissae are not distinct"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 3");
        assert_eq!(
            error.to_string(),
            concat!(
                "ConfigurationError [CONFIG.CALIBRATION_SINGULAR] ",
                "calibration abscissae are not distinct"
            )
        );
    }
}
