use crate::store::DataIntegrityError;

/// Application-level error carrying the process exit code.
///
/// - `2`: usage or input problem (bad path, bad date argument, unreadable header)
/// - `3`: a series is unusable after normalization
/// - `4`: runtime failure (terminal, network, export)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<DataIntegrityError> for AppError {
    fn from(err: DataIntegrityError) -> Self {
        AppError::new(3, err.to_string())
    }
}
