use thiserror::Error;

/// Failures raised while bringing the process up or binding its resources.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
    #[error("invalid deployment: {0}")]
    Configuration(String),
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
