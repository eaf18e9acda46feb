use crate::deployment::Stage;

/// Every way a deployment run can fail. None of them are recovered from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing configuration value {0}")]
    ConfigurationMissing(&'static str),
    #[error("invalid configuration: {0:#}")]
    InvalidConfiguration(anyhow::Error),
    #[error("invalid signing key: {0}")]
    InvalidCredential(String),
    #[error("invalid artifact: {0:#}")]
    InvalidArtifact(anyhow::Error),
    #[error("invalid constructor arguments: {0:#}")]
    InvalidConstructorArguments(anyhow::Error),
    #[error("gas estimation failed: {0:#}")]
    EstimationFailure(anyhow::Error),
    #[error("deployment submission failed: {0:#}")]
    SubmissionFailure(anyhow::Error),
    #[error("deployment cancelled in stage {stage:?}")]
    Cancelled { stage: Stage },
}

impl Error {
    /// The stage the workflow was in when it transitioned to failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::ConfigurationMissing(_)
            | Self::InvalidConfiguration(_)
            | Self::InvalidCredential(_)
            | Self::InvalidArtifact(_)
            | Self::InvalidConstructorArguments(_) => Stage::Idle,
            Self::EstimationFailure(_) => Stage::AccountReady,
            Self::SubmissionFailure(_) => Stage::GasEstimated,
            Self::Cancelled { stage } => *stage,
        }
    }
}
