//! Model retraining: launch a training job, register the model, repoint the endpoint.

pub mod job;
pub mod retrain;
pub mod sagemaker;

pub use job::{EndpointUpdate, InputChannel, ModelSpec, TrainingJobSpec};
pub use retrain::{RetrainOutcome, RetrainTrigger};
pub use sagemaker::SageMakerTrainingService;

use async_trait::async_trait;

use crate::error::TrainingError;

/// Lifecycle state of a training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    InProgress,
    Stopping,
    Completed,
    Failed,
    Stopped,
}

impl JobStatus {
    /// Parse the service's status string.
    pub fn from_service(status: &str) -> Result<Self, TrainingError> {
        match status {
            "InProgress" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Stopped" => Ok(Self::Stopped),
            "Stopping" => Ok(Self::Stopping),
            other => Err(TrainingError::UnknownStatus {
                resource: "training job",
                status: other.to_string(),
            }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Stopping => "Stopping",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Stopped => "Stopped",
        }
    }
}

/// Snapshot returned by `describe_training_job`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingJobState {
    pub status: JobStatus,
    pub failure_reason: Option<String>,
    /// S3 URI of `model.tar.gz`, once the job has produced one.
    pub model_artifacts: Option<String>,
}

/// Lifecycle state of a hosted endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    Creating,
    Updating,
    SystemUpdating,
    RollingBack,
    InService,
    OutOfService,
    Deleting,
    Failed,
    UpdateRollbackFailed,
}

impl EndpointStatus {
    /// Parse the service's status string.
    pub fn from_service(status: &str) -> Result<Self, TrainingError> {
        match status {
            "Creating" => Ok(Self::Creating),
            "Updating" => Ok(Self::Updating),
            "SystemUpdating" => Ok(Self::SystemUpdating),
            "RollingBack" => Ok(Self::RollingBack),
            "InService" => Ok(Self::InService),
            "OutOfService" => Ok(Self::OutOfService),
            "Deleting" => Ok(Self::Deleting),
            "Failed" => Ok(Self::Failed),
            "UpdateRollbackFailed" => Ok(Self::UpdateRollbackFailed),
            other => Err(TrainingError::UnknownStatus {
                resource: "endpoint",
                status: other.to_string(),
            }),
        }
    }

    /// Still moving towards a settled state.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            Self::Creating | Self::Updating | Self::SystemUpdating | Self::RollingBack
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Creating => "Creating",
            Self::Updating => "Updating",
            Self::SystemUpdating => "SystemUpdating",
            Self::RollingBack => "RollingBack",
            Self::InService => "InService",
            Self::OutOfService => "OutOfService",
            Self::Deleting => "Deleting",
            Self::Failed => "Failed",
            Self::UpdateRollbackFailed => "UpdateRollbackFailed",
        }
    }
}

/// Snapshot returned by `describe_endpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointState {
    pub status: EndpointStatus,
    pub failure_reason: Option<String>,
    /// Config the endpoint is currently serving.
    pub endpoint_config_name: Option<String>,
}

/// Starts and tracks training jobs, and registers their models.
#[async_trait]
pub trait TrainingJobLauncher: Send + Sync {
    async fn create_training_job(&self, spec: &TrainingJobSpec) -> Result<(), TrainingError>;

    async fn describe_training_job(&self, job_name: &str)
    -> Result<TrainingJobState, TrainingError>;

    async fn create_model(&self, spec: &ModelSpec) -> Result<(), TrainingError>;
}

/// Points a live endpoint at a registered model.
#[async_trait]
pub trait EndpointUpdater: Send + Sync {
    /// Start the update. Returns once the service has accepted it.
    async fn update_endpoint(&self, update: &EndpointUpdate) -> Result<(), TrainingError>;

    async fn describe_endpoint(&self, endpoint_name: &str)
    -> Result<EndpointState, TrainingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!(JobStatus::from_service("Completed").unwrap(), JobStatus::Completed);
        assert_eq!(JobStatus::from_service("Failed").unwrap(), JobStatus::Failed);
        assert_eq!(JobStatus::from_service("InProgress").unwrap(), JobStatus::InProgress);
        assert!(JobStatus::Stopped.is_terminal());
        assert!(!JobStatus::Stopping.is_terminal());
    }

    #[test]
    fn unknown_job_status_is_an_error() {
        let err = JobStatus::from_service("Mystery").unwrap_err();
        assert!(matches!(
            err,
            TrainingError::UnknownStatus { resource: "training job", ref status } if status == "Mystery"
        ));
    }

    #[test]
    fn endpoint_status_parsing() {
        let updating = EndpointStatus::from_service("Updating").unwrap();
        assert!(updating.is_pending());
        assert!(EndpointStatus::from_service("RollingBack").unwrap().is_pending());
        assert!(!EndpointStatus::from_service("InService").unwrap().is_pending());
        assert!(!EndpointStatus::from_service("Failed").unwrap().is_pending());
        assert!(matches!(
            EndpointStatus::from_service("Sideways"),
            Err(TrainingError::UnknownStatus { resource: "endpoint", .. })
        ));
    }
}
