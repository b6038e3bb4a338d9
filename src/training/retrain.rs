//! Retrain trigger: train, register, and swap the live model.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{
    EndpointStatus, EndpointUpdate, EndpointUpdater, JobStatus, ModelSpec, TrainingJobLauncher,
    TrainingJobSpec,
};
use crate::config::RetrainConfig;
use crate::error::{Result, TrainingError};
use crate::response::HandlerResponse;

/// Status body returned on every successful invocation.
pub const STATUS_MESSAGE: &str = "Hello from Retrain Lambda!";

/// Names created by one retrain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrainOutcome {
    pub job_name: String,
    pub model_name: String,
    pub model_data_url: String,
    pub endpoint_name: String,
}

pub struct RetrainTrigger {
    config: RetrainConfig,
    region: String,
    launcher: Arc<dyn TrainingJobLauncher>,
    updater: Arc<dyn EndpointUpdater>,
}

impl RetrainTrigger {
    pub fn new(
        config: RetrainConfig,
        region: impl Into<String>,
        launcher: Arc<dyn TrainingJobLauncher>,
        updater: Arc<dyn EndpointUpdater>,
    ) -> Self {
        Self {
            config,
            region: region.into(),
            launcher,
            updater,
        }
    }

    /// Lambda entry point.
    pub async fn handle(&self) -> Result<HandlerResponse> {
        self.retrain(Utc::now()).await?;
        Ok(HandlerResponse::ok(STATUS_MESSAGE))
    }

    /// Run one full retrain, naming the job after `now`.
    pub async fn retrain(&self, now: DateTime<Utc>) -> std::result::Result<RetrainOutcome, TrainingError> {
        let job = TrainingJobSpec::new(&self.config, &self.region, now);
        info!(
            job = %job.job_name,
            output = %job.output_path,
            instance_type = %job.instance_type,
            "Starting training job"
        );

        self.launcher.create_training_job(&job).await?;
        let model_data_url = self.wait_for_completion(&job.job_name).await?;

        let model = ModelSpec::for_job(&job, &self.region, &model_data_url);
        self.launcher.create_model(&model).await?;

        let update = EndpointUpdate::new(&self.config.prediction_endpoint, &model);
        self.updater.update_endpoint(&update).await?;
        self.wait_for_endpoint(&update).await?;

        info!(
            endpoint = %update.endpoint_name,
            model = %model.model_name,
            "Endpoint now serving retrained model"
        );
        Ok(RetrainOutcome {
            job_name: job.job_name,
            model_name: model.model_name,
            model_data_url,
            endpoint_name: update.endpoint_name,
        })
    }

    /// Poll until the job reaches a terminal state; returns the model artifact URI.
    async fn wait_for_completion(&self, job_name: &str) -> std::result::Result<String, TrainingError> {
        loop {
            let state = self.launcher.describe_training_job(job_name).await?;
            info!(job = %job_name, status = state.status.label(), "Training job status");

            match state.status {
                JobStatus::Completed => {
                    return state
                        .model_artifacts
                        .ok_or_else(|| TrainingError::MissingArtifact(job_name.to_string()));
                }
                JobStatus::Failed | JobStatus::Stopped => {
                    let reason = state
                        .failure_reason
                        .unwrap_or_else(|| "no failure reason reported".into());
                    warn!(job = %job_name, %reason, "Training job did not complete");
                    return Err(TrainingError::JobFailed {
                        job: job_name.to_string(),
                        status: state.status.label().to_string(),
                        reason,
                    });
                }
                JobStatus::InProgress | JobStatus::Stopping => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    /// Poll until the endpoint settles on the new config.
    async fn wait_for_endpoint(&self, update: &EndpointUpdate) -> std::result::Result<(), TrainingError> {
        let endpoint = &update.endpoint_name;
        loop {
            let state = self.updater.describe_endpoint(endpoint).await?;
            info!(endpoint = %endpoint, status = state.status.label(), "Endpoint status");

            if state.status.is_pending() {
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            let reason = match (state.status, state.endpoint_config_name) {
                (EndpointStatus::InService, Some(serving))
                    if serving != update.endpoint_config_name =>
                {
                    format!("endpoint still serving {serving}")
                }
                (EndpointStatus::InService, _) => return Ok(()),
                _ => state
                    .failure_reason
                    .unwrap_or_else(|| "no failure reason reported".into()),
            };
            warn!(endpoint = %endpoint, %reason, "Endpoint update did not take effect");
            return Err(TrainingError::EndpointUpdateFailed {
                endpoint: endpoint.clone(),
                status: state.status.label().to_string(),
                reason,
            });
        }
    }
}
