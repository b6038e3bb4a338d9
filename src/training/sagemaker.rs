//! SageMaker-backed training launcher and endpoint updater.

use async_trait::async_trait;
use aws_sdk_sagemaker::error::DisplayErrorContext;
use aws_sdk_sagemaker::types::{
    AlgorithmSpecification, Channel, ContainerDefinition, DataSource, ModelArtifacts,
    OutputDataConfig, ProductionVariant, ProductionVariantInstanceType, ResourceConfig,
    S3DataDistribution, S3DataSource, S3DataType, StoppingCondition, TrainingInputMode,
    TrainingInstanceType, TrainingJobStatus,
};
use aws_sdk_sagemaker::types::EndpointStatus as SdkEndpointStatus;
use tracing::info;

use super::{
    EndpointState, EndpointStatus, EndpointUpdate, EndpointUpdater, JobStatus, ModelSpec,
    TrainingJobLauncher, TrainingJobSpec, TrainingJobState,
};
use crate::error::TrainingError;

/// Name of the single production variant.
const VARIANT_NAME: &str = "AllTraffic";

pub struct SageMakerTrainingService {
    client: aws_sdk_sagemaker::Client,
}

impl SageMakerTrainingService {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_sagemaker::Client::new(sdk_config),
        }
    }
}

fn request_failed<E, R>(operation: &str, e: aws_sdk_sagemaker::error::SdkError<E, R>) -> TrainingError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    TrainingError::Request {
        operation: operation.to_string(),
        reason: DisplayErrorContext(&e).to_string(),
    }
}

fn input_channel(name: &str, s3_uri: &str) -> Channel {
    let source = S3DataSource::builder()
        .s3_data_type(S3DataType::S3Prefix)
        .s3_uri(s3_uri)
        .s3_data_distribution_type(S3DataDistribution::FullyReplicated)
        .build();

    Channel::builder()
        .channel_name(name)
        .data_source(DataSource::builder().s3_data_source(source).build())
        .build()
}

#[async_trait]
impl TrainingJobLauncher for SageMakerTrainingService {
    async fn create_training_job(&self, spec: &TrainingJobSpec) -> Result<(), TrainingError> {
        let algorithm = AlgorithmSpecification::builder()
            .training_image(&spec.image)
            .training_input_mode(TrainingInputMode::File)
            .build();
        let output = OutputDataConfig::builder()
            .s3_output_path(&spec.output_path)
            .build();
        let resources = ResourceConfig::builder()
            .instance_type(TrainingInstanceType::from(spec.instance_type.as_str()))
            .instance_count(spec.instance_count)
            .volume_size_in_gb(spec.volume_size_gb)
            .build();

        let mut request = self
            .client
            .create_training_job()
            .training_job_name(&spec.job_name)
            .role_arn(&spec.role)
            .algorithm_specification(algorithm)
            .output_data_config(output)
            .resource_config(resources)
            .stopping_condition(
                StoppingCondition::builder()
                    .max_runtime_in_seconds(spec.max_runtime_secs)
                    .build(),
            );
        for channel in &spec.channels {
            request = request.input_data_config(input_channel(&channel.name, &channel.s3_uri));
        }
        for (key, value) in &spec.hyperparameters {
            request = request.hyper_parameters(key, value);
        }

        request
            .send()
            .await
            .map_err(|e| request_failed("CreateTrainingJob", e))?;
        info!(job = %spec.job_name, "Training job created");
        Ok(())
    }

    async fn describe_training_job(
        &self,
        job_name: &str,
    ) -> Result<TrainingJobState, TrainingError> {
        let output = self
            .client
            .describe_training_job()
            .training_job_name(job_name)
            .send()
            .await
            .map_err(|e| request_failed("DescribeTrainingJob", e))?;

        let status: Option<&TrainingJobStatus> = output.training_job_status().into();
        let artifacts: Option<&ModelArtifacts> = output.model_artifacts().into();
        let model_artifacts = artifacts
            .and_then(|a| Option::<&str>::from(a.s3_model_artifacts()))
            .filter(|uri| !uri.is_empty())
            .map(str::to_string);

        let status = match status {
            Some(s) => JobStatus::from_service(s.as_str())?,
            None => JobStatus::InProgress,
        };

        Ok(TrainingJobState {
            status,
            failure_reason: output.failure_reason().map(str::to_string),
            model_artifacts,
        })
    }

    async fn create_model(&self, spec: &ModelSpec) -> Result<(), TrainingError> {
        let mut container = ContainerDefinition::builder()
            .image(&spec.image)
            .model_data_url(&spec.model_data_url);
        for (key, value) in &spec.environment {
            container = container.environment(key, value);
        }

        self.client
            .create_model()
            .model_name(&spec.model_name)
            .execution_role_arn(&spec.role)
            .primary_container(container.build())
            .send()
            .await
            .map_err(|e| request_failed("CreateModel", e))?;
        info!(model = %spec.model_name, "Model registered");
        Ok(())
    }
}

#[async_trait]
impl EndpointUpdater for SageMakerTrainingService {
    async fn update_endpoint(&self, update: &EndpointUpdate) -> Result<(), TrainingError> {
        let variant = ProductionVariant::builder()
            .variant_name(VARIANT_NAME)
            .model_name(&update.model_name)
            .initial_instance_count(update.instance_count)
            .instance_type(ProductionVariantInstanceType::from(update.instance_type.as_str()))
            .initial_variant_weight(1.0)
            .build();

        self.client
            .create_endpoint_config()
            .endpoint_config_name(&update.endpoint_config_name)
            .production_variants(variant)
            .send()
            .await
            .map_err(|e| request_failed("CreateEndpointConfig", e))?;

        self.client
            .update_endpoint()
            .endpoint_name(&update.endpoint_name)
            .endpoint_config_name(&update.endpoint_config_name)
            .send()
            .await
            .map_err(|e| request_failed("UpdateEndpoint", e))?;

        info!(
            endpoint = %update.endpoint_name,
            config = %update.endpoint_config_name,
            "Endpoint update started"
        );
        Ok(())
    }

    async fn describe_endpoint(&self, endpoint_name: &str) -> Result<EndpointState, TrainingError> {
        let output = self
            .client
            .describe_endpoint()
            .endpoint_name(endpoint_name)
            .send()
            .await
            .map_err(|e| request_failed("DescribeEndpoint", e))?;

        let status: Option<&SdkEndpointStatus> = output.endpoint_status().into();
        let status = status.ok_or_else(|| TrainingError::UnknownStatus {
            resource: "endpoint",
            status: "<missing>".into(),
        })?;
        let config_name: Option<&str> = output.endpoint_config_name().into();

        Ok(EndpointState {
            status: EndpointStatus::from_service(status.as_str())?,
            failure_reason: output.failure_reason().map(str::to_string),
            endpoint_config_name: config_name.map(str::to_string),
        })
    }
}
