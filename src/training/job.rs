//! Training job, model, and endpoint request specs.
//!
//! Everything here is plain data derived from `RetrainConfig`; the SageMaker
//! calls live in `training::sagemaker`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::RetrainConfig;

pub const BASE_JOB_NAME: &str = "sms-spam-classifier-mxnet";
pub const ENTRY_POINT: &str = "sms_spam_classifier_mxnet_script.py";
pub const INSTANCE_TYPE: &str = "ml.c5.2xlarge";
pub const INSTANCE_COUNT: i32 = 1;
pub const FRAMEWORK_VERSION: &str = "1.2";
pub const PY_VERSION: &str = "py3";
pub const VOLUME_SIZE_GB: i32 = 30;
/// 24 hours, the service default for framework jobs.
pub const MAX_RUNTIME_SECS: i32 = 86_400;
/// Account hosting the legacy MXNet framework images.
const FRAMEWORK_IMAGE_ACCOUNT: &str = "520713654638";
/// Python logging.INFO, passed to the framework container.
const CONTAINER_LOG_LEVEL: i32 = 20;
/// SageMaker names are capped at 63 characters.
const MAX_NAME_LEN: usize = 63;

/// Fixed training hyperparameters.
pub const BATCH_SIZE: u32 = 100;
pub const EPOCHS: u32 = 20;
pub const LEARNING_RATE: f64 = 0.01;

/// A named S3 input channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputChannel {
    pub name: String,
    pub s3_uri: String,
}

/// Full `CreateTrainingJob` request.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingJobSpec {
    pub job_name: String,
    pub image: String,
    pub role: String,
    pub channels: Vec<InputChannel>,
    /// JSON-encoded values, as the framework container expects.
    pub hyperparameters: BTreeMap<String, String>,
    pub output_path: String,
    pub code_location: String,
    pub submit_directory: String,
    pub instance_type: String,
    pub instance_count: i32,
    pub volume_size_gb: i32,
    pub max_runtime_secs: i32,
}

impl TrainingJobSpec {
    /// Build the job request for a retrain started at `now`.
    pub fn new(config: &RetrainConfig, region: &str, now: DateTime<Utc>) -> Self {
        let root = format!("s3://{}/{}", config.bucket, config.key_prefix);
        let job_name = job_name(BASE_JOB_NAME, now);
        let code_location = format!("{root}/code");
        let submit_directory = format!("{code_location}/sourcedir.tar.gz");

        let channels = vec![
            InputChannel {
                name: "train".into(),
                s3_uri: format!("{root}/train/"),
            },
            InputChannel {
                name: "val".into(),
                s3_uri: format!("{root}/val/"),
            },
        ];

        let mut hyperparameters = BTreeMap::new();
        hyperparameters.insert("batch_size".to_string(), json(BATCH_SIZE));
        hyperparameters.insert("epochs".to_string(), json(EPOCHS));
        hyperparameters.insert("learning_rate".to_string(), json(LEARNING_RATE));
        hyperparameters.insert("sagemaker_program".to_string(), json(ENTRY_POINT));
        hyperparameters.insert(
            "sagemaker_submit_directory".to_string(),
            json(&submit_directory),
        );
        hyperparameters.insert("sagemaker_region".to_string(), json(region));
        hyperparameters.insert(
            "sagemaker_container_log_level".to_string(),
            json(CONTAINER_LOG_LEVEL),
        );
        hyperparameters.insert("sagemaker_job_name".to_string(), json(&job_name));

        Self {
            job_name,
            image: framework_image(region),
            role: config.role.clone(),
            channels,
            hyperparameters,
            output_path: format!("{root}/output"),
            code_location,
            submit_directory,
            instance_type: INSTANCE_TYPE.to_string(),
            instance_count: INSTANCE_COUNT,
            volume_size_gb: VOLUME_SIZE_GB,
            max_runtime_secs: MAX_RUNTIME_SECS,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&InputChannel> {
        self.channels.iter().find(|c| c.name == name)
    }
}

/// `CreateModel` request for a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub model_name: String,
    pub image: String,
    pub model_data_url: String,
    pub role: String,
    pub environment: BTreeMap<String, String>,
}

impl ModelSpec {
    pub fn for_job(job: &TrainingJobSpec, region: &str, model_data_url: &str) -> Self {
        let environment = BTreeMap::from([
            ("SAGEMAKER_PROGRAM".to_string(), ENTRY_POINT.to_string()),
            (
                "SAGEMAKER_SUBMIT_DIRECTORY".to_string(),
                job.submit_directory.clone(),
            ),
            ("SAGEMAKER_REGION".to_string(), region.to_string()),
            (
                "SAGEMAKER_CONTAINER_LOG_LEVEL".to_string(),
                CONTAINER_LOG_LEVEL.to_string(),
            ),
        ]);

        Self {
            model_name: job.job_name.clone(),
            image: job.image.clone(),
            model_data_url: model_data_url.to_string(),
            role: job.role.clone(),
            environment,
        }
    }
}

/// Repoint an existing endpoint at a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUpdate {
    pub endpoint_name: String,
    pub endpoint_config_name: String,
    pub model_name: String,
    pub instance_type: String,
    pub instance_count: i32,
}

impl EndpointUpdate {
    pub fn new(endpoint_name: &str, model: &ModelSpec) -> Self {
        Self {
            endpoint_name: endpoint_name.to_string(),
            endpoint_config_name: model.model_name.clone(),
            model_name: model.model_name.clone(),
            instance_type: INSTANCE_TYPE.to_string(),
            instance_count: INSTANCE_COUNT,
        }
    }
}

/// MXNet CPU image for the configured framework and Python versions.
pub fn framework_image(region: &str) -> String {
    format!(
        "{FRAMEWORK_IMAGE_ACCOUNT}.dkr.ecr.{region}.amazonaws.com/sagemaker-mxnet:{FRAMEWORK_VERSION}-cpu-{PY_VERSION}"
    )
}

/// `{base}-{timestamp}`, trimmed from the front of `base` to fit the name limit.
pub fn job_name(base: &str, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y-%m-%d-%H-%M-%S-%3f").to_string();
    let room = MAX_NAME_LEN - stamp.len() - 1;
    let base = if base.len() > room { &base[..room] } else { base };
    format!("{}-{stamp}", base.trim_end_matches('-'))
}

fn json(value: impl serde::Serialize) -> String {
    serde_json::to_string(&value).unwrap_or_default()
}
