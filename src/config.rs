//! Configuration types.
//!
//! Both handlers build their config once at cold start and pass it by
//! reference. Nothing reads the environment after that.

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::features::MIN_VOCABULARY_LENGTH;

/// Vocabulary size the deployed classifier was trained with.
pub const DEFAULT_VOCABULARY_LENGTH: usize = 9013;

/// Seconds between `DescribeTrainingJob` polls.
pub const DEFAULT_TRAINING_POLL_SECS: u64 = 30;

/// What to do when the notification provider rejects a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchFailurePolicy {
    /// Log the provider's message and report success anyway.
    #[default]
    LogAndContinue,
    /// Fail the invocation.
    Propagate,
}

impl FromStr for DispatchFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "log_and_continue" => Ok(Self::LogAndContinue),
            "propagate" | "fail" => Ok(Self::Propagate),
            other => Err(format!("expected `log` or `propagate`, got `{other}`")),
        }
    }
}

/// SMTP relay settings for the lettre notifier.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

/// Which transport sends replies.
#[derive(Debug, Clone)]
pub enum NotifierBackend {
    Ses,
    Smtp(SmtpConfig),
}

/// Notification handler configuration.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Region for the SES client.
    pub region: String,
    /// SageMaker endpoint serving the classifier.
    pub prediction_endpoint: String,
    pub vocabulary_length: usize,
    pub dispatch_failure_policy: DispatchFailurePolicy,
    pub notifier: NotifierBackend,
}

impl InferenceConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let region = required(&lookup, "REGION")?;
        let prediction_endpoint = required(&lookup, "PREDICTION_ENDPOINT")?;
        let vocabulary_length: usize =
            parsed(&lookup, "VOCABULARY_LENGTH")?.unwrap_or(DEFAULT_VOCABULARY_LENGTH);
        if vocabulary_length < MIN_VOCABULARY_LENGTH {
            return Err(ConfigError::InvalidValue {
                key: "VOCABULARY_LENGTH".into(),
                message: format!("must be at least {MIN_VOCABULARY_LENGTH}"),
            });
        }
        let dispatch_failure_policy =
            parsed(&lookup, "DISPATCH_FAILURE_POLICY")?.unwrap_or_default();

        let notifier = match lookup("NOTIFIER_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("ses") => NotifierBackend::Ses,
            Some("smtp") => NotifierBackend::Smtp(SmtpConfig {
                host: required(&lookup, "SMTP_HOST")?,
                port: parsed(&lookup, "SMTP_PORT")?.unwrap_or(587),
                username: lookup("SMTP_USERNAME").unwrap_or_default(),
                password: SecretString::from(lookup("SMTP_PASSWORD").unwrap_or_default()),
            }),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "NOTIFIER_BACKEND".into(),
                    message: format!("expected `ses` or `smtp`, got `{other}`"),
                });
            }
        };

        Ok(Self {
            region,
            prediction_endpoint,
            vocabulary_length,
            dispatch_failure_policy,
            notifier,
        })
    }
}

/// Retrain trigger configuration.
#[derive(Debug, Clone)]
pub struct RetrainConfig {
    pub bucket: String,
    pub key_prefix: String,
    /// IAM role ARN the training job runs as.
    pub role: String,
    pub prediction_endpoint: String,
    /// `None` falls back to the SDK's region resolution.
    pub region: Option<String>,
    pub poll_interval: Duration,
}

impl RetrainConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bucket = required(&lookup, "SAGEMAKER_BUCKET")?;
        let key_prefix = required(&lookup, "SAGEMAKER_BUCKET_KEY_PREFIX")?
            .trim_matches('/')
            .to_string();
        let role = required(&lookup, "SAGEMAKER_ROLE")?;
        let prediction_endpoint = required(&lookup, "PREDICTION_ENDPOINT")?;
        let region = lookup("REGION")
            .or_else(|| lookup("AWS_REGION"))
            .filter(|r| !r.trim().is_empty());
        let poll_secs: u64 =
            parsed(&lookup, "TRAINING_POLL_INTERVAL_SECS")?.unwrap_or(DEFAULT_TRAINING_POLL_SECS);

        Ok(Self {
            bucket,
            key_prefix,
            role,
            prediction_endpoint,
            region,
            poll_interval: Duration::from_secs(poll_secs.max(1)),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}
