//! Error types for the relay handlers.

/// Top-level error type returned by both handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Training error: {0}")]
    Training(#[from] TrainingError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Malformed trigger payloads.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Trigger payload contains no records")]
    NoRecords,

    #[error("Trigger record is missing {0}")]
    MissingField(&'static str),
}

/// Object storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to fetch s3://{bucket}/{key}: {reason}")]
    FetchFailed {
        bucket: String,
        key: String,
        reason: String,
    },
}

/// Raw message parsing failures.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Stored object is not a parseable message")]
    Unparseable,

    #[error("Message is missing the {0} header")]
    MissingHeader(&'static str),

    #[error("Multipart message has no body parts")]
    NoBodyParts,
}

/// Inference endpoint failures.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Endpoint {endpoint} request failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Invalid response from endpoint {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Endpoint response has no {0} value")]
    MissingPrediction(&'static str),

    #[error("Vocabulary length {0} is too small to encode text")]
    InvalidVocabulary(usize),

    #[error("Unrecognized predicted label: {0}")]
    UnknownLabel(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Notification dispatch failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The provider accepted the request and refused it.
    #[error("Notification rejected by {provider}: {message}")]
    Rejected { provider: String, message: String },

    /// Anything else: connection, timeout, or a request that could not be built.
    #[error("Notification transport {provider} failed: {reason}")]
    Transport { provider: String, reason: String },
}

/// Training job and endpoint update failures.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("SageMaker {operation} failed: {reason}")]
    Request { operation: String, reason: String },

    #[error("Training job {job} ended as {status}: {reason}")]
    JobFailed {
        job: String,
        status: String,
        reason: String,
    },

    #[error("Training job {0} produced no model artifact")]
    MissingArtifact(String),

    #[error("Unrecognized {resource} status: {status}")]
    UnknownStatus {
        resource: &'static str,
        status: String,
    },

    #[error("Endpoint {endpoint} update ended as {status}: {reason}")]
    EndpointUpdateFailed {
        endpoint: String,
        status: String,
        reason: String,
    },
}

/// Result type alias for the handlers.
pub type Result<T> = std::result::Result<T, Error>;
