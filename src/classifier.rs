//! Spam classification against a hosted SageMaker endpoint.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sagemakerruntime::primitives::Blob;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ClassifierError;
use crate::features;

/// Predicted category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    /// Decode the endpoint's class value: numeric 1/0 or the class name.
    pub fn from_prediction(value: &serde_json::Value) -> Result<Self, ClassifierError> {
        match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(v) if v == 1.0 => Ok(Self::Spam),
                Some(v) if v == 0.0 => Ok(Self::Ham),
                _ => Err(ClassifierError::UnknownLabel(n.to_string())),
            },
            serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "spam" | "1" | "1.0" => Ok(Self::Spam),
                "ham" | "0" | "0.0" => Ok(Self::Ham),
                _ => Err(ClassifierError::UnknownLabel(s.clone())),
            },
            other => Err(ClassifierError::UnknownLabel(other.to_string())),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spam => "spam",
            Self::Ham => "ham",
        })
    }
}

/// Result of one classification call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub label: Label,
    /// Raw endpoint probability, 0 to 1.
    pub probability: f64,
}

impl ClassificationResult {
    /// Probability scaled to a percentage.
    pub fn confidence_percent(&self) -> f64 {
        self.probability * 100.0
    }
}

/// Endpoint response body.
#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    predicted_label: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    predicted_probability: Vec<Vec<f64>>,
}

/// Decode the first prediction from an endpoint response body.
pub fn parse_prediction(body: &[u8]) -> Result<ClassificationResult, ClassifierError> {
    let response: PredictionResponse = serde_json::from_slice(body)?;

    let label = response
        .predicted_label
        .first()
        .and_then(|row| row.first())
        .ok_or(ClassifierError::MissingPrediction("predicted_label"))?;
    let probability = response
        .predicted_probability
        .first()
        .and_then(|row| row.first())
        .copied()
        .ok_or(ClassifierError::MissingPrediction("predicted_probability"))?;

    Ok(ClassificationResult {
        label: Label::from_prediction(label)?,
        probability,
    })
}

/// Raw transport to a model endpoint.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send a JSON payload to the endpoint and return the raw response body.
    async fn invoke(&self, endpoint: &str, payload: Vec<u8>) -> Result<Vec<u8>, ClassifierError>;
}

/// `InferenceClient` backed by the SageMaker runtime API.
pub struct SageMakerInferenceClient {
    client: aws_sdk_sagemakerruntime::Client,
}

impl SageMakerInferenceClient {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_sagemakerruntime::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl InferenceClient for SageMakerInferenceClient {
    async fn invoke(&self, endpoint: &str, payload: Vec<u8>) -> Result<Vec<u8>, ClassifierError> {
        let output = self
            .client
            .invoke_endpoint()
            .endpoint_name(endpoint)
            .content_type("application/json")
            .body(Blob::new(payload))
            .send()
            .await
            .map_err(|e| ClassifierError::Request {
                endpoint: endpoint.to_string(),
                reason: aws_sdk_sagemakerruntime::error::DisplayErrorContext(&e).to_string(),
            })?;

        let body: Option<&Blob> = output.body().into();
        body.map(|b| b.as_ref().to_vec())
            .ok_or_else(|| ClassifierError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: "empty response body".into(),
            })
    }
}

/// Encodes text and asks the endpoint for a prediction.
pub struct Classifier {
    client: Arc<dyn InferenceClient>,
    endpoint: String,
    vocabulary_length: usize,
}

impl Classifier {
    /// Fails if `vocabulary_length` leaves no room for hashed words.
    pub fn new(
        client: Arc<dyn InferenceClient>,
        endpoint: impl Into<String>,
        vocabulary_length: usize,
    ) -> Result<Self, ClassifierError> {
        if vocabulary_length < features::MIN_VOCABULARY_LENGTH {
            return Err(ClassifierError::InvalidVocabulary(vocabulary_length));
        }
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            vocabulary_length,
        })
    }

    /// Classify one normalized message.
    pub async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        let vector = features::encode(text, self.vocabulary_length);
        let payload = serde_json::to_vec(&[vector])?;

        info!(endpoint = %self.endpoint, bytes = payload.len(), "Invoking prediction endpoint");
        let body = self.client.invoke(&self.endpoint, payload).await?;
        debug!(response = %String::from_utf8_lossy(&body), "Prediction endpoint responded");

        let result = parse_prediction(&body).map_err(|e| match e {
            ClassifierError::Json(err) => ClassifierError::InvalidResponse {
                endpoint: self.endpoint.clone(),
                reason: err.to_string(),
            },
            other => other,
        })?;
        info!(label = %result.label, probability = result.probability, "Message classified");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn parse_numeric_prediction() {
        let result =
            parse_prediction(br#"{"predicted_label": [[1.0]], "predicted_probability": [[0.98]]}"#)
                .unwrap();
        assert_eq!(result.label, Label::Spam);
        assert_eq!(result.probability, 0.98);
    }

    #[test]
    fn parse_named_prediction() {
        let result =
            parse_prediction(br#"{"predicted_label": [["ham"]], "predicted_probability": [[0.25]]}"#)
                .unwrap();
        assert_eq!(result.label, Label::Ham);
        assert_eq!(result.confidence_percent(), 25.0);
    }

    #[test]
    fn parse_missing_prediction_is_named_error() {
        let err = parse_prediction(br#"{"predicted_label": [], "predicted_probability": [[0.5]]}"#)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::MissingPrediction("predicted_label")));

        let err = parse_prediction(br#"{"predicted_label": [[0]]}"#).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::MissingPrediction("predicted_probability")
        ));
    }

    #[test]
    fn parse_unknown_label() {
        let err = parse_prediction(br#"{"predicted_label": [[3]], "predicted_probability": [[0.5]]}"#)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownLabel(_)));
    }

    #[test]
    fn confidence_is_probability_times_hundred() {
        for p in [0.0, 0.123, 0.5, 0.987_654_321, 1.0] {
            let result = ClassificationResult {
                label: Label::Ham,
                probability: p,
            };
            assert_eq!(result.confidence_percent(), p * 100.0);
        }
    }

    /// Records the payload it was sent and answers with a canned body.
    struct RecordingClient {
        seen: Mutex<Vec<(String, Vec<u8>)>>,
        response: &'static [u8],
    }

    #[async_trait]
    impl InferenceClient for RecordingClient {
        async fn invoke(
            &self,
            endpoint: &str,
            payload: Vec<u8>,
        ) -> Result<Vec<u8>, ClassifierError> {
            self.seen.lock().unwrap().push((endpoint.to_string(), payload));
            Ok(self.response.to_vec())
        }
    }

    #[tokio::test]
    async fn classify_sends_one_encoded_vector() {
        let client = Arc::new(RecordingClient {
            seen: Mutex::new(Vec::new()),
            response: br#"{"predicted_label": [[0]], "predicted_probability": [[0.91]]}"#,
        });
        let classifier = Classifier::new(client.clone(), "sms-spam-classifier", 16).unwrap();

        let result = classifier.classify("hello there").await.unwrap();
        assert_eq!(result.label, Label::Ham);

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "sms-spam-classifier");
        let sent: Vec<Vec<f64>> = serde_json::from_slice(&seen[0].1).unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], features::encode("hello there", 16));
    }

    #[tokio::test]
    async fn classify_reports_garbage_response() {
        let client = Arc::new(RecordingClient {
            seen: Mutex::new(Vec::new()),
            response: b"not json",
        });
        let classifier = Classifier::new(client, "ep", 16).unwrap();
        let err = classifier.classify("x").await.unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidResponse { .. }));
    }

    #[test]
    fn too_small_vocabulary_is_rejected() {
        for length in [0, 1] {
            let client = Arc::new(RecordingClient {
                seen: Mutex::new(Vec::new()),
                response: b"{}",
            });
            assert!(matches!(
                Classifier::new(client, "ep", length),
                Err(ClassifierError::InvalidVocabulary(n)) if n == length
            ));
        }
    }
}
