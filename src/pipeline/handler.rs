//! Notification handler: fetch, parse, classify, reply.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::classifier::{ClassificationResult, Classifier, InferenceClient};
use crate::config::{DispatchFailurePolicy, InferenceConfig};
use crate::error::{NotifyError, Result};
use crate::message::InboundMessage;
use crate::notifier::Notifier;
use crate::reply::{self, ReplyMessage};
use crate::response::HandlerResponse;
use crate::storage::ObjectFetcher;
use crate::trigger::TriggerPayload;

/// Status body returned on every successful invocation.
pub const STATUS_MESSAGE: &str = "Hello from Inference Lambda!";

/// What happened to one invocation's reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The notifier accepted the reply.
    Sent {
        message_id: String,
        classification: ClassificationResult,
        reply: ReplyMessage,
    },
    /// The notifier rejected the reply and the policy absorbed it.
    Rejected {
        message: String,
        classification: ClassificationResult,
        reply: ReplyMessage,
    },
}

impl Outcome {
    pub fn reply(&self) -> &ReplyMessage {
        match self {
            Self::Sent { reply, .. } | Self::Rejected { reply, .. } => reply,
        }
    }
}

/// Runs the inbound pipeline for one trigger at a time.
pub struct NotificationHandler {
    fetcher: Arc<dyn ObjectFetcher>,
    classifier: Classifier,
    notifier: Arc<dyn Notifier>,
    dispatch_policy: DispatchFailurePolicy,
}

impl NotificationHandler {
    pub fn new(
        config: &InferenceConfig,
        fetcher: Arc<dyn ObjectFetcher>,
        inference: Arc<dyn InferenceClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            classifier: Classifier::new(
                inference,
                config.prediction_endpoint.clone(),
                config.vocabulary_length,
            )?,
            notifier,
            dispatch_policy: config.dispatch_failure_policy,
        })
    }

    /// Lambda entry point: run the pipeline and return the fixed status.
    pub async fn handle(&self, payload: &TriggerPayload) -> Result<HandlerResponse> {
        self.process(payload).await?;
        Ok(HandlerResponse::ok(STATUS_MESSAGE))
    }

    /// Run the pipeline and report what happened to the reply.
    pub async fn process(&self, payload: &TriggerPayload) -> Result<Outcome> {
        debug!(records = payload.records.len(), "Received trigger");

        let object = payload.first_object()?;
        let raw = self.fetcher.fetch(&object).await?;

        let message = InboundMessage::parse(&raw)?;
        info!(
            from = %message.sender,
            to = %message.recipient,
            subject = %message.subject,
            date = %message.received,
            "Parsed inbound message"
        );

        let classification = self
            .classifier
            .classify(&message.normalized_body())
            .await?;

        let reply = reply::compose(&message, &classification);
        debug!(body = %reply.body, "Composed reply");

        match self.notifier.send(&reply).await {
            Ok(message_id) => {
                info!(notifier = self.notifier.name(), %message_id, "Reply sent");
                Ok(Outcome::Sent {
                    message_id,
                    classification,
                    reply,
                })
            }
            Err(NotifyError::Rejected { message, .. })
                if self.dispatch_policy == DispatchFailurePolicy::LogAndContinue =>
            {
                error!(notifier = self.notifier.name(), "{message}");
                Ok(Outcome::Rejected {
                    message,
                    classification,
                    reply,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
