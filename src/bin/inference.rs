use std::sync::Arc;

use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_sdk_ses::config::Region;
use lambda_runtime::{Error, LambdaEvent, service_fn};

use sms_spam_relay::classifier::SageMakerInferenceClient;
use sms_spam_relay::config::{InferenceConfig, NotifierBackend};
use sms_spam_relay::notifier::{Notifier, SesNotifier, SmtpNotifier};
use sms_spam_relay::pipeline::NotificationHandler;
use sms_spam_relay::storage::S3ObjectFetcher;
use sms_spam_relay::trigger::TriggerPayload;

#[tokio::main]
async fn main() -> Result<(), Error> {
    sms_spam_relay::init_tracing();

    let config = InferenceConfig::from_env().context("loading inference configuration")?;

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

    let notifier: Arc<dyn Notifier> = match &config.notifier {
        NotifierBackend::Ses => {
            let ses_config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .load()
                .await;
            Arc::new(SesNotifier::new(&ses_config))
        }
        NotifierBackend::Smtp(smtp) => {
            // lettre's rustls transport needs a process-wide crypto provider.
            let _ = rustls::crypto::ring::default_provider().install_default();
            Arc::new(SmtpNotifier::new(smtp.clone()))
        }
    };

    tracing::info!(
        endpoint = %config.prediction_endpoint,
        region = %config.region,
        notifier = notifier.name(),
        policy = ?config.dispatch_failure_policy,
        "Inference handler ready"
    );

    let handler = NotificationHandler::new(
        &config,
        Arc::new(S3ObjectFetcher::new(&sdk_config)),
        Arc::new(SageMakerInferenceClient::new(&sdk_config)),
        notifier,
    )?;
    let handler = &handler;

    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<TriggerPayload>| async move {
            handler.handle(&event.payload).await.map_err(Error::from)
        },
    ))
    .await
}
