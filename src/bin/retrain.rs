use std::sync::Arc;

use anyhow::{Context, anyhow};
use aws_config::BehaviorVersion;
use aws_sdk_sagemaker::config::Region;
use lambda_runtime::{Error, LambdaEvent, service_fn};

use sms_spam_relay::config::RetrainConfig;
use sms_spam_relay::training::{RetrainTrigger, SageMakerTrainingService};

#[tokio::main]
async fn main() -> Result<(), Error> {
    sms_spam_relay::init_tracing();

    let config = RetrainConfig::from_env().context("loading retrain configuration")?;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;
    let region = sdk_config
        .region()
        .map(|r| r.to_string())
        .ok_or_else(|| anyhow!("no AWS region configured; set REGION or AWS_REGION"))?;

    tracing::info!(
        endpoint = %config.prediction_endpoint,
        bucket = %config.bucket,
        prefix = %config.key_prefix,
        %region,
        "Retrain handler ready"
    );

    let service = Arc::new(SageMakerTrainingService::new(&sdk_config));
    let trigger = RetrainTrigger::new(config, region, service.clone(), service);
    let trigger = &trigger;

    lambda_runtime::run(service_fn(
        move |_event: LambdaEvent<serde_json::Value>| async move {
            trigger.handle().await.map_err(Error::from)
        },
    ))
    .await
}
