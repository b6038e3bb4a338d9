//! Trigger payloads delivered by the Lambda runtime.

use serde::{Deserialize, Serialize};

use crate::error::TriggerError;

/// S3 event notification. Only the parts the handler reads are modelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerPayload {
    #[serde(rename = "Records", default)]
    pub records: Vec<TriggerRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRecord {
    #[serde(default)]
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: Option<S3Bucket>,
    #[serde(default)]
    pub object: Option<S3Object>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Object {
    pub key: Option<String>,
}

/// Location of one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl TriggerPayload {
    /// Object referenced by the first record. Later records are ignored.
    pub fn first_object(&self) -> Result<ObjectRef, TriggerError> {
        let record = self.records.first().ok_or(TriggerError::NoRecords)?;
        let s3 = record.s3.as_ref().ok_or(TriggerError::MissingField("s3"))?;
        let bucket = s3
            .bucket
            .as_ref()
            .and_then(|b| b.name.clone())
            .filter(|n| !n.is_empty())
            .ok_or(TriggerError::MissingField("s3.bucket.name"))?;
        let key = s3
            .object
            .as_ref()
            .and_then(|o| o.key.clone())
            .filter(|k| !k.is_empty())
            .ok_or(TriggerError::MissingField("s3.object.key"))?;
        Ok(ObjectRef { bucket, key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_object_from_s3_event() {
        let payload: TriggerPayload = serde_json::from_value(serde_json::json!({
            "Records": [
                {
                    "eventSource": "aws:s3",
                    "s3": {
                        "bucket": { "name": "inbound-mail", "arn": "arn:aws:s3:::inbound-mail" },
                        "object": { "key": "emails/abc123", "size": 1024 }
                    }
                },
                {
                    "s3": {
                        "bucket": { "name": "other" },
                        "object": { "key": "ignored" }
                    }
                }
            ]
        }))
        .unwrap();

        let object = payload.first_object().unwrap();
        assert_eq!(
            object,
            ObjectRef {
                bucket: "inbound-mail".into(),
                key: "emails/abc123".into(),
            }
        );
    }

    #[test]
    fn empty_records_is_an_error() {
        let payload: TriggerPayload = serde_json::from_str(r#"{"Records": []}"#).unwrap();
        assert!(matches!(payload.first_object(), Err(TriggerError::NoRecords)));

        let payload: TriggerPayload = serde_json::from_str("{}").unwrap();
        assert!(matches!(payload.first_object(), Err(TriggerError::NoRecords)));
    }

    #[test]
    fn missing_key_is_an_error() {
        let payload: TriggerPayload = serde_json::from_value(serde_json::json!({
            "Records": [{ "s3": { "bucket": { "name": "b" }, "object": {} } }]
        }))
        .unwrap();
        assert!(matches!(
            payload.first_object(),
            Err(TriggerError::MissingField("s3.object.key"))
        ));
    }

    #[test]
    fn record_without_s3_entity() {
        let payload: TriggerPayload =
            serde_json::from_str(r#"{"Records": [{"eventSource": "aws:sqs"}]}"#).unwrap();
        assert!(matches!(
            payload.first_object(),
            Err(TriggerError::MissingField("s3"))
        ));
    }
}
