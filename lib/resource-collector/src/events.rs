//! Typed models of the events that trigger a sync.
//!
//! Queue and topic payloads arrive as JSON text inside the envelope and are
//! decoded with an explicit `payload` call so a malformed record surfaces as
//! [`SyncError::InvalidEvent`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{SyncError, SyncResult};

/// Decode `text` as `T`, naming the payload `kind` on failure.
pub fn parse<T: DeserializeOwned>(kind: &'static str, text: &str) -> SyncResult<T> {
    serde_json::from_str(text).map_err(|source| SyncError::InvalidEvent { kind, source })
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SqsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SqsMessage>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqsMessage {
    #[serde(default)]
    pub message_id: String,
    pub body: String,
    #[serde(
        rename = "eventSourceARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_source_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
}

impl SqsMessage {
    pub fn payload<T: DeserializeOwned>(&self) -> SyncResult<T> {
        parse("SQS message body", &self.body)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SnsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SnsRecord>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SnsRecord {
    #[serde(rename = "Sns")]
    pub sns: SnsMessage,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsMessage {
    #[serde(default)]
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl SnsMessage {
    pub fn payload<T: DeserializeOwned>(&self) -> SyncResult<T> {
        parse("SNS message", &self.message)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventBridgeEvent<D> {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub detail_type: String,
    pub detail: D,
}

/// CloudTrail detail of an S3 bucket API call delivered through EventBridge.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3BucketEventDetail {
    #[serde(default)]
    pub event_name: String,
    pub aws_region: String,
    pub recipient_account_id: String,
    pub request_parameters: S3BucketRequestParameters,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3BucketRequestParameters {
    pub bucket_name: String,
}

pub type S3BucketEvent = EventBridgeEvent<S3BucketEventDetail>;
