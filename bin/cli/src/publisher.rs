use std::io::Write;
use std::sync::{Mutex, PoisonError};

use resource_collector::{BoxError, EntityPublisher, Settings};
use serde::Serialize;
use software_catalog::{BucketSummary, Entity};

pub const BUCKET_DETAIL_TYPE: &str = "ListAccountS3Buckets";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueueMessage<'a> {
    queue_url: &'a str,
    message_body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BusEntry<'a> {
    source: &'a str,
    detail_type: &'a str,
    detail: String,
    event_bus_name: &'a str,
}

#[derive(Debug, Serialize)]
struct BucketDetail<'a> {
    account_id: &'a str,
    bucket: &'a BucketSummary,
}

/// [`EntityPublisher`] that writes queue messages and bus entries as JSON lines.
///
/// Each line has the shape of the corresponding `SendMessage` or `PutEvents`
/// request so it can be replayed against the real services.
pub struct JsonLinesPublisher<W> {
    queue_url: String,
    event_bus_name: String,
    source: String,
    out: Mutex<W>,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(settings: &Settings, out: W) -> Self {
        Self {
            queue_url: settings.sqs_queue_url.clone(),
            event_bus_name: settings.event_bus_name.clone(),
            source: settings.service_name.clone(),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_line<T: Serialize>(&self, message: &T) -> Result<(), BoxError> {
        let line = serde_json::to_string(message)?;
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")?;
        out.flush()?;

        Ok(())
    }
}

impl<W: Write> EntityPublisher for JsonLinesPublisher<W> {
    fn publish_entity(&self, entity: &Entity) -> Result<(), BoxError> {
        self.write_line(&QueueMessage {
            queue_url: &self.queue_url,
            message_body: serde_json::to_string(entity)?,
        })
    }

    fn publish_buckets(&self, account_id: &str, buckets: &[BucketSummary]) -> Result<(), BoxError> {
        for bucket in buckets {
            self.write_line(&BusEntry {
                source: &self.source,
                detail_type: BUCKET_DETAIL_TYPE,
                detail: serde_json::to_string(&BucketDetail { account_id, bucket })?,
                event_bus_name: &self.event_bus_name,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use resource_collector::{EntityPublisher, Settings};
    use software_catalog::{build, BucketSummary, S3BucketDescriptor};

    use super::JsonLinesPublisher;

    fn settings() -> Settings {
        Settings {
            sqs_queue_url: "https://sqs.us-east-1.amazonaws.com/123456789012/entities".to_string(),
            event_bus_name: "catalog".to_string(),
            service_name: "resource-collector".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn entity_is_written_as_queue_message() {
        let publisher = JsonLinesPublisher::new(&settings(), Vec::new());
        let bucket = S3BucketDescriptor {
            account_id: "123456789012".to_string(),
            region: "us-east-1".to_string(),
            bucket_name: "my-bucket".to_string(),
            tags: vec![],
        };

        let entity = build(&bucket, "UNKNOWN");

        publisher.publish_entity(&entity).unwrap();

        let output = String::from_utf8(publisher.into_inner()).unwrap();
        let message: serde_json::Value = serde_json::from_str(output.trim_end()).unwrap();
        let body: serde_json::Value =
            serde_json::from_str(message["MessageBody"].as_str().unwrap()).unwrap();

        assert_eq!(
            "https://sqs.us-east-1.amazonaws.com/123456789012/entities",
            message["QueueUrl"]
        );
        assert_eq!(serde_json::to_value(&entity).unwrap(), body);
    }

    #[test]
    fn one_bus_entry_per_bucket() {
        let publisher = JsonLinesPublisher::new(&settings(), Vec::new());
        let buckets = ["first", "second"].map(|name| BucketSummary {
            name: name.to_string(),
            creation_date: None,
        });

        publisher.publish_buckets("123456789012", &buckets).unwrap();

        let output = String::from_utf8(publisher.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(2, lines.len());
        assert_eq!(
            r#"{"Source":"resource-collector","DetailType":"ListAccountS3Buckets","Detail":"{\"account_id\":\"123456789012\",\"bucket\":{\"Name\":\"second\"}}","EventBusName":"catalog"}"#,
            lines[1]
        );
    }
}
