//! S3 event notification payloads.

use serde::{Deserialize, Serialize};

use crate::error::{HandlerError, Result};

/// S3 event notification (`{"Records": [...]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,

    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Object {
    /// URL-encoded object key.
    pub key: String,

    #[serde(default)]
    pub size: Option<u64>,
}

/// A decoded reference to one uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl S3Event {
    /// Parse an event from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HandlerError::InvalidEvent(e.to_string()))
    }

    /// Objects named by the event, keys decoded.
    pub fn objects(&self) -> Result<Vec<ObjectRef>> {
        if self.records.is_empty() {
            return Err(HandlerError::InvalidEvent("event has no records".to_string()));
        }

        self.records
            .iter()
            .map(|record| {
                Ok(ObjectRef {
                    bucket: record.s3.bucket.name.clone(),
                    key: decode_key(&record.s3.object.key)?,
                })
            })
            .collect()
    }
}

/// Decode an event object key (`+` is a space, then percent escapes).
pub fn decode_key(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|e| HandlerError::InvalidEvent(format!("bad object key {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EVENT: &str = r#"{
        "Records": [
            {
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": "s3-1812-pdf", "arn": "arn:aws:s3:::s3-1812-pdf"},
                    "object": {"key": "uploads/I-485+Maria+Garcia%282%29.pdf", "size": 48213}
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_event() {
        let event = S3Event::from_json(EVENT).unwrap();
        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].event_name.as_deref(), Some("ObjectCreated:Put"));
        assert_eq!(event.records[0].s3.object.size, Some(48213));

        assert_eq!(
            event.objects().unwrap(),
            vec![ObjectRef {
                bucket: "s3-1812-pdf".to_string(),
                key: "uploads/I-485 Maria Garcia(2).pdf".to_string(),
            }]
        );
    }

    #[test]
    fn test_decode_key() {
        assert_eq!(decode_key("plain.pdf").unwrap(), "plain.pdf");
        assert_eq!(decode_key("a%2Bb.pdf").unwrap(), "a+b.pdf");
        assert!(decode_key("bad%FF%FE.pdf").is_err());
    }

    #[test]
    fn test_empty_event_is_rejected() {
        let event = S3Event::from_json("{}").unwrap();
        assert!(matches!(event.objects(), Err(HandlerError::InvalidEvent(_))));
        assert!(S3Event::from_json("not json").is_err());
    }
}
