use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uploaded diagram blob, keyed by a generated id (`spec.md` §3, §6 "Upload").
///
/// If storage quota is exceeded the core may store a `data: None` sentinel
/// carrying `error`; downstream stages then proceed without the image and log
/// a warning rather than failing the job (`spec.md` §8 "Image storage").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub data: Option<String>,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

impl UploadedFile {
    pub fn new(data: String, mime_type: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            data: Some(data),
            mime_type: mime_type.into(),
            timestamp,
            error: None,
        }
    }

    pub fn errored(mime_type: impl Into<String>, timestamp: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            data: None,
            mime_type: mime_type.into(),
            timestamp,
            error: Some(error.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.data.is_some()
    }
}
