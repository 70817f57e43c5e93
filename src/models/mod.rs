use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle point the upload server is notifying us about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookKind {
    PreCreate,
    PostFinish,
    /// Any other event type the upload server emits; every handler ignores it.
    #[serde(other)]
    Other,
}

/// One notification from the upload server. Read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub kind: HookKind,
    pub upload_id: String,
    pub metadata: HashMap<String, String>,
    pub credential: Option<String>,
}

impl LifecycleEvent {
    pub fn new(kind: HookKind, upload_id: impl Into<String>) -> Self {
        Self {
            kind,
            upload_id: upload_id.into(),
            metadata: HashMap::new(),
            credential: None,
        }
    }

    pub fn with_metadata<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_credential(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(token.into());
        self
    }

    pub fn upload_metadata(&self) -> UploadMetadata<'_> {
        UploadMetadata::from_map(&self.metadata)
    }
}

/// Media branch requested by the uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Typed view over the upload metadata keys the pipeline understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetadata<'a> {
    pub record_type: Option<&'a str>,
    pub id: Option<&'a str>,
    pub filename: Option<&'a str>,
    pub filetype: &'a str,
    pub media: Option<MediaKind>,
    pub replace: Option<&'a str>,
}

impl<'a> UploadMetadata<'a> {
    pub const SINGLE_RECORD: &'static str = "single";

    pub fn from_map(map: &'a HashMap<String, String>) -> Self {
        let get = move |key: &str| -> Option<&'a str> { map.get(key).map(String::as_str) };

        Self {
            record_type: get("recordType"),
            id: get("id"),
            filename: get("filename"),
            filetype: get("filetype").unwrap_or(""),
            media: get("mediatype").and_then(MediaKind::parse),
            replace: get("replace").filter(|r| !r.is_empty()),
        }
    }

    pub fn is_single_record(&self) -> bool {
        self.record_type == Some(Self::SINGLE_RECORD)
    }
}

/// Result of one handler, or the merged result of the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookResponse {
    pub status_code: Option<u16>,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub reject: bool,
    pub stop: bool,
    pub metadata_patch: HashMap<String, String>,
}

impl HookResponse {
    pub fn rejected(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            body: body.into(),
            reject: true,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_patch(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata_patch.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_metadata_reads_canonical_keys() {
        let event = LifecycleEvent::new(HookKind::PostFinish, "abc").with_metadata([
            ("recordType", "single"),
            ("id", "42"),
            ("filename", "photo.jpg"),
            ("mediatype", "image"),
        ]);
        let meta = event.upload_metadata();

        assert!(meta.is_single_record());
        assert_eq!(meta.id, Some("42"));
        assert_eq!(meta.filename, Some("photo.jpg"));
        assert_eq!(meta.filetype, "");
        assert_eq!(meta.media, Some(MediaKind::Image));
        assert_eq!(meta.replace, None);
    }

    #[test]
    fn test_unknown_media_type_is_ignored() {
        let event = LifecycleEvent::new(HookKind::PostFinish, "abc")
            .with_metadata([("mediatype", "audio"), ("replace", "")]);
        let meta = event.upload_metadata();

        assert_eq!(meta.media, None);
        assert_eq!(meta.replace, None);
        assert!(!meta.is_single_record());
    }

    #[test]
    fn test_hook_kind_wire_names() {
        let kind: HookKind = serde_json::from_str("\"pre-create\"").unwrap();
        assert_eq!(kind, HookKind::PreCreate);
        let kind: HookKind = serde_json::from_str("\"post-finish\"").unwrap();
        assert_eq!(kind, HookKind::PostFinish);
        let kind: HookKind = serde_json::from_str("\"post-receive\"").unwrap();
        assert_eq!(kind, HookKind::Other);
    }
}
