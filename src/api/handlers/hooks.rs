use crate::AppState;
use crate::api::error::AppError;
use crate::models::{HookKind, HookResponse, LifecycleEvent};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Hook request as posted by the upload server.
#[derive(Debug, Deserialize, ToSchema)]
pub struct HookRequest {
    #[serde(rename = "Type")]
    #[schema(value_type = String, example = "post-finish")]
    pub kind: HookKind,
    #[serde(rename = "Event", default)]
    pub event: HookEvent,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct HookEvent {
    #[serde(rename = "Upload", default)]
    pub upload: UploadInfo,
    #[serde(rename = "HTTPRequest", default)]
    pub http_request: HttpRequestInfo,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UploadInfo {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "MetaData", default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct HttpRequestInfo {
    #[serde(rename = "Header", default)]
    pub header: HashMap<String, Vec<String>>,
}

impl HookRequest {
    /// Lifecycle event with the credential taken from `token_header`
    /// (case-insensitive, first value).
    pub fn into_event(self, token_header: &str) -> LifecycleEvent {
        let credential = self
            .event
            .http_request
            .header
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token_header))
            .and_then(|(_, values)| values.into_iter().next());

        LifecycleEvent {
            kind: self.kind,
            upload_id: self.event.upload.id,
            metadata: self.event.upload.metadata,
            credential,
        }
    }
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct HookResponseBody {
    #[serde(rename = "HTTPResponse")]
    pub http_response: HttpResponseInfo,
    #[serde(rename = "RejectUpload")]
    pub reject_upload: bool,
    #[serde(rename = "StopUpload")]
    pub stop_upload: bool,
    #[serde(rename = "ChangeFileInfo", skip_serializing_if = "Option::is_none")]
    pub change_file_info: Option<FileInfoChanges>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct HttpResponseInfo {
    #[serde(rename = "StatusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(rename = "Body", skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(rename = "Header", skip_serializing_if = "HashMap::is_empty")]
    pub header: HashMap<String, String>,
}

/// Metadata rewrite returned to the upload server.
///
/// tusd only applies `ChangeFileInfo` from a `pre-create` response. A patch
/// sent with `post-finish` is informational: it reports the name and type the
/// object was stored under, while the upload's own info stays as uploaded.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileInfoChanges {
    /// Replaces the upload's metadata as a whole.
    #[serde(rename = "MetaData")]
    pub metadata: HashMap<String, String>,
}

impl HookResponseBody {
    pub fn from_response(event: &LifecycleEvent, response: HookResponse) -> Self {
        let change_file_info = if response.metadata_patch.is_empty() {
            None
        } else {
            let mut metadata = event.metadata.clone();
            metadata.extend(response.metadata_patch);
            Some(FileInfoChanges { metadata })
        };

        Self {
            http_response: HttpResponseInfo {
                status_code: response.status_code,
                body: response.body,
                header: response.headers,
            },
            reject_upload: response.reject,
            stop_upload: response.stop,
            change_file_info,
        }
    }
}

#[utoipa::path(
    post,
    path = "/hooks",
    request_body = HookRequest,
    responses(
        (status = 200, description = "Merged pipeline response", body = HookResponseBody),
        (status = 400, description = "Malformed hook request"),
        (status = 500, description = "A hook handler failed")
    ),
    tag = "hooks"
)]
pub async fn receive_hook(
    State(state): State<AppState>,
    payload: Result<Json<HookRequest>, JsonRejection>,
) -> Result<Json<HookResponseBody>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let event = request.into_event(&state.config.upload_token_header);

    tracing::debug!(
        kind = ?event.kind,
        upload_id = %event.upload_id,
        "Hook received"
    );

    let response = state.dispatcher.dispatch(&event).await?;
    Ok(Json(HookResponseBody::from_response(&event, response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> HookRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_credential_header_is_case_insensitive() {
        let req = request(json!({
            "Type": "pre-create",
            "Event": {
                "Upload": {"ID": "", "MetaData": {"filename": "a.png"}},
                "HTTPRequest": {"Header": {"upload-token": ["tok-1", "tok-2"]}}
            }
        }));

        let event = req.into_event("Upload-Token");

        assert_eq!(event.kind, HookKind::PreCreate);
        assert_eq!(event.credential.as_deref(), Some("tok-1"));
        assert_eq!(event.metadata.get("filename").map(String::as_str), Some("a.png"));
    }

    #[test]
    fn test_minimal_request_and_unknown_type() {
        let event = request(json!({"Type": "post-receive"})).into_event("Upload-Token");
        assert_eq!(event.kind, HookKind::Other);
        assert_eq!(event.upload_id, "");
        assert!(event.credential.is_none());
    }

    #[test]
    fn test_empty_response_serializes_minimally() {
        let event = LifecycleEvent::new(HookKind::PostFinish, "u1");
        let body = HookResponseBody::from_response(&event, HookResponse::default());

        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"HTTPResponse": {}, "RejectUpload": false, "StopUpload": false})
        );
    }

    #[test]
    fn test_rejection_and_patch_serialize() {
        let event = LifecycleEvent::new(HookKind::PostFinish, "u1")
            .with_metadata([("filename", "a.heic"), ("id", "42")]);
        let response = HookResponse::rejected(401, "Invalid upload token")
            .with_patch("filename", "a.jpg");

        let value = serde_json::to_value(HookResponseBody::from_response(&event, response)).unwrap();

        assert_eq!(value["HTTPResponse"]["StatusCode"], 401);
        assert_eq!(value["HTTPResponse"]["Body"], "Invalid upload token");
        assert_eq!(value["RejectUpload"], true);
        assert_eq!(
            value["ChangeFileInfo"]["MetaData"],
            json!({"filename": "a.jpg", "id": "42"})
        );
    }
}
