use async_trait::async_trait;

use crate::hooks::dispatcher::HookHandler;
use crate::models::{HookKind, HookResponse, LifecycleEvent};
use crate::services::error::PipelineError;
use crate::utils::auth::validate_upload_token;

pub const INVALID_TOKEN_BODY: &str = "Invalid upload token";

/// Gates upload creation on a valid HMAC-signed token.
pub struct TokenAuthorizer {
    secret: String,
}

impl TokenAuthorizer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn unauthorized() -> HookResponse {
        HookResponse::rejected(401, INVALID_TOKEN_BODY)
    }
}

#[async_trait]
impl HookHandler for TokenAuthorizer {
    fn name(&self) -> &'static str {
        "token-authorizer"
    }

    async fn invoke(&self, event: &LifecycleEvent) -> Result<HookResponse, PipelineError> {
        if event.kind != HookKind::PreCreate {
            return Ok(HookResponse::default());
        }

        let token = match event.credential.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                tracing::warn!(upload_id = %event.upload_id, "Upload rejected: no upload token");
                return Ok(Self::unauthorized());
            }
        };

        match validate_upload_token(token, &self.secret) {
            Ok(claims) => match claims.subject() {
                Some(user) => {
                    tracing::debug!(upload_id = %event.upload_id, user = %user, "Upload token accepted");
                    Ok(HookResponse::default())
                }
                None => {
                    tracing::warn!(upload_id = %event.upload_id, "Upload rejected: token has no subject");
                    Ok(Self::unauthorized())
                }
            },
            Err(e) => {
                tracing::warn!(upload_id = %event.upload_id, error = %e, "Upload rejected: invalid token");
                Ok(Self::unauthorized())
            }
        }
    }
}
