pub mod auth;
pub mod dispatcher;
pub mod relocate;

use std::sync::Arc;

use crate::config::HookConfig;
use crate::services::command::CommandRunner;
use crate::services::media::{MediaSettings, MediaTransformEngine};
use crate::services::storage::StorageService;

pub use auth::TokenAuthorizer;
pub use dispatcher::{DispatchError, HookDispatcher, HookHandler};
pub use relocate::ObjectRelocator;

/// The production pipeline: authorize on create, relocate on finish.
pub fn standard_pipeline(
    config: &HookConfig,
    staging: Arc<dyn StorageService>,
    records: Arc<dyn StorageService>,
    runner: Arc<dyn CommandRunner>,
) -> HookDispatcher {
    let engine = Arc::new(MediaTransformEngine::new(runner, MediaSettings::from(config)));

    let handlers: Vec<Arc<dyn HookHandler>> = vec![
        Arc::new(TokenAuthorizer::new(config.jwt_secret.clone())),
        Arc::new(ObjectRelocator::new(staging, records, engine)),
    ];
    HookDispatcher::new(handlers)
}
