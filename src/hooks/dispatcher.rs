use async_trait::async_trait;
use std::ops::ControlFlow;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{HookResponse, LifecycleEvent};
use crate::services::error::PipelineError;

/// A stage of the hook pipeline.
///
/// Handlers decide for themselves whether an event applies to them and
/// return an empty [`HookResponse`] when it does not.
#[async_trait]
pub trait HookHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn invoke(&self, event: &LifecycleEvent) -> Result<HookResponse, PipelineError>;
}

#[derive(Error, Debug)]
#[error("hook handler `{handler}` failed: {source}")]
pub struct DispatchError {
    pub handler: &'static str,
    /// Merged responses of the handlers that ran before the failure.
    pub partial: HookResponse,
    #[source]
    pub source: PipelineError,
}

/// Running merge of handler responses.
#[derive(Debug, Default)]
pub struct Accumulator {
    response: HookResponse,
}

impl Accumulator {
    /// Fold one handler's response in. A rejecting or stopping response ends
    /// the dispatch and is returned as-is.
    pub fn absorb(mut self, sub: HookResponse) -> ControlFlow<HookResponse, Self> {
        if sub.reject || sub.stop {
            return ControlFlow::Break(sub);
        }

        let merged = &mut self.response;
        merged.headers.extend(sub.headers);
        merged.metadata_patch.extend(sub.metadata_patch);

        if !sub.body.is_empty() {
            if !merged.body.is_empty() {
                merged.body.push_str(", ");
            }
            merged.body.push_str(&sub.body);
        }

        if let Some(code) = sub.status_code.filter(|c| *c > 399) {
            merged.status_code = Some(merged.status_code.map_or(code, |prev| prev.max(code)));
        }

        ControlFlow::Continue(self)
    }

    pub fn finish(self) -> HookResponse {
        self.response
    }
}

/// Runs every handler in registration order and merges their responses.
pub struct HookDispatcher {
    handlers: Vec<Arc<dyn HookHandler>>,
}

impl HookDispatcher {
    pub fn new(handlers: Vec<Arc<dyn HookHandler>>) -> Self {
        Self { handlers }
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub async fn dispatch(&self, event: &LifecycleEvent) -> Result<HookResponse, DispatchError> {
        let mut acc = Accumulator::default();

        for handler in &self.handlers {
            let sub = match handler.invoke(event).await {
                Ok(sub) => sub,
                Err(source) => {
                    tracing::error!(
                        handler = handler.name(),
                        upload_id = %event.upload_id,
                        error = %source,
                        "Hook handler failed"
                    );
                    return Err(DispatchError {
                        handler: handler.name(),
                        partial: acc.finish(),
                        source,
                    });
                }
            };

            match acc.absorb(sub) {
                ControlFlow::Continue(next) => acc = next,
                ControlFlow::Break(last) => {
                    tracing::info!(
                        handler = handler.name(),
                        upload_id = %event.upload_id,
                        reject = last.reject,
                        stop = last.stop,
                        "Hook dispatch ended early"
                    );
                    return Ok(last);
                }
            }
        }

        Ok(acc.finish())
    }
}
