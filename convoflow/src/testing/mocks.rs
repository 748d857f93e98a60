//! Mock handlers and messengers for tests.

use crate::context::Context;
use crate::core::Message;
use crate::errors::{PipelineError, ServiceError};
use crate::messenger::{MessengerInterface, TurnRunner};
use crate::pipeline::Pipeline;
use crate::service::{ServiceHandler, ServiceRuntimeInfo};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// An ordered log shared between test services and assertions.
pub type SharedLog = Arc<Mutex<Vec<String>>>;

/// Creates an empty shared log.
#[must_use]
pub fn shared_log() -> SharedLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A handler that records its tag into a shared log, optionally
/// sleeping to simulate work.
pub struct RecordingHandler {
    tag: String,
    log: SharedLog,
    delay: Option<Duration>,
    record_completion: bool,
}

impl RecordingHandler {
    /// Creates a handler recording `tag` on invocation.
    #[must_use]
    pub fn new(tag: impl Into<String>, log: SharedLog) -> Self {
        Self {
            tag: tag.into(),
            log,
            delay: None,
            record_completion: false,
        }
    }

    /// Sleeps for the given duration after the start record.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Records `tag:start` and `tag:end` instead of a single entry.
    #[must_use]
    pub fn record_completion(mut self) -> Self {
        self.record_completion = true;
        self
    }
}

#[async_trait]
impl ServiceHandler for RecordingHandler {
    async fn handle(
        &self,
        _ctx: &Context,
        _pipeline: &Pipeline,
        _info: &ServiceRuntimeInfo,
    ) -> Result<(), ServiceError> {
        if self.record_completion {
            self.log.lock().push(format!("{}:start", self.tag));
        } else {
            self.log.lock().push(self.tag.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.record_completion {
            self.log.lock().push(format!("{}:end", self.tag));
        }
        Ok(())
    }
}

/// A messenger that plays a fixed list of requests through the runner
/// and records each turn's response.
pub struct ScriptedMessenger {
    ctx_id: String,
    requests: Vec<Message>,
    responses: Mutex<Vec<Option<Message>>>,
}

impl ScriptedMessenger {
    /// Creates a messenger for the given conversation key and requests.
    #[must_use]
    pub fn new(ctx_id: impl Into<String>, requests: Vec<Message>) -> Self {
        Self {
            ctx_id: ctx_id.into(),
            requests,
            responses: Mutex::new(Vec::new()),
        }
    }

    /// The responses observed so far, one per played request.
    #[must_use]
    pub fn responses(&self) -> Vec<Option<Message>> {
        self.responses.lock().clone()
    }
}

#[async_trait]
impl MessengerInterface for ScriptedMessenger {
    async fn connect(&self, runner: TurnRunner) -> Result<(), PipelineError> {
        for request in &self.requests {
            let ctx = runner(request.clone(), Some(self.ctx_id.clone()), None).await?;
            self.responses.lock().push(ctx.last_response());
        }
        Ok(())
    }
}
