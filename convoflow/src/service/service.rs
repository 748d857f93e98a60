//! Leaf services wrapping a single user handler.

use super::component::ComponentCore;
use super::conditions::StartCondition;
use super::extra::{ExtraHandler, ExtraHandlerStage, ServiceRuntimeInfo};
use crate::context::Context;
use crate::core::ComponentState;
use crate::errors::ServiceError;
use crate::pipeline::Pipeline;
use crate::script::ScriptActor;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// The work performed by a leaf service.
///
/// Handlers read and write the shared [`Context`] and report failure by
/// returning an error; the engine records the failure and carries on
/// with the rest of the turn.
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    /// Executes the handler.
    async fn handle(
        &self,
        ctx: &Context,
        pipeline: &Pipeline,
        info: &ServiceRuntimeInfo,
    ) -> Result<(), ServiceError>;
}

/// Adapts a plain synchronous function to the handler contract.
struct FnHandler<F>(F);

#[async_trait]
impl<F> ServiceHandler for FnHandler<F>
where
    F: Fn(&Context) -> Result<(), ServiceError> + Send + Sync,
{
    async fn handle(
        &self,
        ctx: &Context,
        _pipeline: &Pipeline,
        _info: &ServiceRuntimeInfo,
    ) -> Result<(), ServiceError> {
        (self.0)(ctx)
    }
}

/// Adapts a boxed async closure to the handler contract.
struct AsyncFnHandler<F>(F);

#[async_trait]
impl<F> ServiceHandler for AsyncFnHandler<F>
where
    F: for<'a> Fn(&'a Context, &'a Pipeline) -> BoxFuture<'a, Result<(), ServiceError>>
        + Send
        + Sync,
{
    async fn handle(
        &self,
        ctx: &Context,
        pipeline: &Pipeline,
        _info: &ServiceRuntimeInfo,
    ) -> Result<(), ServiceError> {
        (self.0)(ctx, pipeline).await
    }
}

/// A leaf pipeline component wrapping one handler.
pub struct Service {
    core: ComponentCore,
    handler: Arc<dyn ServiceHandler>,
    actor: bool,
}

impl Service {
    /// Creates a service from a handler object.
    #[must_use]
    pub fn new(handler: Arc<dyn ServiceHandler>) -> Self {
        Self {
            core: ComponentCore::default(),
            handler,
            actor: false,
        }
    }

    /// Creates a service from a plain synchronous function.
    #[must_use]
    pub fn from_fn<F>(function: F) -> Self
    where
        F: Fn(&Context) -> Result<(), ServiceError> + Send + Sync + 'static,
    {
        Self::new(Arc::new(FnHandler(function)))
    }

    /// Creates a service from a boxed async closure.
    #[must_use]
    pub fn from_async_fn<F>(function: F) -> Self
    where
        F: for<'a> Fn(&'a Context, &'a Pipeline) -> BoxFuture<'a, Result<(), ServiceError>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(Arc::new(AsyncFnHandler(function)))
    }

    /// Creates the pipeline's actor service from a dialog script.
    ///
    /// Exactly one of these must be present in a pipeline tree; tree
    /// finalization fails otherwise.
    #[must_use]
    pub fn actor(actor: ScriptActor) -> Self {
        let mut service = Self::new(Arc::new(actor));
        service.actor = true;
        service
    }

    /// Sets the sibling-unique name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.core.name = Some(name.into());
        self
    }

    /// Marks the service to run concurrently with adjacent asynchronous
    /// siblings.
    #[must_use]
    pub fn asynchronous(mut self, flag: bool) -> Self {
        self.core.asynchronous = flag;
        self
    }

    /// Sets the invocation timeout (enforced when asynchronous).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.core.timeout = Some(timeout);
        self
    }

    /// Replaces the start condition.
    #[must_use]
    pub fn with_start_condition(mut self, condition: Arc<dyn StartCondition>) -> Self {
        self.core.start_condition = condition;
        self
    }

    /// Installs the before-stage extra handlers.
    #[must_use]
    pub fn with_before_handler(mut self, mut handler: ExtraHandler) -> Self {
        handler.set_stage(ExtraHandlerStage::Before);
        self.core.before_handler = handler;
        self
    }

    /// Installs the after-stage extra handlers.
    #[must_use]
    pub fn with_after_handler(mut self, mut handler: ExtraHandler) -> Self {
        handler.set_stage(ExtraHandlerStage::After);
        self.core.after_handler = handler;
        self
    }

    /// The service name, if assigned.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.core.name.as_deref()
    }

    pub(crate) fn is_actor(&self) -> bool {
        self.actor
    }

    pub(crate) fn core(&self) -> &ComponentCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    /// Runs the wrapped handler, recording — not raising — its failure.
    pub(crate) async fn run_body(
        &self,
        ctx: &Context,
        pipeline: &Pipeline,
    ) -> Result<(), ServiceError> {
        let info = self.core.runtime_info(ctx);
        if let Err(err) = self.handler.handle(ctx, pipeline, &info).await {
            ctx.set_state(&self.core.path, ComponentState::Failed);
            error!(
                service = %info.name,
                path = %info.path,
                error = %err,
                "service execution failed"
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.core.name)
            .field("path", &self.core.path)
            .field("asynchronous", &self.core.asynchronous)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Component;
    use crate::testing::fixtures::minimal_pipeline;
    use crate::testing::mocks::shared_log;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_fn_service_runs_handler() {
        let pipeline = minimal_pipeline();
        let ctx = Context::new("u1");
        let log = shared_log();

        let sink = log.clone();
        let mut component = Component::from(Service::from_fn(move |_| {
            sink.lock().push("ran".into());
            Ok(())
        }));
        component.core_mut().path = ".pipeline.svc".into();

        component.invoke(&ctx, &pipeline).await;

        assert_eq!(*log.lock(), vec!["ran"]);
        assert_eq!(component.get_state(&ctx), ComponentState::Finished);
    }

    #[tokio::test]
    async fn test_failing_handler_marks_service_failed() {
        let pipeline = minimal_pipeline();
        let ctx = Context::new("u1");

        let mut component =
            Component::from(Service::from_fn(|_| Err(ServiceError::new("db down"))));
        component.core_mut().path = ".pipeline.broken".into();

        component.invoke(&ctx, &pipeline).await;
        assert_eq!(component.get_state(&ctx), ComponentState::Failed);
    }

    #[tokio::test]
    async fn test_async_fn_service_reads_context() {
        let pipeline = minimal_pipeline();
        let ctx = Context::new("u1");
        ctx.add_request(crate::core::Message::from("ping"));

        let log = shared_log();
        let sink = log.clone();
        let mut component = Component::from(Service::from_async_fn(move |ctx, _| {
            let sink = sink.clone();
            async move {
                if let Some(request) = ctx.last_request() {
                    sink.lock().push(request.text().unwrap_or("").to_string());
                }
                Ok(())
            }
            .boxed()
        }));
        component.core_mut().path = ".pipeline.echo".into();

        component.invoke(&ctx, &pipeline).await;
        assert_eq!(*log.lock(), vec!["ping"]);
    }
}
