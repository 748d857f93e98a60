//! Before/after extra handlers attached to pipeline components.
//!
//! Extra handlers carry supportive tasks (timing, statistics, minor
//! data extraction) around a component's execution. They observe the
//! engine through a read-only runtime snapshot and should not take over
//! the component's job of mutating conversation state.

use crate::context::Context;
use crate::core::ComponentState;
use crate::errors::ServiceError;
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Which side of the component an extra handler runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtraHandlerStage {
    /// Runs before the component body, prior to the `Running` transition.
    Before,
    /// Runs after the component body, once `Finished`/`Failed` is settled.
    After,
}

/// Where a globally registered extra handler attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalExtraHandlerKind {
    /// Before every component whose name passes the filter.
    Before,
    /// After every component whose name passes the filter.
    After,
    /// Before the root group only.
    BeforeAll,
    /// After the root group only.
    AfterAll,
}

/// Read-only description of a component, handed to its handlers.
#[derive(Debug, Clone)]
pub struct ServiceRuntimeInfo {
    /// Component name.
    pub name: String,
    /// Dot-separated component path.
    pub path: String,
    /// Configured timeout, if any.
    pub timeout: Option<Duration>,
    /// Whether the component runs concurrently with siblings.
    pub asynchronous: bool,
    /// Copy of the execution-state store at call time.
    pub execution_state: HashMap<String, ComponentState>,
}

/// Read-only snapshot passed to extra handler functions.
#[derive(Debug, Clone)]
pub struct ExtraHandlerRuntime {
    /// Which stage is currently running.
    pub stage: ExtraHandlerStage,
    /// The owning component at call time.
    pub component: ServiceRuntimeInfo,
}

/// A callback attached to a component's before or after stage.
#[async_trait]
pub trait ExtraHandlerFunction: Send + Sync {
    /// Invokes the callback.
    async fn call(
        &self,
        ctx: &Context,
        pipeline: &Pipeline,
        runtime: &ExtraHandlerRuntime,
    ) -> Result<(), ServiceError>;
}

/// Wraps a plain synchronous function as an extra handler.
struct FnExtraHandler<F>(F);

#[async_trait]
impl<F> ExtraHandlerFunction for FnExtraHandler<F>
where
    F: Fn(&Context, &ExtraHandlerRuntime) -> Result<(), ServiceError> + Send + Sync,
{
    async fn call(
        &self,
        ctx: &Context,
        _pipeline: &Pipeline,
        runtime: &ExtraHandlerRuntime,
    ) -> Result<(), ServiceError> {
        (self.0)(ctx, runtime)
    }
}

/// Wraps a boxed async closure as an extra handler.
struct AsyncFnExtraHandler<F>(F);

#[async_trait]
impl<F> ExtraHandlerFunction for AsyncFnExtraHandler<F>
where
    F: for<'a> Fn(&'a Context, &'a ExtraHandlerRuntime) -> BoxFuture<'a, Result<(), ServiceError>>
        + Send
        + Sync,
{
    async fn call(
        &self,
        ctx: &Context,
        _pipeline: &Pipeline,
        runtime: &ExtraHandlerRuntime,
    ) -> Result<(), ServiceError> {
        (self.0)(ctx, runtime).await
    }
}

/// Wraps a plain synchronous function as a shareable extra handler
/// function, e.g. for global handler registration.
pub fn extra_handler_fn<F>(function: F) -> Arc<dyn ExtraHandlerFunction>
where
    F: Fn(&Context, &ExtraHandlerRuntime) -> Result<(), ServiceError> + Send + Sync + 'static,
{
    Arc::new(FnExtraHandler(function))
}

/// An ordered list of callbacks attached to one stage of a component.
///
/// Callbacks honor the same concurrency rule as a service group's
/// children: sequential unless the list is marked asynchronous. The
/// timeout applies to the whole list and is enforced only when the list
/// is asynchronous; an elapsed timeout is logged and swallowed — it
/// never fails the owning component.
pub struct ExtraHandler {
    functions: Vec<Arc<dyn ExtraHandlerFunction>>,
    stage: ExtraHandlerStage,
    asynchronous: bool,
    timeout: Option<Duration>,
}

impl ExtraHandler {
    /// Creates an empty before-stage handler list.
    #[must_use]
    pub fn before() -> Self {
        Self::new(ExtraHandlerStage::Before)
    }

    /// Creates an empty after-stage handler list.
    #[must_use]
    pub fn after() -> Self {
        Self::new(ExtraHandlerStage::After)
    }

    fn new(stage: ExtraHandlerStage) -> Self {
        Self {
            functions: Vec::new(),
            stage,
            asynchronous: false,
            timeout: None,
        }
    }

    /// Appends a callback.
    #[must_use]
    pub fn with_function(mut self, function: Arc<dyn ExtraHandlerFunction>) -> Self {
        self.functions.push(function);
        self
    }

    /// Appends a plain synchronous function.
    #[must_use]
    pub fn with_fn<F>(self, function: F) -> Self
    where
        F: Fn(&Context, &ExtraHandlerRuntime) -> Result<(), ServiceError> + Send + Sync + 'static,
    {
        self.with_function(Arc::new(FnExtraHandler(function)))
    }

    /// Appends a boxed async closure.
    #[must_use]
    pub fn with_async_fn<F>(self, function: F) -> Self
    where
        F: for<'a> Fn(&'a Context, &'a ExtraHandlerRuntime) -> BoxFuture<'a, Result<(), ServiceError>>
            + Send
            + Sync
            + 'static,
    {
        self.with_function(Arc::new(AsyncFnExtraHandler(function)))
    }

    /// Marks the callbacks to run concurrently.
    #[must_use]
    pub fn asynchronous(mut self, flag: bool) -> Self {
        self.asynchronous = flag;
        self
    }

    /// Sets the list-wide timeout (enforced when asynchronous).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the number of attached callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if no callbacks are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub(crate) fn set_stage(&mut self, stage: ExtraHandlerStage) {
        self.stage = stage;
    }

    pub(crate) fn push(&mut self, function: Arc<dyn ExtraHandlerFunction>) {
        self.functions.push(function);
    }

    async fn run_functions(
        &self,
        ctx: &Context,
        pipeline: &Pipeline,
        runtime: &ExtraHandlerRuntime,
    ) -> Result<(), ServiceError> {
        if self.asynchronous {
            let results = join_all(
                self.functions
                    .iter()
                    .map(|function| function.call(ctx, pipeline, runtime)),
            )
            .await;
            for result in results {
                result?;
            }
        } else {
            for function in &self.functions {
                function.call(ctx, pipeline, runtime).await?;
            }
        }
        Ok(())
    }

    /// Runs all callbacks for the owning component.
    pub(crate) async fn run(
        &self,
        ctx: &Context,
        pipeline: &Pipeline,
        component: &ServiceRuntimeInfo,
    ) -> Result<(), ServiceError> {
        if self.functions.is_empty() {
            return Ok(());
        }
        let runtime = ExtraHandlerRuntime {
            stage: self.stage,
            component: component.clone(),
        };
        match (self.asynchronous, self.timeout) {
            (true, Some(limit)) => {
                match tokio::time::timeout(limit, self.run_functions(ctx, pipeline, &runtime)).await
                {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            component = %component.name,
                            path = %component.path,
                            stage = ?self.stage,
                            timeout_ms = limit.as_millis() as u64,
                            "extra handler timed out"
                        );
                        Ok(())
                    }
                }
            }
            _ => self.run_functions(ctx, pipeline, &runtime).await,
        }
    }
}

impl std::fmt::Debug for ExtraHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtraHandler")
            .field("stage", &self.stage)
            .field("functions", &self.functions.len())
            .field("asynchronous", &self.asynchronous)
            .field("timeout", &self.timeout)
            .finish()
    }
}
