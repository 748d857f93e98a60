//! The component contract shared by services and service groups.
//!
//! Every pipeline node is a [`Component`]: it is gated by a start
//! condition, tracks its lifecycle in the context's execution-state
//! store, runs before/after extra handlers around its body, and — when
//! asynchronous — races its whole invocation against a timeout.

use super::conditions::{Always, StartCondition};
use super::extra::{ExtraHandler, ExtraHandlerFunction, ExtraHandlerStage, ServiceRuntimeInfo};
use super::group::ServiceGroup;
use super::service::Service;
use crate::context::Context;
use crate::core::ComponentState;
use crate::errors::ServiceError;
use crate::pipeline::Pipeline;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Placeholder name reported before tree finalization has run.
pub(crate) const UNNAMED: &str = "[unnamed]";

/// Attributes common to every pipeline component.
pub struct ComponentCore {
    pub(crate) name: Option<String>,
    pub(crate) path: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) asynchronous: bool,
    pub(crate) start_condition: Arc<dyn StartCondition>,
    pub(crate) before_handler: ExtraHandler,
    pub(crate) after_handler: ExtraHandler,
}

impl Default for ComponentCore {
    fn default() -> Self {
        Self {
            name: None,
            path: String::new(),
            timeout: None,
            asynchronous: false,
            start_condition: Arc::new(Always),
            before_handler: ExtraHandler::before(),
            after_handler: ExtraHandler::after(),
        }
    }
}

impl ComponentCore {
    pub(crate) fn runtime_info(&self, ctx: &Context) -> ServiceRuntimeInfo {
        ServiceRuntimeInfo {
            name: self.name.clone().unwrap_or_else(|| UNNAMED.to_string()),
            path: self.path.clone(),
            timeout: self.timeout,
            asynchronous: self.asynchronous,
            execution_state: ctx.framework().execution_states(),
        }
    }
}

impl std::fmt::Debug for ComponentCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCore")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .field("asynchronous", &self.asynchronous)
            .finish_non_exhaustive()
    }
}

/// A node of the pipeline tree: a leaf service or a composite group.
#[derive(Debug)]
pub enum Component {
    /// A leaf wrapping one user handler.
    Service(Service),
    /// An ordered container of child components.
    Group(ServiceGroup),
}

impl From<Service> for Component {
    fn from(service: Service) -> Self {
        Self::Service(service)
    }
}

impl From<ServiceGroup> for Component {
    fn from(group: ServiceGroup) -> Self {
        Self::Group(group)
    }
}

impl Component {
    pub(crate) fn core(&self) -> &ComponentCore {
        match self {
            Self::Service(service) => service.core(),
            Self::Group(group) => group.core(),
        }
    }

    pub(crate) fn core_mut(&mut self) -> &mut ComponentCore {
        match self {
            Self::Service(service) => service.core_mut(),
            Self::Group(group) => group.core_mut(),
        }
    }

    /// The component name, unique among its siblings.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core().name.as_deref().unwrap_or(UNNAMED)
    }

    /// The dot-separated path, globally unique within the pipeline.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.core().path
    }

    /// Whether this component is the pipeline's actor leaf.
    #[must_use]
    pub fn is_actor(&self) -> bool {
        matches!(self, Self::Service(service) if service.is_actor())
    }

    /// Looks up this component's execution state for the current turn.
    #[must_use]
    pub fn get_state(&self, ctx: &Context) -> ComponentState {
        ctx.state_of(self.path())
    }

    /// Invokes the component.
    ///
    /// Asynchronous components race the whole invocation (gating, hooks
    /// and body) against their timeout; exceeding it drops the in-flight
    /// subtree and records this component `Failed`. The call itself
    /// never returns an error — failures are observable only through
    /// the execution-state store.
    pub fn invoke<'a>(&'a self, ctx: &'a Context, pipeline: &'a Pipeline) -> BoxFuture<'a, ()> {
        async move {
            let core = self.core();
            if core.asynchronous {
                if let Some(limit) = core.timeout {
                    if tokio::time::timeout(limit, self.run(ctx, pipeline)).await.is_err() {
                        ctx.set_state(self.path(), ComponentState::Failed);
                        warn!(
                            component = self.name(),
                            path = self.path(),
                            timeout_ms = limit.as_millis() as u64,
                            "component timed out"
                        );
                    }
                    return;
                }
            }
            self.run(ctx, pipeline).await;
        }
        .boxed()
    }

    async fn run(&self, ctx: &Context, pipeline: &Pipeline) {
        let core = self.core();
        if !core.start_condition.check(ctx, pipeline).await {
            ctx.set_state(self.path(), ComponentState::NotRun);
            return;
        }

        let outcome: Result<(), ServiceError> = async {
            core.before_handler
                .run(ctx, pipeline, &core.runtime_info(ctx))
                .await?;

            ctx.set_state(self.path(), ComponentState::Running);
            self.run_body(ctx, pipeline).await?;
            if self.get_state(ctx) != ComponentState::Failed {
                ctx.set_state(self.path(), ComponentState::Finished);
            }

            core.after_handler
                .run(ctx, pipeline, &core.runtime_info(ctx))
                .await?;
            Ok(())
        }
        .await;

        if let Err(err) = outcome {
            ctx.set_state(self.path(), ComponentState::Failed);
            error!(
                component = self.name(),
                path = self.path(),
                error = %err,
                "component execution failed"
            );
        }
    }

    async fn run_body(&self, ctx: &Context, pipeline: &Pipeline) -> Result<(), ServiceError> {
        match self {
            Self::Service(service) => service.run_body(ctx, pipeline).await,
            Self::Group(group) => group.run_body(ctx, pipeline).await,
        }
    }

    /// Attaches a globally registered extra handler to every component
    /// in this subtree whose name passes the filter.
    pub(crate) fn attach_global_handler(
        &mut self,
        stage: ExtraHandlerStage,
        function: &Arc<dyn ExtraHandlerFunction>,
        filter: &dyn Fn(&str) -> bool,
    ) {
        if filter(self.name()) {
            let core = self.core_mut();
            match stage {
                ExtraHandlerStage::Before => core.before_handler.push(Arc::clone(function)),
                ExtraHandlerStage::After => core.after_handler.push(Arc::clone(function)),
            }
        }
        if let Self::Group(group) = self {
            for child in group.components_mut() {
                child.attach_global_handler(stage, function, filter);
            }
        }
    }
}
