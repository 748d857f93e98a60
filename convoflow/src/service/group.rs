//! Composite components grouping services for joint execution.

use super::component::{Component, ComponentCore};
use super::conditions::StartCondition;
use super::extra::{ExtraHandler, ExtraHandlerStage};
use crate::context::Context;
use crate::errors::ServiceError;
use crate::pipeline::Pipeline;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// An ordered container of child components.
///
/// In a synchronous group (the default) children execute in list order,
/// with one refinement: runs of *adjacent asynchronous* children are
/// dispatched concurrently and joined before the next synchronous child
/// starts, so a synchronous child acts as a barrier. A group marked
/// `asynchronous` dispatches every child concurrently.
///
/// Dispatch order always follows list order; completion order of
/// concurrent children does not. The group's own body returns only once
/// every dispatched child has resolved — no child is ever abandoned.
///
/// Child failures stay with the child: they are visible per path in the
/// execution-state store and never mark the group itself failed.
pub struct ServiceGroup {
    core: ComponentCore,
    components: Vec<Component>,
}

impl ServiceGroup {
    /// Creates a group over the given children.
    #[must_use]
    pub fn new(components: Vec<Component>) -> Self {
        Self {
            core: ComponentCore::default(),
            components,
        }
    }

    /// Sets the sibling-unique name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.core.name = Some(name.into());
        self
    }

    /// Marks every child to run concurrently.
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

    /// The child components, in dispatch order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub(crate) fn components_mut(&mut self) -> &mut [Component] {
        &mut self.components
    }

    pub(crate) fn core(&self) -> &ComponentCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    async fn join_adjacent<'a>(
        adjacent: &mut Vec<&'a Component>,
        ctx: &'a Context,
        pipeline: &'a Pipeline,
    ) {
        if adjacent.is_empty() {
            return;
        }
        join_all(
            adjacent
                .drain(..)
                .map(|component| component.invoke(ctx, pipeline)),
        )
        .await;
    }

    /// Runs the children. Pure dispatch: gating, hooks and state
    /// bookkeeping belong to the component contract.
    pub(crate) async fn run_body(
        &self,
        ctx: &Context,
        pipeline: &Pipeline,
    ) -> Result<(), ServiceError> {
        if self.core.asynchronous {
            join_all(
                self.components
                    .iter()
                    .map(|component| component.invoke(ctx, pipeline)),
            )
            .await;
            return Ok(());
        }

        let mut adjacent: Vec<&Component> = Vec::new();
        for component in &self.components {
            if component.core().asynchronous {
                adjacent.push(component);
                continue;
            }
            Self::join_adjacent(&mut adjacent, ctx, pipeline).await;
            component.invoke(ctx, pipeline).await;
        }
        Self::join_adjacent(&mut adjacent, ctx, pipeline).await;
        Ok(())
    }
}

impl std::fmt::Debug for ServiceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceGroup")
            .field("name", &self.core.name)
            .field("path", &self.core.path)
            .field("asynchronous", &self.core.asynchronous)
            .field("components", &self.components.len())
            .finish_non_exhaustive()
    }
}
