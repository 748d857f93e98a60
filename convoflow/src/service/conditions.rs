//! Start conditions gating component execution.
//!
//! A start condition is a predicate over the context and the pipeline,
//! evaluated before every component invocation. The standard set lets
//! users express dependencies between pipeline components.

use crate::context::Context;
use crate::core::ComponentState;
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// How often a waiting [`ServiceFinished`] condition re-reads the
/// execution-state store.
pub(crate) const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A predicate deciding whether a component runs this turn.
///
/// Conditions may suspend (a waiting condition polls another
/// component's state), but must not mutate the context.
#[async_trait]
pub trait StartCondition: Send + Sync {
    /// Evaluates the condition.
    async fn check(&self, ctx: &Context, pipeline: &Pipeline) -> bool;
}

/// Allows execution unconditionally. The default for every component.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

#[async_trait]
impl StartCondition for Always {
    async fn check(&self, _ctx: &Context, _pipeline: &Pipeline) -> bool {
        true
    }
}

/// Allows execution only if the referenced component finished
/// successfully this turn.
///
/// With `wait` set, the condition suspends until the referenced state
/// leaves `NotRun`/`Running`, polling at a fixed short interval. There
/// is no bound on the total wait: a dependency that never resolves
/// starves the waiting component for the rest of the turn.
#[derive(Debug, Clone)]
pub struct ServiceFinished {
    path: String,
    wait: bool,
}

impl ServiceFinished {
    /// Checks the referenced component's state once.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            wait: false,
        }
    }

    /// Polls until the referenced component reaches a settled state.
    #[must_use]
    pub fn waiting(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            wait: true,
        }
    }
}

#[async_trait]
impl StartCondition for ServiceFinished {
    async fn check(&self, ctx: &Context, _pipeline: &Pipeline) -> bool {
        let mut state = ctx.state_of(&self.path);
        if self.wait {
            while matches!(state, ComponentState::NotRun | ComponentState::Running) {
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
                state = ctx.state_of(&self.path);
            }
        }
        state == ComponentState::Finished
    }
}

/// Inverts another condition.
pub struct Negate(Arc<dyn StartCondition>);

impl Negate {
    /// Wraps a condition, inverting its result.
    #[must_use]
    pub fn new(inner: Arc<dyn StartCondition>) -> Self {
        Self(inner)
    }
}

#[async_trait]
impl StartCondition for Negate {
    async fn check(&self, ctx: &Context, pipeline: &Pipeline) -> bool {
        !self.0.check(ctx, pipeline).await
    }
}

/// Reduces a list of conditions with a combiner function.
///
/// The inner conditions must be independent: the evaluation order is
/// not part of the contract.
pub struct Aggregate {
    combiner: fn(&[bool]) -> bool,
    conditions: Vec<Arc<dyn StartCondition>>,
}

impl Aggregate {
    /// Builds an aggregate with an arbitrary combiner.
    #[must_use]
    pub fn new(combiner: fn(&[bool]) -> bool, conditions: Vec<Arc<dyn StartCondition>>) -> Self {
        Self {
            combiner,
            conditions,
        }
    }

    /// True only if every inner condition is true.
    #[must_use]
    pub fn all(conditions: Vec<Arc<dyn StartCondition>>) -> Self {
        Self::new(|results| results.iter().all(|passed| *passed), conditions)
    }

    /// True if any inner condition is true.
    #[must_use]
    pub fn any(conditions: Vec<Arc<dyn StartCondition>>) -> Self {
        Self::new(|results| results.iter().any(|passed| *passed), conditions)
    }
}

#[async_trait]
impl StartCondition for Aggregate {
    async fn check(&self, ctx: &Context, pipeline: &Pipeline) -> bool {
        let mut results = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            results.push(condition.check(ctx, pipeline).await);
        }
        (self.combiner)(&results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::minimal_pipeline;

    #[tokio::test]
    async fn test_always_passes() {
        let pipeline = minimal_pipeline();
        let ctx = Context::new("u1");
        assert!(Always.check(&ctx, &pipeline).await);
    }

    #[tokio::test]
    async fn test_service_finished_without_record_is_false() {
        let pipeline = minimal_pipeline();
        let ctx = Context::new("u1");
        let condition = ServiceFinished::new(".pipeline.svc");
        assert!(!condition.check(&ctx, &pipeline).await);
    }

    #[tokio::test]
    async fn test_service_finished_sees_recorded_state() {
        let pipeline = minimal_pipeline();
        let ctx = Context::new("u1");
        let condition = ServiceFinished::new(".pipeline.svc");

        ctx.set_state(".pipeline.svc", ComponentState::Finished);
        assert!(condition.check(&ctx, &pipeline).await);

        ctx.set_state(".pipeline.svc", ComponentState::Failed);
        assert!(!condition.check(&ctx, &pipeline).await);
    }

    #[tokio::test]
    async fn test_negate() {
        let pipeline = minimal_pipeline();
        let ctx = Context::new("u1");
        let condition = Negate::new(Arc::new(Always));
        assert!(!condition.check(&ctx, &pipeline).await);
    }

    #[tokio::test]
    async fn test_aggregate_all_and_any() {
        let pipeline = minimal_pipeline();
        let ctx = Context::new("u1");
        ctx.set_state(".pipeline.done", ComponentState::Finished);

        let passing: Arc<dyn StartCondition> = Arc::new(ServiceFinished::new(".pipeline.done"));
        let failing: Arc<dyn StartCondition> = Arc::new(ServiceFinished::new(".pipeline.missing"));

        let all = Aggregate::all(vec![passing.clone(), failing.clone()]);
        assert!(!all.check(&ctx, &pipeline).await);

        let any = Aggregate::any(vec![passing, failing]);
        assert!(any.check(&ctx, &pipeline).await);
    }
}
